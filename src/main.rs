use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use mvt_loader::cli::{Cli, Command, ReportFormat};
use mvt_loader::input::read_tile_file;
use mvt_loader::output::ndjson_lines;
use mvt_loader::{DecodedTile, decode, decode_batch, summarize_layers};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match cli.command {
        Command::Decode(args) => {
            let options = args.decode_options()?;
            let buffers = args
                .inputs
                .iter()
                .map(|path| read_tile_file(path))
                .collect::<Result<Vec<_>>>()?;
            let results = if buffers.len() == 1 {
                vec![decode(&buffers[0], &options)]
            } else {
                decode_batch(&buffers, &options)
            };
            for (path, result) in args.inputs.iter().zip(results) {
                let tile =
                    result.with_context(|| format!("failed to decode {}", path.display()))?;
                print_tile(path, &tile, args.output)?;
            }
        }
        Command::Layers(args) => {
            if args.output == ReportFormat::Ndjson {
                anyhow::bail!("layers supports --output text or json");
            }
            let buffer = read_tile_file(&args.input)?;
            let summary = summarize_layers(&buffer, args.layer.as_deref())
                .with_context(|| format!("failed to decode {}", args.input.display()))?;
            match args.output {
                ReportFormat::Json | ReportFormat::Ndjson => {
                    // ndjson was rejected above
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                ReportFormat::Text => {
                    println!("total_features: {}", summary.total_features);
                    for layer in summary.layers.iter() {
                        println!(
                            "layer: {} version={} extent={} features={} property_keys={}",
                            layer.name,
                            layer.version,
                            layer.extent,
                            layer.feature_count,
                            layer.property_key_count
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_tile(path: &Path, tile: &DecodedTile, output: ReportFormat) -> Result<()> {
    match output {
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tile)?);
        }
        ReportFormat::Ndjson => match tile {
            DecodedTile::Features(features) => {
                for line in ndjson_lines(features)? {
                    println!("{}", line);
                }
            }
            DecodedTile::Binary(binary) => {
                println!("{}", serde_json::to_string(binary)?);
            }
        },
        ReportFormat::Text => match tile {
            DecodedTile::Features(features) => {
                println!("input: {} features={}", path.display(), features.len());
                for (index, feature) in features.iter().enumerate() {
                    println!(
                        "feature: {} type={} id={} properties={}",
                        index,
                        feature.geometry_type(),
                        feature
                            .id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        feature.properties.len()
                    );
                }
            }
            DecodedTile::Binary(binary) => {
                println!(
                    "input: {} features={} byte_length={}",
                    path.display(),
                    binary.feature_count(),
                    binary.byte_length()
                );
                println!(
                    "points: features={} vertices={}",
                    binary.points.columns.feature_count(),
                    binary.points.columns.vertex_count()
                );
                println!(
                    "lines: features={} vertices={} paths={}",
                    binary.lines.columns.feature_count(),
                    binary.lines.columns.vertex_count(),
                    binary.lines.path_indices.len().saturating_sub(1)
                );
                println!(
                    "polygons: features={} vertices={} polygons={} triangles={}",
                    binary.polygons.columns.feature_count(),
                    binary.polygons.columns.vertex_count(),
                    binary.polygons.polygon_indices.len().saturating_sub(1),
                    binary.polygons.triangles.len() / 3
                );
            }
        },
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
