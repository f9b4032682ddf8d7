use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::options::{Coordinates, DecodeOptions, OutputFormat, parse_tile_index};

#[derive(Debug, Parser)]
#[command(name = "mvt-loader", version, about = "Decode Mapbox Vector Tiles to GeoJSON or binary tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, default_value = "info", global = true)]
    pub log: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Decode(DecodeArgs),
    Layers(LayersArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub coordinates: Option<CoordinatesArg>,

    /// Tile index as z/x/y, required for geographic coordinates
    #[arg(long)]
    pub tile: Option<String>,

    /// Only keep features from these layers (repeatable)
    #[arg(long = "layer")]
    pub layers: Vec<String>,

    #[arg(long)]
    pub layer_property: Option<String>,

    /// JSON file with decode options; flags override it
    #[arg(long)]
    pub options: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub output: ReportFormat,
}

impl DecodeArgs {
    /// Options file first, then flags on top.
    pub fn decode_options(&self) -> Result<DecodeOptions> {
        let mut options = match self.options.as_deref() {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                DecodeOptions::from_json_str(&text)?
            }
            None => DecodeOptions::default(),
        };
        if let Some(coordinates) = self.coordinates {
            options.coordinates = coordinates.into();
        }
        if let Some(tile) = self.tile.as_deref() {
            options.tile_index = Some(parse_tile_index(tile)?);
        }
        if !self.layers.is_empty() {
            options.layers = Some(self.layers.clone());
        }
        if let Some(key) = self.layer_property.as_deref() {
            options.layer_property = key.to_string();
        }
        if let Some(format) = self.format {
            options.output_format = format.into();
        }
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Args)]
pub struct LayersArgs {
    pub input: PathBuf,

    #[arg(long)]
    pub layer: Option<String>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoordinatesArg {
    Local,
    #[value(alias = "wgs84")]
    Geographic,
}

impl From<CoordinatesArg> for Coordinates {
    fn from(value: CoordinatesArg) -> Self {
        match value {
            CoordinatesArg::Local => Coordinates::Local,
            CoordinatesArg::Geographic => Coordinates::Geographic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[value(alias = "geojson")]
    Features,
    Binary,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Features => OutputFormat::Features,
            FormatArg::Binary => OutputFormat::Binary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Ndjson,
}
