//! Mapbox Vector Tile decoding into GeoJSON-shaped features or columnar
//! binary tables.
//!
//! ```no_run
//! use mvt_loader::{DecodeOptions, decode_features};
//!
//! let bytes = std::fs::read("tile.mvt").unwrap();
//! let features = decode_features(&bytes, &DecodeOptions::default()).unwrap();
//! println!("{} features", features.len());
//! ```

pub mod cli;
pub mod collector;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod input;
pub mod options;
pub mod output;
pub mod projection;
pub mod summary;
pub mod triangulate;
pub mod wire;
pub mod worker;

pub use decode::{DecodedTile, decode, decode_binary, decode_features, decode_into};
pub use error::{MvtError, Result};
pub use options::{Coordinates, DecodeOptions, OutputFormat, TileIndex, parse_tile_index};
pub use output::{
    BinaryFeatureCollection, DecodedFeature, Feature, FeatureSink, binary_from_features,
};
pub use summary::{LayerSummary, TileSummary, summarize_layers};
pub use worker::{DecodeWorker, decode_batch};
