use serde::Deserialize;

use crate::error::{MvtError, Result};

/// Property key that receives the source layer name unless overridden.
pub const DEFAULT_LAYER_PROPERTY: &str = "layerName";

pub const MAX_ZOOM: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TileIndex {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coordinates {
    /// Tile-relative coordinates normalized to `[0, 1]`.
    #[default]
    Local,
    /// Longitude/latitude, requires a tile index.
    #[serde(alias = "wgs84")]
    Geographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "geojson")]
    Features,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodeOptions {
    pub coordinates: Coordinates,
    pub tile_index: Option<TileIndex>,
    /// Layer allow-list. `None` keeps every layer.
    pub layers: Option<Vec<String>>,
    pub layer_property: String,
    pub output_format: OutputFormat,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            coordinates: Coordinates::Local,
            tile_index: None,
            layers: None,
            layer_property: DEFAULT_LAYER_PROPERTY.to_string(),
            output_format: OutputFormat::Features,
        }
    }
}

impl DecodeOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| MvtError::Configuration(format!("invalid decode options: {err}")))
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn with_tile_index(mut self, tile_index: TileIndex) -> Self {
        self.tile_index = Some(tile_index);
        self
    }

    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = Some(layers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_layer_property(mut self, key: impl Into<String>) -> Self {
        self.layer_property = key.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn includes_layer(&self, name: &str) -> bool {
        match self.layers.as_ref() {
            Some(allowed) => allowed.iter().any(|layer| layer == name),
            None => true,
        }
    }

    /// Rejects incompatible options. Called before any byte of the tile is read.
    pub fn validate(&self) -> Result<()> {
        if self.layer_property.is_empty() {
            return Err(MvtError::Configuration(
                "layerProperty must not be empty".to_string(),
            ));
        }
        if let Some(tile) = self.tile_index {
            validate_tile_index(tile)?;
        }
        if self.coordinates == Coordinates::Geographic && self.tile_index.is_none() {
            return Err(MvtError::Configuration(
                "geographic coordinates require a tile index".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_tile_index(tile: TileIndex) -> Result<()> {
    if tile.z > MAX_ZOOM {
        return Err(MvtError::Configuration(format!(
            "tile zoom {} exceeds {MAX_ZOOM}",
            tile.z
        )));
    }
    let dim = 1u64 << tile.z;
    if u64::from(tile.x) >= dim || u64::from(tile.y) >= dim {
        return Err(MvtError::Configuration(format!(
            "tile {}/{}/{} is outside the zoom level grid",
            tile.z, tile.x, tile.y
        )));
    }
    Ok(())
}

pub fn parse_tile_index(value: &str) -> Result<TileIndex> {
    let invalid = || MvtError::Configuration("tile must be in z/x/y format".to_string());
    let trimmed = value.trim();
    let mut parts = trimmed.split('/');
    let z_str = parts.next().ok_or_else(invalid)?;
    let x_str = parts.next().ok_or_else(invalid)?;
    let y_str = parts.next().ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    let z: u8 = z_str
        .parse()
        .map_err(|_| MvtError::Configuration(format!("invalid tile zoom: {z_str}")))?;
    let x: u32 = x_str
        .parse()
        .map_err(|_| MvtError::Configuration(format!("invalid tile x: {x_str}")))?;
    let y: u32 = y_str
        .parse()
        .map_err(|_| MvtError::Configuration(format!("invalid tile y: {y_str}")))?;
    let tile = TileIndex { z, x, y };
    validate_tile_index(tile)?;
    Ok(tile)
}
