//! Tile-space to output-space coordinate mapping.

use std::f64::consts::PI;

use geo_types::Coord;

use crate::error::{MvtError, Result};
use crate::geometry::TileCoord;
use crate::options::{Coordinates, TileIndex};

/// Maps integer tile coordinates of one layer into the requested output space.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    extent: f64,
    mode: Mode,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Local,
    Geographic { tile_x: f64, tile_y: f64, scale: f64 },
}

impl Projector {
    pub fn new(extent: u32, coordinates: Coordinates, tile: Option<TileIndex>) -> Result<Self> {
        let mode = match (coordinates, tile) {
            (Coordinates::Local, _) => Mode::Local,
            (Coordinates::Geographic, Some(tile)) => Mode::Geographic {
                tile_x: f64::from(tile.x),
                tile_y: f64::from(tile.y),
                scale: 2.0_f64.powi(i32::from(tile.z)),
            },
            (Coordinates::Geographic, None) => {
                return Err(MvtError::Configuration(
                    "geographic coordinates require a tile index".to_string(),
                ));
            }
        };
        Ok(Self {
            extent: f64::from(extent),
            mode,
        })
    }

    #[inline]
    pub fn project(&self, point: TileCoord) -> Coord<f64> {
        let local = Coord {
            x: f64::from(point.x) / self.extent,
            y: f64::from(point.y) / self.extent,
        };
        match self.mode {
            Mode::Local => local,
            Mode::Geographic {
                tile_x,
                tile_y,
                scale,
            } => local_to_lon_lat(local, tile_x, tile_y, scale),
        }
    }

    pub fn project_all(&self, points: &[TileCoord]) -> Vec<Coord<f64>> {
        points.iter().map(|point| self.project(*point)).collect()
    }
}

/// Inverse Web Mercator for a position inside tile `(tile_x, tile_y)` of a
/// zoom level with `scale = 2^z` tiles per axis.
#[inline]
pub fn local_to_lon_lat(local: Coord<f64>, tile_x: f64, tile_y: f64, scale: f64) -> Coord<f64> {
    let lon = (local.x + tile_x) / scale * 360.0 - 180.0;
    let y = (local.y + tile_y) / scale;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    Coord {
        x: lon,
        y: lat_rad * 180.0 / PI,
    }
}
