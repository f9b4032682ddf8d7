//! Expansion of geometry command streams into absolute tile coordinates.

use geo_types::Coord;

use crate::error::{Result, geometry_err};
use crate::wire::GeomType;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

pub type TileCoord = Coord<i32>;

/// Polygon in tile space. Rings do not repeat their first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePolygon {
    pub exterior: Vec<TileCoord>,
    pub interiors: Vec<Vec<TileCoord>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileGeometry {
    Points(Vec<TileCoord>),
    Lines(Vec<Vec<TileCoord>>),
    Polygons(Vec<TilePolygon>),
}

impl TileGeometry {
    pub fn is_empty(&self) -> bool {
        match self {
            TileGeometry::Points(points) => points.is_empty(),
            TileGeometry::Lines(lines) => lines.is_empty(),
            TileGeometry::Polygons(polygons) => polygons.is_empty(),
        }
    }
}

/// Decodes a feature's command stream.
///
/// Zero-area rings are dropped, as are paths with fewer than two vertices in a
/// line feature.
pub fn decode_geometry(geom_type: GeomType, commands: &[u32]) -> Result<TileGeometry> {
    let paths = decode_paths(geom_type, commands)?;
    match geom_type {
        GeomType::Point => Ok(TileGeometry::Points(paths.into_iter().flatten().collect())),
        GeomType::LineString => {
            let lines = paths
                .into_iter()
                .filter(|path| {
                    let keep = path.len() >= 2;
                    if !keep {
                        tracing::trace!(vertices = path.len(), "dropping short line path");
                    }
                    keep
                })
                .collect();
            Ok(TileGeometry::Lines(lines))
        }
        GeomType::Polygon => Ok(TileGeometry::Polygons(classify_rings(paths))),
        GeomType::Unknown => Err(geometry_err("cannot decode geometry of unknown type")),
    }
}

fn decode_paths(geom_type: GeomType, commands: &[u32]) -> Result<Vec<Vec<TileCoord>>> {
    let mut paths = Vec::new();
    let mut current: Option<Vec<TileCoord>> = None;
    let mut cursor = TileCoord { x: 0, y: 0 };
    let mut pos = 0usize;

    while pos < commands.len() {
        let cmd_int = commands[pos];
        pos += 1;
        let cmd = cmd_int & 0x7;
        let count = (cmd_int >> 3) as usize;

        match cmd {
            CMD_MOVE_TO | CMD_LINE_TO => {
                if cmd == CMD_LINE_TO && geom_type == GeomType::Point {
                    return Err(geometry_err("LineTo in point geometry"));
                }
                let remaining = commands.len() - pos;
                if count.saturating_mul(2) > remaining {
                    return Err(geometry_err(format!(
                        "command {cmd} repeats {count} times but only {remaining} parameters remain"
                    )));
                }
                for _ in 0..count {
                    cursor.x = cursor.x.wrapping_add(unzigzag(commands[pos]));
                    cursor.y = cursor.y.wrapping_add(unzigzag(commands[pos + 1]));
                    pos += 2;
                    if cmd == CMD_MOVE_TO {
                        if let Some(path) = current.take() {
                            paths.push(path);
                        }
                        current = Some(vec![cursor]);
                    } else {
                        current
                            .as_mut()
                            .ok_or_else(|| geometry_err("LineTo before MoveTo"))?
                            .push(cursor);
                    }
                }
            }
            CMD_CLOSE_PATH => {
                if geom_type != GeomType::Polygon {
                    return Err(geometry_err(format!(
                        "ClosePath in {geom_type:?} geometry"
                    )));
                }
                if count != 1 {
                    return Err(geometry_err(format!("ClosePath count must be 1, got {count}")));
                }
                let ring = current
                    .take()
                    .ok_or_else(|| geometry_err("ClosePath before MoveTo"))?;
                paths.push(ring);
            }
            other => return Err(geometry_err(format!("unknown command id {other}"))),
        }
    }

    if let Some(path) = current {
        paths.push(path);
    }
    Ok(paths)
}

/// Groups rings into polygons. The first non-degenerate ring fixes which
/// winding means exterior; a feature wound the other way round is reversed so
/// exteriors always come out with positive area.
fn classify_rings(rings: Vec<Vec<TileCoord>>) -> Vec<TilePolygon> {
    let mut polygons: Vec<TilePolygon> = Vec::new();
    let mut exterior_sign = 0.0;
    for mut ring in rings {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        let area = signed_area(&ring);
        if area == 0.0 {
            tracing::trace!(vertices = ring.len(), "dropping zero-area ring");
            continue;
        }
        if exterior_sign == 0.0 {
            exterior_sign = area.signum();
            if exterior_sign < 0.0 {
                tracing::trace!("polygon wound in reverse, flipping rings");
            }
        }
        if exterior_sign < 0.0 {
            ring.reverse();
        }
        if area.signum() != exterior_sign {
            if let Some(polygon) = polygons.last_mut() {
                polygon.interiors.push(ring);
            }
        } else {
            polygons.push(TilePolygon {
                exterior: ring,
                interiors: Vec::new(),
            });
        }
    }
    polygons
}

/// Shoelace area in the y-down tile frame. Exterior rings are positive,
/// holes negative. Rings with fewer than three vertices have zero area.
pub fn signed_area(ring: &[TileCoord]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut area = 0i128;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += i128::from(ring[i].x) * i128::from(ring[j].y);
        area -= i128::from(ring[j].x) * i128::from(ring[i].y);
    }
    area as f64 / 2.0
}

#[inline]
fn unzigzag(v: u32) -> i32 {
    ((v >> 1) as i32) ^ (-((v & 1) as i32))
}
