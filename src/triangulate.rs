//! Ear-clipping triangulation of polygons with holes.

use earcutr::earcut;
use geo_types::Coord;

use crate::error::{Result, geometry_err};

/// Triangulates one polygon. `rings[0]` is the exterior, the rest are holes;
/// no ring repeats its first vertex.
///
/// Returned indices address the concatenation of `rings` in order. Rings with
/// fewer than three vertices or zero area contribute no vertices to the
/// triangulation; a degenerate exterior yields no triangles at all.
pub fn triangulate(rings: &[&[Coord<f64>]]) -> Result<Vec<usize>> {
    let Some(exterior) = rings.first() else {
        return Ok(Vec::new());
    };
    if is_degenerate(exterior) {
        return Ok(Vec::new());
    }

    let mut data = Vec::new();
    let mut hole_indices = Vec::new();
    // (start in earcut data, start in caller concatenation) per included ring
    let mut offsets = Vec::with_capacity(rings.len());
    let mut concat_start = 0usize;
    for (idx, ring) in rings.iter().enumerate() {
        if idx == 0 || !is_degenerate(ring) {
            let data_start = data.len() / 2;
            if idx > 0 {
                hole_indices.push(data_start);
            }
            offsets.push((data_start, concat_start));
            for coord in ring.iter() {
                data.push(coord.x);
                data.push(coord.y);
            }
        }
        concat_start += ring.len();
    }

    let indices = earcut(&data, &hole_indices, 2)
        .map_err(|err| geometry_err(format!("triangulation failed: {err:?}")))?;

    Ok(indices
        .into_iter()
        .map(|index| {
            let (data_start, concat_start) = offsets
                .iter()
                .rev()
                .find(|(data_start, _)| *data_start <= index)
                .copied()
                .unwrap_or((0, 0));
            concat_start + (index - data_start)
        })
        .collect())
}

fn is_degenerate(ring: &[Coord<f64>]) -> bool {
    ring.len() < 3 || ring_area(ring) == 0.0
}

pub fn ring_area(ring: &[Coord<f64>]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        area += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    area / 2.0
}
