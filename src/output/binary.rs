//! Columnar (struct-of-arrays) output tables.
//!
//! Index arrays are boundary lists in vertex units: they start with `0` and
//! gain one entry per finished path, ring or polygon, so an empty table still
//! carries `[0]`. Polygon rings are stored closed; triangle indices never
//! point at a closing vertex.

use std::collections::BTreeMap;

use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{Result, geometry_err};
use crate::output::{DecodedFeature, Feature, FeatureSink, Properties};
use crate::triangulate::triangulate;

pub const POSITION_SIZE: usize = 2;

/// A flat numeric buffer of fixed-size records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryAttribute<T> {
    pub value: Vec<T>,
    pub size: usize,
}

impl<T> BinaryAttribute<T> {
    pub fn new(size: usize) -> Self {
        Self {
            value: Vec::new(),
            size,
        }
    }

    pub fn with_values(value: Vec<T>, size: usize) -> Self {
        Self { value, size }
    }

    /// Number of records, not scalars.
    pub fn len(&self) -> usize {
        self.value.len() / self.size.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn byte_length(&self) -> usize {
        self.value.len() * std::mem::size_of::<T>()
    }
}

fn boundaries() -> BinaryAttribute<u32> {
    BinaryAttribute::with_values(vec![0], 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Per-feature and per-vertex columns shared by every geometry table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureColumns {
    pub positions: BinaryAttribute<f64>,
    /// Table-local feature index of every vertex.
    pub feature_ids: BinaryAttribute<u32>,
    /// One entry per feature.
    pub global_feature_ids: BinaryAttribute<u64>,
    /// Fields that are numeric on every feature of the table, one value per feature.
    pub numeric_props: BTreeMap<String, BinaryAttribute<f64>>,
    /// Remaining properties, one map per feature.
    pub properties: Vec<Properties>,
    pub fields: Vec<FeatureFields>,
}

impl Default for FeatureColumns {
    fn default() -> Self {
        Self {
            positions: BinaryAttribute::new(POSITION_SIZE),
            feature_ids: BinaryAttribute::new(1),
            global_feature_ids: BinaryAttribute::new(1),
            numeric_props: BTreeMap::new(),
            properties: Vec::new(),
            fields: Vec::new(),
        }
    }
}

impl FeatureColumns {
    pub fn feature_count(&self) -> usize {
        self.fields.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn local_index(&self, global_id: u64) -> Option<usize> {
        self.global_feature_ids
            .value
            .iter()
            .position(|candidate| *candidate == global_id)
    }

    fn begin_feature(&mut self, global_id: u64, id: Option<u64>, properties: Properties) -> u32 {
        let index = self.fields.len() as u32;
        self.fields.push(FeatureFields { id });
        self.global_feature_ids.value.push(global_id);
        self.properties.push(properties);
        index
    }

    fn push_vertex(&mut self, coord: &Coord<f64>, feature_index: u32) {
        self.positions.value.push(coord.x);
        self.positions.value.push(coord.y);
        self.feature_ids.value.push(feature_index);
    }

    fn coord_at(&self, vertex: usize) -> Coord<f64> {
        let offset = vertex * POSITION_SIZE;
        Coord {
            x: self.positions.value[offset],
            y: self.positions.value[offset + 1],
        }
    }

    fn coords(&self, start: usize, end: usize) -> Vec<Coord<f64>> {
        (start..end).map(|vertex| self.coord_at(vertex)).collect()
    }

    fn owns_vertex(&self, vertex: usize, index: usize) -> bool {
        self.feature_ids
            .value
            .get(vertex)
            .is_some_and(|owner| *owner as usize == index)
    }

    /// Moves fields whose value is an `f64`-exact number on every feature into
    /// typed columns.
    fn hoist_numeric_props(&mut self) {
        let Some(first) = self.properties.first() else {
            return;
        };
        let numeric_keys: Vec<String> = first
            .iter()
            .filter(|(_, value)| exact_in_f64(value))
            .map(|(key, _)| key.clone())
            .filter(|key| {
                self.properties
                    .iter()
                    .all(|props| props.get(key).is_some_and(exact_in_f64))
            })
            .collect();
        for key in numeric_keys {
            let column = self
                .properties
                .iter_mut()
                .map(|props| {
                    props
                        .shift_remove(&key)
                        .and_then(|value| value.as_f64())
                        .unwrap_or(f64::NAN)
                })
                .collect();
            self.numeric_props
                .insert(key, BinaryAttribute::with_values(column, 1));
        }
    }

    fn properties_of(&self, index: usize) -> Properties {
        let mut properties = self.properties.get(index).cloned().unwrap_or_default();
        for (key, column) in self.numeric_props.iter() {
            if let Some(value) = column.value.get(index) {
                properties.insert(key.clone(), number_value(*value));
            }
        }
        properties
    }

    fn byte_length(&self) -> usize {
        self.positions.byte_length()
            + self.feature_ids.byte_length()
            + self.global_feature_ids.byte_length()
            + self
                .numeric_props
                .values()
                .map(BinaryAttribute::byte_length)
                .sum::<usize>()
    }
}

/// 2^53: integers below this magnitude survive a trip through `f64`.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

fn exact_in_f64(value: &Value) -> bool {
    if let Some(int) = value.as_u64() {
        int < MAX_SAFE_INTEGER
    } else if let Some(int) = value.as_i64() {
        int.unsigned_abs() < MAX_SAFE_INTEGER
    } else {
        value.is_f64()
    }
}

/// Integral values come back as JSON integers, mirroring how they were decoded.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER as f64 {
        if value >= 0.0 {
            json!(value as u64)
        } else {
            json!(value as i64)
        }
    } else {
        json!(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryPointTable {
    #[serde(flatten)]
    pub columns: FeatureColumns,
}

impl BinaryPointTable {
    pub fn feature(&self, index: usize) -> Option<Feature> {
        let fields = self.columns.fields.get(index)?;
        let points: Vec<Coord<f64>> = (0..self.columns.vertex_count())
            .filter(|vertex| self.columns.owns_vertex(*vertex, index))
            .map(|vertex| self.columns.coord_at(vertex))
            .collect();
        let geometry = match points.as_slice() {
            [single] => Geometry::Point((*single).into()),
            _ => Geometry::MultiPoint(MultiPoint(points.into_iter().map(Into::into).collect())),
        };
        Some(Feature {
            id: fields.id,
            geometry,
            properties: self.columns.properties_of(index),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryLineTable {
    #[serde(flatten)]
    pub columns: FeatureColumns,
    pub path_indices: BinaryAttribute<u32>,
}

impl Default for BinaryLineTable {
    fn default() -> Self {
        Self {
            columns: FeatureColumns::default(),
            path_indices: boundaries(),
        }
    }
}

impl BinaryLineTable {
    fn push_path(&mut self, feature_index: u32, coords: &[Coord<f64>]) {
        for coord in coords {
            self.columns.push_vertex(coord, feature_index);
        }
        self.path_indices
            .value
            .push(self.columns.vertex_count() as u32);
    }

    pub fn feature(&self, index: usize) -> Option<Feature> {
        let fields = self.columns.fields.get(index)?;
        let mut lines: Vec<LineString<f64>> = self
            .path_indices
            .value
            .windows(2)
            .map(|bounds| (bounds[0] as usize, bounds[1] as usize))
            .filter(|(start, end)| end > start && self.columns.owns_vertex(*start, index))
            .map(|(start, end)| LineString(self.columns.coords(start, end)))
            .collect();
        let geometry = if lines.len() == 1 {
            Geometry::LineString(lines.remove(0))
        } else {
            Geometry::MultiLineString(MultiLineString(lines))
        };
        Some(Feature {
            id: fields.id,
            geometry,
            properties: self.columns.properties_of(index),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryPolygonTable {
    #[serde(flatten)]
    pub columns: FeatureColumns,
    /// Vertex boundaries of each polygon (exterior plus its holes).
    pub polygon_indices: BinaryAttribute<u32>,
    /// Vertex boundaries of each ring.
    pub primitive_polygon_indices: BinaryAttribute<u32>,
    pub triangles: BinaryAttribute<u32>,
}

impl Default for BinaryPolygonTable {
    fn default() -> Self {
        Self {
            columns: FeatureColumns::default(),
            polygon_indices: boundaries(),
            primitive_polygon_indices: boundaries(),
            triangles: BinaryAttribute::new(1),
        }
    }
}

impl BinaryPolygonTable {
    fn push_polygon(&mut self, feature_index: u32, polygon: &Polygon<f64>) -> Result<()> {
        let mut rings: Vec<&LineString<f64>> = Vec::with_capacity(1 + polygon.interiors().len());
        rings.push(polygon.exterior());
        rings.extend(polygon.interiors());

        let mut ring_starts = Vec::with_capacity(rings.len());
        let mut open_rings = Vec::with_capacity(rings.len());
        for ring in rings {
            ring_starts.push(self.columns.vertex_count());
            for coord in ring.0.iter() {
                self.columns.push_vertex(coord, feature_index);
            }
            self.primitive_polygon_indices
                .value
                .push(self.columns.vertex_count() as u32);
            open_rings.push(ring_coords(ring));
        }
        self.polygon_indices
            .value
            .push(self.columns.vertex_count() as u32);

        let mut open_starts = Vec::with_capacity(open_rings.len());
        let mut total = 0usize;
        for ring in open_rings.iter() {
            open_starts.push(total);
            total += ring.len();
        }

        for index in triangulate(&open_rings)? {
            let ring = open_starts
                .iter()
                .zip(open_rings.iter())
                .rposition(|(start, ring)| *start <= index && index < start + ring.len())
                .ok_or_else(|| geometry_err(format!("triangle index {index} outside polygon")))?;
            let vertex = ring_starts[ring] + (index - open_starts[ring]);
            self.triangles.value.push(vertex as u32);
        }
        Ok(())
    }

    pub fn feature(&self, index: usize) -> Option<Feature> {
        let fields = self.columns.fields.get(index)?;
        let mut polygons = Vec::new();
        for bounds in self.polygon_indices.value.windows(2) {
            let (start, end) = (bounds[0], bounds[1]);
            if end <= start || !self.columns.owns_vertex(start as usize, index) {
                continue;
            }
            let ring_bounds: Vec<u32> = self
                .primitive_polygon_indices
                .value
                .iter()
                .copied()
                .filter(|bound| start <= *bound && *bound <= end)
                .collect();
            let mut rings = ring_bounds
                .windows(2)
                .filter(|pair| pair[1] > pair[0])
                .map(|pair| LineString(self.columns.coords(pair[0] as usize, pair[1] as usize)));
            let Some(exterior) = rings.next() else {
                continue;
            };
            polygons.push(Polygon::new(exterior, rings.collect()));
        }
        let geometry = if polygons.len() == 1 {
            Geometry::Polygon(polygons.remove(0))
        } else {
            Geometry::MultiPolygon(MultiPolygon(polygons))
        };
        Some(Feature {
            id: fields.id,
            geometry,
            properties: self.columns.properties_of(index),
        })
    }
}

/// Ring vertices without the closing repeat of the first vertex.
pub fn ring_coords(line: &LineString<f64>) -> &[Coord<f64>] {
    let coords = line.0.as_slice();
    if coords.len() > 1 && coords.first() == coords.last() {
        &coords[..coords.len() - 1]
    } else {
        coords
    }
}

/// The three geometry tables of a decoded tile. All are present even when empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BinaryFeatureCollection {
    pub points: BinaryPointTable,
    pub lines: BinaryLineTable,
    pub polygons: BinaryPolygonTable,
}

impl BinaryFeatureCollection {
    pub fn feature_count(&self) -> usize {
        self.points.columns.feature_count()
            + self.lines.columns.feature_count()
            + self.polygons.columns.feature_count()
    }

    /// Total size in bytes of every numeric buffer.
    pub fn byte_length(&self) -> usize {
        self.points.columns.byte_length()
            + self.lines.columns.byte_length()
            + self.lines.path_indices.byte_length()
            + self.polygons.columns.byte_length()
            + self.polygons.polygon_indices.byte_length()
            + self.polygons.primitive_polygon_indices.byte_length()
            + self.polygons.triangles.byte_length()
    }

    /// Rebuilds the feature that was assigned `global_id`.
    pub fn feature_by_global_id(&self, global_id: u64) -> Option<Feature> {
        if let Some(index) = self.points.columns.local_index(global_id) {
            return self.points.feature(index);
        }
        if let Some(index) = self.lines.columns.local_index(global_id) {
            return self.lines.feature(index);
        }
        let index = self.polygons.columns.local_index(global_id)?;
        self.polygons.feature(index)
    }
}

/// Appends each feature to the table matching its geometry kind.
#[derive(Debug, Default)]
pub struct BinaryBuilder {
    tables: BinaryFeatureCollection,
}

impl BinaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureSink for BinaryBuilder {
    type Output = BinaryFeatureCollection;

    fn push(&mut self, decoded: DecodedFeature) -> Result<()> {
        let DecodedFeature {
            global_id,
            feature,
        } = decoded;
        let Feature {
            id,
            geometry,
            properties,
        } = feature;
        let tables = &mut self.tables;
        match geometry {
            Geometry::Point(point) => {
                let index = tables.points.columns.begin_feature(global_id, id, properties);
                tables.points.columns.push_vertex(&point.0, index);
            }
            Geometry::MultiPoint(points) => {
                let index = tables.points.columns.begin_feature(global_id, id, properties);
                for point in points.iter() {
                    tables.points.columns.push_vertex(&point.0, index);
                }
            }
            Geometry::Line(line) => {
                let index = tables.lines.columns.begin_feature(global_id, id, properties);
                tables.lines.push_path(index, &[line.start, line.end]);
            }
            Geometry::LineString(line) => {
                let index = tables.lines.columns.begin_feature(global_id, id, properties);
                tables.lines.push_path(index, &line.0);
            }
            Geometry::MultiLineString(lines) => {
                let index = tables.lines.columns.begin_feature(global_id, id, properties);
                for line in lines.iter() {
                    tables.lines.push_path(index, &line.0);
                }
            }
            Geometry::Polygon(polygon) => {
                let index = tables.polygons.columns.begin_feature(global_id, id, properties);
                tables.polygons.push_polygon(index, &polygon)?;
            }
            Geometry::Rect(rect) => {
                let index = tables.polygons.columns.begin_feature(global_id, id, properties);
                tables.polygons.push_polygon(index, &rect.to_polygon())?;
            }
            Geometry::Triangle(triangle) => {
                let index = tables.polygons.columns.begin_feature(global_id, id, properties);
                tables.polygons.push_polygon(index, &triangle.to_polygon())?;
            }
            Geometry::MultiPolygon(polygons) => {
                let index = tables.polygons.columns.begin_feature(global_id, id, properties);
                for polygon in polygons.iter() {
                    tables.polygons.push_polygon(index, polygon)?;
                }
            }
            Geometry::GeometryCollection(_) => {
                return Err(geometry_err(
                    "geometry collections are not supported in binary output",
                ));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<BinaryFeatureCollection> {
        self.tables.points.columns.hoist_numeric_props();
        self.tables.lines.columns.hoist_numeric_props();
        self.tables.polygons.columns.hoist_numeric_props();
        Ok(self.tables)
    }
}

/// Runs features that already went through the collection path into the
/// binary tables. Global ids follow the slice order.
pub fn binary_from_features(features: &[Feature]) -> Result<BinaryFeatureCollection> {
    let mut builder = BinaryBuilder::new();
    for (index, feature) in features.iter().enumerate() {
        builder.push(DecodedFeature {
            global_id: index as u64,
            feature: feature.clone(),
        })?;
    }
    builder.finish()
}
