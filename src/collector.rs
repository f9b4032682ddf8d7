use geo_types::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::{Number, Value as JsonValue};

use crate::error::Result;
use crate::geometry::{TileGeometry, TilePolygon, decode_geometry};
use crate::options::DecodeOptions;
use crate::output::{DecodedFeature, Feature, FeatureSink, Properties};
use crate::projection::Projector;
use crate::wire::{GeomType, RawFeature, RawLayer, Value};

/// Walks layers in order and feeds surviving features to a sink, numbering
/// them as it goes.
pub struct FeatureCollector<'a> {
    options: &'a DecodeOptions,
    next_global_id: u64,
}

impl<'a> FeatureCollector<'a> {
    pub fn new(options: &'a DecodeOptions) -> Self {
        Self {
            options,
            next_global_id: 0,
        }
    }

    /// Number of features emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_global_id
    }

    pub fn collect_layer<S: FeatureSink>(&mut self, layer: &RawLayer, sink: &mut S) -> Result<()> {
        if !self.options.includes_layer(&layer.name) {
            tracing::debug!(layer = %layer.name, "layer not in allow-list, skipping");
            return Ok(());
        }
        let projector = Projector::new(
            layer.extent,
            self.options.coordinates,
            self.options.tile_index,
        )?;
        for raw in layer.features.iter() {
            if raw.geom_type == GeomType::Unknown {
                tracing::debug!(layer = %layer.name, id = ?raw.id, "skipping feature of unknown type");
                continue;
            }
            let tile_geometry = decode_geometry(raw.geom_type, &raw.geometry)?;
            if tile_geometry.is_empty() {
                tracing::debug!(layer = %layer.name, id = ?raw.id, "skipping feature without geometry");
                continue;
            }
            let feature = Feature {
                id: raw.id,
                geometry: project_geometry(&projector, &tile_geometry),
                properties: self.materialize_properties(layer, raw),
            };
            sink.push(DecodedFeature {
                global_id: self.next_global_id,
                feature,
            })?;
            self.next_global_id += 1;
        }
        Ok(())
    }

    fn materialize_properties(&self, layer: &RawLayer, raw: &RawFeature) -> Properties {
        let mut properties = Properties::new();
        for (key, value) in layer.properties(raw) {
            properties.insert(key.to_string(), json_value(value));
        }
        properties.insert(
            self.options.layer_property.clone(),
            JsonValue::String(layer.name.clone()),
        );
        properties
    }
}

pub fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::String(text) => JsonValue::String(text.clone()),
        Value::Float(val) => float_value(f64::from(*val)),
        Value::Double(val) => float_value(*val),
        Value::Int(val) => JsonValue::from(*val),
        Value::UInt(val) => JsonValue::from(*val),
        Value::SInt(val) => JsonValue::from(*val),
        Value::Bool(val) => JsonValue::Bool(*val),
        Value::Null => JsonValue::Null,
    }
}

fn float_value(val: f64) -> JsonValue {
    Number::from_f64(val)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn project_polygon(projector: &Projector, polygon: &TilePolygon) -> Polygon<f64> {
    let exterior = LineString(projector.project_all(&polygon.exterior));
    let interiors = polygon
        .interiors
        .iter()
        .map(|ring| LineString(projector.project_all(ring)))
        .collect();
    // Polygon::new closes every ring.
    Polygon::new(exterior, interiors)
}

pub fn project_geometry(projector: &Projector, geometry: &TileGeometry) -> Geometry<f64> {
    match geometry {
        TileGeometry::Points(points) => {
            let mut points: Vec<Point<f64>> = points
                .iter()
                .map(|point| Point(projector.project(*point)))
                .collect();
            if points.len() == 1 {
                Geometry::Point(points.remove(0))
            } else {
                Geometry::MultiPoint(MultiPoint(points))
            }
        }
        TileGeometry::Lines(lines) => {
            let mut lines: Vec<LineString<f64>> = lines
                .iter()
                .map(|line| LineString(projector.project_all(line)))
                .collect();
            if lines.len() == 1 {
                Geometry::LineString(lines.remove(0))
            } else {
                Geometry::MultiLineString(MultiLineString(lines))
            }
        }
        TileGeometry::Polygons(polygons) => {
            let mut polygons: Vec<Polygon<f64>> = polygons
                .iter()
                .map(|polygon| project_polygon(projector, polygon))
                .collect();
            if polygons.len() == 1 {
                Geometry::Polygon(polygons.remove(0))
            } else {
                Geometry::MultiPolygon(MultiPolygon(polygons))
            }
        }
    }
}
