use geo_types::{Coord, Geometry, LineString, Polygon};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::error::Result;
use crate::output::{DecodedFeature, FeatureSink};

/// Ordered property mapping. Key order follows the tile's tag order, with the
/// layer name property last.
pub type Properties = serde_json::Map<String, Value>;

/// GeoJSON-shaped feature. Polygon rings are closed, exterior first.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<u64>,
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl Feature {
    pub fn geometry_type(&self) -> &'static str {
        geometry_type(&self.geometry)
    }

    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("type".to_string(), json!("Feature"));
        if let Some(id) = self.id {
            object.insert("id".to_string(), json!(id));
        }
        object.insert("geometry".to_string(), geometry_to_json(&self.geometry));
        object.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        Value::Object(object)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

pub fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

fn position(coord: &Coord<f64>) -> Value {
    json!([coord.x, coord.y])
}

fn line_positions(line: &LineString<f64>) -> Value {
    Value::Array(line.0.iter().map(position).collect())
}

fn polygon_positions(polygon: &Polygon<f64>) -> Value {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    rings.push(line_positions(polygon.exterior()));
    for ring in polygon.interiors() {
        rings.push(line_positions(ring));
    }
    Value::Array(rings)
}

pub fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    let coordinates = match geometry {
        Geometry::Point(point) => position(&point.0),
        Geometry::MultiPoint(points) => {
            Value::Array(points.iter().map(|point| position(&point.0)).collect())
        }
        Geometry::Line(line) => json!([position(&line.start), position(&line.end)]),
        Geometry::LineString(line) => line_positions(line),
        Geometry::MultiLineString(lines) => Value::Array(lines.iter().map(line_positions).collect()),
        Geometry::Polygon(polygon) => polygon_positions(polygon),
        Geometry::Rect(rect) => polygon_positions(&rect.to_polygon()),
        Geometry::Triangle(triangle) => polygon_positions(&triangle.to_polygon()),
        Geometry::MultiPolygon(polygons) => {
            Value::Array(polygons.iter().map(polygon_positions).collect())
        }
        Geometry::GeometryCollection(collection) => {
            return json!({
                "type": "GeometryCollection",
                "geometries": collection.iter().map(geometry_to_json).collect::<Vec<_>>(),
            });
        }
    };
    json!({
        "type": geometry_type(geometry),
        "coordinates": coordinates,
    })
}

/// Collects the stream into an ordered feature list.
#[derive(Debug, Default)]
pub struct FeatureCollectionBuilder {
    features: Vec<Feature>,
}

impl FeatureCollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureSink for FeatureCollectionBuilder {
    type Output = Vec<Feature>;

    fn push(&mut self, feature: DecodedFeature) -> Result<()> {
        self.features.push(feature.feature);
        Ok(())
    }

    fn finish(self) -> Result<Vec<Feature>> {
        Ok(self.features)
    }
}
