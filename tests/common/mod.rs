#![allow(dead_code)]

use mvt::{GeomEncoder, GeomType, Tile};

pub const POINT_X: f64 = 2284.0;
pub const POINT_Y: f64 = 760.0;

/// One layer `layer0` with a single point at (0.5576171875, 0.185546875) of a
/// 4096 extent.
pub fn point_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let layer = tile.create_layer("layer0");
    let geom = GeomEncoder::new(GeomType::Point)
        .point(POINT_X, POINT_Y)
        .expect("point")
        .encode()
        .expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.add_tag_uint("cartodb_id", 3);
    feature.add_tag_uint("_cdb_feature_count", 1);
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer0");
    tile.to_bytes().expect("tile bytes")
}

pub fn line_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let layer = tile.create_layer("layer0");
    let mut encoder = GeomEncoder::new(GeomType::Linestring);
    encoder.add_point(-16.0, 2002.0).expect("point");
    encoder.add_point(4.0, 2008.0).expect("point");
    let geom = encoder.encode().expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.add_tag_uint("cartodb_id", 1);
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer0");
    tile.to_bytes().expect("tile bytes")
}

/// Vertices of a convex ring with positive tile-space area.
pub fn circle_ring(count: usize, cx: f64, cy: f64, radius: f64) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            (
                (cx + radius * angle.cos()).round(),
                (cy + radius * angle.sin()).round(),
            )
        })
        .collect()
}

fn encode_rings(rings: &[Vec<(f64, f64)>]) -> mvt::GeomData {
    let mut encoder = GeomEncoder::new(GeomType::Polygon);
    for (idx, ring) in rings.iter().enumerate() {
        for (x, y) in ring.iter() {
            encoder.add_point(*x, *y).expect("point");
        }
        if idx + 1 < rings.len() {
            encoder.complete_geom().expect("complete ring");
        }
    }
    encoder.encode().expect("encode")
}

/// A single polygon feature whose exterior ring has 30 distinct vertices.
pub fn polygon_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let layer = tile.create_layer("layer0");
    let geom = encode_rings(&[circle_ring(30, 2048.0, 2048.0, 1000.0)]);
    let mut feature = layer.into_feature(geom);
    feature.add_tag_uint("cartodb_id", 7);
    feature.add_tag_string("name", "circle");
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer0");
    tile.to_bytes().expect("tile bytes")
}

pub fn square_exterior() -> Vec<(f64, f64)> {
    vec![(100.0, 100.0), (400.0, 100.0), (400.0, 400.0), (100.0, 400.0)]
}

pub fn square_hole() -> Vec<(f64, f64)> {
    vec![(200.0, 200.0), (200.0, 300.0), (300.0, 300.0), (300.0, 200.0)]
}

pub fn polygon_with_hole_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let layer = tile.create_layer("buildings");
    let geom = encode_rings(&[square_exterior(), square_hole()]);
    let mut feature = layer.into_feature(geom);
    feature.set_id(42);
    feature.add_tag_double("height", 12.5);
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add buildings");
    tile.to_bytes().expect("tile bytes")
}

/// layer0: two points, layer1: a line and a point, layer2: a polygon.
pub fn multi_layer_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);

    let layer = tile.create_layer("layer0");
    let geom = GeomEncoder::new(GeomType::Point)
        .point(10.0, 20.0)
        .expect("point")
        .encode()
        .expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.add_tag_string("kind", "a");
    let layer = feature.into_layer();
    let geom = GeomEncoder::new(GeomType::Point)
        .point(30.0, 40.0)
        .expect("point")
        .encode()
        .expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.add_tag_string("kind", "b");
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer0");

    let layer = tile.create_layer("layer1");
    let mut encoder = GeomEncoder::new(GeomType::Linestring);
    encoder.add_point(0.0, 0.0).expect("point");
    encoder.add_point(100.0, 100.0).expect("point");
    encoder.add_point(200.0, 50.0).expect("point");
    let geom = encoder.encode().expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.set_id(11);
    feature.add_tag_string("class", "primary");
    let layer = feature.into_layer();
    let geom = GeomEncoder::new(GeomType::Point)
        .point(50.0, 60.0)
        .expect("point")
        .encode()
        .expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.set_id(12);
    feature.add_tag_string("class", "stop");
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer1");

    let layer = tile.create_layer("layer2");
    let geom = encode_rings(&[square_exterior()]);
    let mut feature = layer.into_feature(geom);
    feature.set_id(13);
    feature.add_tag_uint("levels", 3);
    let layer = feature.into_layer();
    tile.add_layer(layer).expect("add layer2");

    tile.to_bytes().expect("tile bytes")
}

/// One point, one line and one polygon, each carrying a source id.
pub fn with_feature_id_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let layer = tile.create_layer("mixed");

    let geom = GeomEncoder::new(GeomType::Point)
        .point(1.0, 2.0)
        .expect("point")
        .encode()
        .expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.set_id(100);
    feature.add_tag_uint("rank", 1);
    let layer = feature.into_layer();

    let mut encoder = GeomEncoder::new(GeomType::Linestring);
    encoder.add_point(0.0, 0.0).expect("point");
    encoder.add_point(10.0, 10.0).expect("point");
    let geom = encoder.encode().expect("encode");
    let mut feature = layer.into_feature(geom);
    feature.set_id(200);
    feature.add_tag_uint("rank", 2);
    let layer = feature.into_layer();

    let geom = encode_rings(&[square_exterior()]);
    let mut feature = layer.into_feature(geom);
    feature.set_id(300);
    feature.add_tag_uint("rank", 3);
    let layer = feature.into_layer();

    tile.add_layer(layer).expect("add mixed");
    tile.to_bytes().expect("tile bytes")
}

/// The square polygon of `square_exterior()` plus a collinear hole with no
/// area, written by hand so the encoder cannot touch the degenerate ring.
pub fn polygon_with_zero_size_hole_tile() -> Vec<u8> {
    let mut cursor = (0, 0);
    let mut geometry = ring_commands(&mut cursor, &[(100, 100), (400, 100), (400, 400), (100, 400)]);
    geometry.extend(ring_commands(&mut cursor, &[(200, 200), (250, 250), (300, 300)]));
    let feature = raw_feature(Some(7), 3, &[0, 0], &geometry);
    let layer = raw_layer("layer0", &[feature], &["name"], &[string_value("flat hole")]);
    raw_tile(&[layer])
}

/// Points carrying a `big` integer beyond the exact range of `f64`.
pub fn large_integer_tile() -> Vec<u8> {
    let mut tile = Tile::new(4096);
    let mut layer = tile.create_layer("layer0");
    for (x, big) in [(10.0, (1u64 << 60) + 1), (20.0, 5)] {
        let geom = GeomEncoder::new(GeomType::Point)
            .point(x, 10.0)
            .expect("point")
            .encode()
            .expect("encode");
        let mut feature = layer.into_feature(geom);
        feature.add_tag_uint("big", big);
        feature.add_tag_uint("small", 2);
        layer = feature.into_layer();
    }
    tile.add_layer(layer).expect("add layer0");
    tile.to_bytes().expect("tile bytes")
}

// Hand-written protobuf pieces for inputs the encoder refuses to produce.

pub fn varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub fn key(out: &mut Vec<u8>, field: u32, wire: u8) {
    varint(out, (u64::from(field) << 3) | u64::from(wire));
}

pub fn len_field(out: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    key(out, field, 2);
    varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn packed(out: &mut Vec<u8>, field: u32, values: &[u32]) {
    let mut body = Vec::new();
    for value in values {
        varint(&mut body, u64::from(*value));
    }
    len_field(out, field, &body);
}

pub fn command(id: u32, count: u32) -> u32 {
    id | (count << 3)
}

pub fn zz(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Ring as MoveTo / LineTo / ClosePath with deltas relative to `cursor`.
pub fn ring_commands(cursor: &mut (i32, i32), ring: &[(i32, i32)]) -> Vec<u32> {
    let mut out = Vec::new();
    for (idx, (x, y)) in ring.iter().enumerate() {
        if idx == 0 {
            out.push(command(1, 1));
        } else if idx == 1 {
            out.push(command(2, ring.len() as u32 - 1));
        }
        out.push(zz(x.wrapping_sub(cursor.0)));
        out.push(zz(y.wrapping_sub(cursor.1)));
        *cursor = (*x, *y);
    }
    out.push(command(7, 1));
    out
}

pub fn raw_feature(id: Option<u64>, geom_type: u64, tags: &[u32], geometry: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some(id) = id {
        key(&mut out, 1, 0);
        varint(&mut out, id);
    }
    if !tags.is_empty() {
        packed(&mut out, 2, tags);
    }
    key(&mut out, 3, 0);
    varint(&mut out, geom_type);
    packed(&mut out, 4, geometry);
    out
}

pub fn string_value(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    len_field(&mut out, 1, text.as_bytes());
    out
}

pub fn raw_layer(name: &str, features: &[Vec<u8>], keys: &[&str], values: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    key(&mut out, 15, 0);
    varint(&mut out, 2);
    len_field(&mut out, 1, name.as_bytes());
    for feature in features {
        len_field(&mut out, 2, feature);
    }
    for k in keys {
        len_field(&mut out, 3, k.as_bytes());
    }
    for value in values {
        len_field(&mut out, 4, value);
    }
    key(&mut out, 5, 0);
    varint(&mut out, 4096);
    out
}

pub fn raw_tile(layers: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for layer in layers {
        len_field(&mut out, 3, layer);
    }
    out
}
