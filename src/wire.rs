//! Protobuf walker for the vector tile wire layout.
//!
//! Only the framing is validated here. Geometry command streams are kept raw
//! and expanded later by [`crate::geometry`].

use varint_rs::VarintReader;

use crate::error::{Result, decode_err};

pub const DEFAULT_EXTENT: u32 = 4096;
pub const DEFAULT_VERSION: u32 = 1;

const TILE_LAYERS: u32 = 3;

const LAYER_VERSION: u32 = 15;
const LAYER_NAME: u32 = 1;
const LAYER_FEATURES: u32 = 2;
const LAYER_KEYS: u32 = 3;
const LAYER_VALUES: u32 = 4;
const LAYER_EXTENT: u32 = 5;

const FEATURE_ID: u32 = 1;
const FEATURE_TAGS: u32 = 2;
const FEATURE_TYPE: u32 = 3;
const FEATURE_GEOMETRY: u32 = 4;

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomType {
    Unknown,
    Point,
    LineString,
    Polygon,
}

impl GeomType {
    fn from_wire(value: u64) -> Self {
        match value {
            1 => GeomType::Point,
            2 => GeomType::LineString,
            3 => GeomType::Polygon,
            _ => GeomType::Unknown,
        }
    }
}

/// A property value as stored in a layer's value table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub id: Option<u64>,
    pub geom_type: GeomType,
    pub tags: Vec<u32>,
    pub geometry: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLayer {
    pub version: u32,
    pub name: String,
    pub extent: u32,
    pub keys: Vec<String>,
    pub values: Vec<Value>,
    pub features: Vec<RawFeature>,
}

impl RawLayer {
    /// Key/value pairs of a feature in tag order. Tags are range-checked when
    /// the layer is decoded.
    pub fn properties<'a>(
        &'a self,
        feature: &'a RawFeature,
    ) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        feature.tags.chunks_exact(2).filter_map(move |pair| {
            let key = self.keys.get(pair[0] as usize)?;
            let value = self.values.get(pair[1] as usize)?;
            Some((key.as_str(), value))
        })
    }
}

struct PbfReader<'a> {
    buf: &'a [u8],
}

impl<'a> PbfReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn has_remaining(&self) -> bool {
        !self.buf.is_empty()
    }

    fn read_varint(&mut self) -> Result<u64> {
        self.buf
            .read_u64_varint()
            .map_err(|err| decode_err(format!("truncated varint: {err}")))
    }

    fn read_key(&mut self) -> Result<(u32, u8)> {
        let key = self.read_varint()?;
        let field = u32::try_from(key >> 3)
            .map_err(|_| decode_err(format!("field number out of range: {}", key >> 3)))?;
        if field == 0 {
            return Err(decode_err("field number 0 is invalid"));
        }
        Ok((field, (key & 0x7) as u8))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.buf.len() {
            return Err(decode_err(format!(
                "record of {len} bytes overruns buffer ({} left)",
                self.buf.len()
            )));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.read_varint()?)
            .map_err(|_| decode_err("record length out of range"))?;
        self.take(len)
    }

    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|err| decode_err(format!("invalid utf-8: {err}")))
    }

    fn read_fixed32(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_fixed64(&mut self) -> Result<[u8; 8]> {
        let bytes = self.take(8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| decode_err(format!("value {value} exceeds u32")))
    }

    /// Reads a repeated uint32 field, packed or not, appending to `out`.
    fn read_repeated_u32(&mut self, wire: u8, out: &mut Vec<u32>) -> Result<()> {
        match wire {
            WIRE_LEN => {
                let mut packed = PbfReader::new(self.read_bytes()?);
                while packed.has_remaining() {
                    out.push(packed.read_u32()?);
                }
                Ok(())
            }
            WIRE_VARINT => {
                out.push(self.read_u32()?);
                Ok(())
            }
            other => Err(decode_err(format!(
                "unexpected wire type {other} for repeated uint32"
            ))),
        }
    }

    fn skip(&mut self, wire: u8) -> Result<()> {
        match wire {
            WIRE_VARINT => self.read_varint().map(|_| ()),
            WIRE_FIXED64 => self.take(8).map(|_| ()),
            WIRE_LEN => self.read_bytes().map(|_| ()),
            WIRE_FIXED32 => self.take(4).map(|_| ()),
            other => Err(decode_err(format!("unsupported wire type {other}"))),
        }
    }

    fn expect_wire(&self, field: u32, wire: u8, expected: u8) -> Result<()> {
        if wire == expected {
            Ok(())
        } else {
            Err(decode_err(format!(
                "field {field} has wire type {wire}, expected {expected}"
            )))
        }
    }
}

/// Splits a tile buffer into its layers, in wire order. An empty buffer is a
/// tile without layers.
pub fn decode_layers(buf: &[u8]) -> Result<Vec<RawLayer>> {
    let mut reader = PbfReader::new(buf);
    let mut layers = Vec::new();
    while reader.has_remaining() {
        let (field, wire) = reader.read_key()?;
        if field == TILE_LAYERS && wire == WIRE_LEN {
            let layer = decode_layer(reader.read_bytes()?)?;
            tracing::trace!(
                layer = %layer.name,
                features = layer.features.len(),
                "decoded layer"
            );
            layers.push(layer);
        } else {
            reader.skip(wire)?;
        }
    }
    tracing::debug!(layers = layers.len(), bytes = buf.len(), "decoded tile");
    Ok(layers)
}

fn decode_layer(buf: &[u8]) -> Result<RawLayer> {
    let mut reader = PbfReader::new(buf);
    let mut layer = RawLayer {
        version: DEFAULT_VERSION,
        name: String::new(),
        extent: DEFAULT_EXTENT,
        keys: Vec::new(),
        values: Vec::new(),
        features: Vec::new(),
    };
    while reader.has_remaining() {
        let (field, wire) = reader.read_key()?;
        match field {
            LAYER_VERSION => {
                reader.expect_wire(field, wire, WIRE_VARINT)?;
                layer.version = reader.read_u32()?;
            }
            LAYER_NAME => {
                reader.expect_wire(field, wire, WIRE_LEN)?;
                layer.name = reader.read_string()?;
            }
            LAYER_FEATURES => {
                reader.expect_wire(field, wire, WIRE_LEN)?;
                layer.features.push(decode_feature(reader.read_bytes()?)?);
            }
            LAYER_KEYS => {
                reader.expect_wire(field, wire, WIRE_LEN)?;
                layer.keys.push(reader.read_string()?);
            }
            LAYER_VALUES => {
                reader.expect_wire(field, wire, WIRE_LEN)?;
                layer.values.push(decode_value(reader.read_bytes()?)?);
            }
            LAYER_EXTENT => {
                reader.expect_wire(field, wire, WIRE_VARINT)?;
                layer.extent = reader.read_u32()?;
            }
            _ => reader.skip(wire)?,
        }
    }
    if layer.extent == 0 {
        return Err(decode_err(format!("layer {:?} has zero extent", layer.name)));
    }
    for feature in layer.features.iter() {
        check_tags(&layer, feature)?;
    }
    Ok(layer)
}

fn check_tags(layer: &RawLayer, feature: &RawFeature) -> Result<()> {
    if feature.tags.len() % 2 != 0 {
        return Err(decode_err(format!(
            "layer {:?}: odd number of feature tags ({})",
            layer.name,
            feature.tags.len()
        )));
    }
    for pair in feature.tags.chunks_exact(2) {
        if pair[0] as usize >= layer.keys.len() {
            return Err(decode_err(format!(
                "layer {:?}: key index {} out of range ({} keys)",
                layer.name,
                pair[0],
                layer.keys.len()
            )));
        }
        if pair[1] as usize >= layer.values.len() {
            return Err(decode_err(format!(
                "layer {:?}: value index {} out of range ({} values)",
                layer.name,
                pair[1],
                layer.values.len()
            )));
        }
    }
    Ok(())
}

fn decode_feature(buf: &[u8]) -> Result<RawFeature> {
    let mut reader = PbfReader::new(buf);
    let mut feature = RawFeature {
        id: None,
        geom_type: GeomType::Unknown,
        tags: Vec::new(),
        geometry: Vec::new(),
    };
    while reader.has_remaining() {
        let (field, wire) = reader.read_key()?;
        match field {
            FEATURE_ID => {
                reader.expect_wire(field, wire, WIRE_VARINT)?;
                feature.id = Some(reader.read_varint()?);
            }
            FEATURE_TAGS => reader.read_repeated_u32(wire, &mut feature.tags)?,
            FEATURE_TYPE => {
                reader.expect_wire(field, wire, WIRE_VARINT)?;
                feature.geom_type = GeomType::from_wire(reader.read_varint()?);
            }
            FEATURE_GEOMETRY => reader.read_repeated_u32(wire, &mut feature.geometry)?,
            _ => reader.skip(wire)?,
        }
    }
    Ok(feature)
}

fn decode_value(buf: &[u8]) -> Result<Value> {
    let mut reader = PbfReader::new(buf);
    let mut value = Value::Null;
    while reader.has_remaining() {
        let (field, wire) = reader.read_key()?;
        value = match (field, wire) {
            (1, WIRE_LEN) => Value::String(reader.read_string()?),
            (2, WIRE_FIXED32) => Value::Float(f32::from_le_bytes(reader.read_fixed32()?)),
            (3, WIRE_FIXED64) => Value::Double(f64::from_le_bytes(reader.read_fixed64()?)),
            (4, WIRE_VARINT) => Value::Int(reader.read_varint()? as i64),
            (5, WIRE_VARINT) => Value::UInt(reader.read_varint()?),
            (6, WIRE_VARINT) => Value::SInt(unzigzag(reader.read_varint()?)),
            (7, WIRE_VARINT) => Value::Bool(reader.read_varint()? != 0),
            (1..=7, _) => {
                return Err(decode_err(format!(
                    "value field {field} has unexpected wire type {wire}"
                )));
            }
            _ => {
                reader.skip(wire)?;
                continue;
            }
        };
    }
    Ok(value)
}

#[inline]
fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}
