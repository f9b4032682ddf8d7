use serde::Serialize;

use crate::collector::FeatureCollector;
use crate::error::Result;
use crate::options::{DecodeOptions, OutputFormat};
use crate::output::{BinaryBuilder, BinaryFeatureCollection, Feature, FeatureCollectionBuilder, FeatureSink};
use crate::wire::decode_layers;

/// Result of [`decode`], shaped by [`DecodeOptions::output_format`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedTile {
    Features(Vec<Feature>),
    Binary(BinaryFeatureCollection),
}

impl DecodedTile {
    pub fn into_features(self) -> Option<Vec<Feature>> {
        match self {
            DecodedTile::Features(features) => Some(features),
            DecodedTile::Binary(_) => None,
        }
    }

    pub fn into_binary(self) -> Option<BinaryFeatureCollection> {
        match self {
            DecodedTile::Binary(binary) => Some(binary),
            DecodedTile::Features(_) => None,
        }
    }
}

pub fn decode(buf: &[u8], options: &DecodeOptions) -> Result<DecodedTile> {
    match options.output_format {
        OutputFormat::Features => decode_features(buf, options).map(DecodedTile::Features),
        OutputFormat::Binary => decode_binary(buf, options).map(DecodedTile::Binary),
    }
}

pub fn decode_features(buf: &[u8], options: &DecodeOptions) -> Result<Vec<Feature>> {
    decode_into(buf, options, FeatureCollectionBuilder::new())
}

pub fn decode_binary(buf: &[u8], options: &DecodeOptions) -> Result<BinaryFeatureCollection> {
    decode_into(buf, options, BinaryBuilder::new())
}

/// Decodes `buf` into any sink. Options are validated before the buffer is
/// touched, and nothing is returned unless every layer decodes.
pub fn decode_into<S: FeatureSink>(buf: &[u8], options: &DecodeOptions, mut sink: S) -> Result<S::Output> {
    options.validate()?;
    let layers = decode_layers(buf)?;
    let mut collector = FeatureCollector::new(options);
    for layer in layers.iter() {
        collector.collect_layer(layer, &mut sink)?;
    }
    tracing::debug!(
        layers = layers.len(),
        features = collector.emitted(),
        "collected features"
    );
    sink.finish()
}
