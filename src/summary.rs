use std::collections::HashSet;

use serde::Serialize;

use crate::error::Result;
use crate::wire::decode_layers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub version: u32,
    pub extent: u32,
    pub feature_count: usize,
    pub property_key_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileSummary {
    pub total_features: usize,
    pub layers: Vec<LayerSummary>,
}

/// Per-layer counts without reconstructing any geometry.
pub fn summarize_layers(buf: &[u8], layer_filter: Option<&str>) -> Result<TileSummary> {
    let layers = decode_layers(buf)?;
    let mut total_features = 0usize;
    let mut summaries = Vec::new();
    for layer in layers {
        if let Some(filter) = layer_filter {
            if layer.name != filter {
                continue;
            }
        }
        let property_key_count = {
            let mut keys = HashSet::new();
            for feature in layer.features.iter() {
                for (key, _) in layer.properties(feature) {
                    keys.insert(key);
                }
            }
            keys.len()
        };
        let feature_count = layer.features.len();
        total_features += feature_count;
        summaries.push(LayerSummary {
            name: layer.name,
            version: layer.version,
            extent: layer.extent,
            feature_count,
            property_key_count,
        });
    }
    Ok(TileSummary {
        total_features,
        layers: summaries,
    })
}
