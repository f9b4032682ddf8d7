pub mod binary;
pub mod features;

use serde_json::json;

use crate::error::Result;

pub use self::binary::*;
pub use self::features::*;

/// A feature leaving the collector, tagged with its tile-wide sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFeature {
    pub global_id: u64,
    pub feature: Feature,
}

/// Consumer of the collector's feature stream. Both output formats are sinks,
/// so decoding logic is shared and only assembly differs.
pub trait FeatureSink {
    type Output;

    fn push(&mut self, feature: DecodedFeature) -> Result<()>;

    fn finish(self) -> Result<Self::Output>;
}

/// One JSON document per line: a summary line followed by each feature.
pub fn ndjson_lines(features: &[Feature]) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::with_capacity(features.len() + 1);
    lines.push(serde_json::to_string(&json!({
        "type": "summary",
        "features": features.len(),
    }))?);
    for feature in features.iter() {
        lines.push(serde_json::to_string(&feature.to_json())?);
    }
    Ok(lines)
}
