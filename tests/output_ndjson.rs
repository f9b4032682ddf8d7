mod common;

use serde_json::{Value, json};

use mvt_loader::output::ndjson_lines;
use mvt_loader::{DecodeOptions, decode_features};

use common::multi_layer_tile;

#[test]
fn ndjson_starts_with_summary_then_one_feature_per_line() {
    let features = decode_features(&multi_layer_tile(), &DecodeOptions::default()).expect("decode");
    let lines = ndjson_lines(&features).expect("ndjson");
    assert_eq!(lines.len(), 6);
    assert!(lines.iter().all(|line| !line.contains('\n')));

    let summary: Value = serde_json::from_str(&lines[0]).expect("summary json");
    assert_eq!(summary, json!({ "type": "summary", "features": 5 }));

    let line: Value = serde_json::from_str(&lines[3]).expect("feature json");
    assert_eq!(line["type"], json!("Feature"));
    assert_eq!(line["id"], json!(11));
    assert_eq!(line["geometry"]["type"], json!("LineString"));
    assert_eq!(line["properties"]["class"], json!("primary"));
    assert_eq!(line["properties"]["layerName"], json!("layer1"));
}

#[test]
fn ndjson_for_empty_tile_has_only_summary() {
    let lines = ndjson_lines(&[]).expect("ndjson");
    assert_eq!(lines, vec![r#"{"type":"summary","features":0}"#.to_string()]);
}
