mod common;

use mvt_loader::{LayerSummary, summarize_layers};

use common::*;

#[test]
fn summarize_all_layers() {
    let summary = summarize_layers(&multi_layer_tile(), None).expect("summary");
    assert_eq!(summary.total_features, 5);
    let names: Vec<&str> = summary.layers.iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names, vec!["layer0", "layer1", "layer2"]);
    assert_eq!(
        summary.layers[1],
        LayerSummary {
            name: "layer1".to_string(),
            version: 2,
            extent: 4096,
            feature_count: 2,
            property_key_count: 1,
        }
    );
}

#[test]
fn summarize_single_layer() {
    let summary = summarize_layers(&point_tile(), Some("layer0")).expect("summary");
    assert_eq!(summary.total_features, 1);
    assert_eq!(summary.layers.len(), 1);
    assert_eq!(summary.layers[0].property_key_count, 2);

    let summary = summarize_layers(&point_tile(), Some("missing")).expect("summary");
    assert_eq!(summary.total_features, 0);
    assert!(summary.layers.is_empty());
}

#[test]
fn summary_counts_unknown_features() {
    let unknown = raw_feature(None, 0, &[], &[]);
    let point = raw_feature(None, 1, &[], &[command(1, 1), zz(1), zz(1)]);
    let tile = raw_tile(&[raw_layer("raw", &[unknown, point], &[], &[])]);
    let summary = summarize_layers(&tile, None).expect("summary");
    assert_eq!(summary.total_features, 2);
}

#[test]
fn summary_of_broken_tile_is_a_decode_error() {
    let err = summarize_layers(&[0x1a, 0x05, 0x0a], None).expect_err("broken");
    assert!(err.is_decode());
}
