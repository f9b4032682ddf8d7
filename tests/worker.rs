mod common;

use mvt_loader::{
    Coordinates, DecodeOptions, DecodeWorker, DecodedTile, MvtError, OutputFormat, decode,
    decode_batch,
};

use common::*;

#[test]
fn worker_decodes_like_the_synchronous_path() {
    let worker = DecodeWorker::spawn(2).expect("spawn");
    let options = DecodeOptions::default().with_output_format(OutputFormat::Binary);
    let data = multi_layer_tile();

    let expected = decode(&data, &options).expect("decode");
    let result = worker.decode(data, options).expect("worker decode");
    assert_eq!(result, expected);
}

#[test]
fn worker_handles_queued_jobs() {
    let worker = DecodeWorker::spawn(3).expect("spawn");
    let tiles = [point_tile(), line_tile(), polygon_tile(), multi_layer_tile()];
    let replies: Vec<_> = tiles
        .iter()
        .map(|data| worker.submit(data.clone(), DecodeOptions::default()))
        .collect();

    let counts: Vec<usize> = replies
        .into_iter()
        .map(|reply| {
            reply
                .recv()
                .expect("reply")
                .expect("decode")
                .into_features()
                .expect("features")
                .len()
        })
        .collect();
    assert_eq!(counts, vec![1, 1, 1, 5]);
}

#[test]
fn dropping_the_worker_finishes_queued_jobs() {
    let worker = DecodeWorker::spawn(1).expect("spawn");
    let replies: Vec<_> = (0..8)
        .map(|_| worker.submit(multi_layer_tile(), DecodeOptions::default()))
        .collect();
    drop(worker);

    for reply in replies {
        let features = reply
            .recv()
            .expect("reply after shutdown")
            .expect("decode")
            .into_features()
            .expect("features");
        assert_eq!(features.len(), 5);
    }
}

#[test]
fn worker_reports_decode_errors() {
    let worker = DecodeWorker::spawn(1).expect("spawn");
    let options = DecodeOptions::default().with_coordinates(Coordinates::Geographic);
    let err = worker.decode(point_tile(), options).expect_err("configuration");
    let err = err.downcast_ref::<MvtError>().expect("decoder error");
    assert!(err.is_configuration());
}

#[test]
fn batch_preserves_input_order() {
    let tiles = vec![
        multi_layer_tile(),
        vec![0x1a, 0x05, 0x0a],
        point_tile(),
        Vec::new(),
    ];
    let results = decode_batch(&tiles, &DecodeOptions::default());
    assert_eq!(results.len(), 4);

    let count = |result: &mvt_loader::Result<DecodedTile>| match result {
        Ok(DecodedTile::Features(features)) => Some(features.len()),
        _ => None,
    };
    assert_eq!(count(&results[0]), Some(5));
    assert!(results[1].as_ref().is_err_and(MvtError::is_decode));
    assert_eq!(count(&results[2]), Some(1));
    assert_eq!(count(&results[3]), Some(0));
}
