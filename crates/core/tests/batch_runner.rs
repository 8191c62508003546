//! Batch path search over several sources and receivers
use geo::polygon;
use noise_path_core::{
    Coordinate, PairResult, PathFinder, PathFinderConfig, PathSink, PointRole, ProfileBuilder, ProgressToken,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn district() -> Arc<ProfileBuilder> {
    init_tracing();
    let mut scene = ProfileBuilder::new();
    scene
        .add_building(&polygon![(x: 40.0, y: -5.0), (x: 60.0, y: -5.0), (x: 60.0, y: 5.0), (x: 40.0, y: 5.0)], 12.0, None)
        .expect("feeding");
    scene
        .add_building(&polygon![(x: 40.0, y: 20.0), (x: 60.0, y: 20.0), (x: 60.0, y: 30.0), (x: 40.0, y: 30.0)], 9.0, None)
        .expect("feeding");
    scene
        .add_ground_effect(&polygon![(x: -20.0, y: -50.0), (x: 30.0, y: -50.0), (x: 30.0, y: 50.0), (x: -20.0, y: 50.0)], 1.0)
        .expect("feeding");
    scene.finish_feeding().expect("freeze");
    Arc::new(scene)
}

fn sources() -> Vec<Coordinate> {
    vec![Coordinate::new(0.0, 0.0, 0.5), Coordinate::new(0.0, 12.0, 0.5), Coordinate::new(5.0, 40.0, 0.5)]
}

fn receivers() -> Vec<Coordinate> {
    vec![Coordinate::new(100.0, 0.0, 4.0), Coordinate::new(100.0, 12.0, 4.0), Coordinate::new(2000.0, 0.0, 4.0)]
}

fn collect(finder: &PathFinder, sources: &[Coordinate], receivers: &[Coordinate]) -> Vec<PairResult> {
    let (sink, results) = PathSink::unbounded();
    let token = ProgressToken::new();
    let report = finder.run(sources, receivers, &sink, &token).expect("batch");
    drop(sink);
    let mut results: Vec<PairResult> = results.iter().collect();
    results.sort_by_key(|r| (r.source_id, r.receiver_id));
    assert_eq!(report.paths, results.iter().map(|r| r.paths.len()).sum::<usize>());
    results
}

#[test]
fn test_batch_matches_single_pairs() {
    let config = PathFinderConfig { thread_count: 3, ..PathFinderConfig::default() };
    let finder = PathFinder::new(district(), config).expect("finder");
    let results = collect(&finder, &sources(), &receivers());

    // The far receiver is out of range of every source
    assert!(results.iter().all(|r| r.receiver_id != 2));
    for result in &results {
        let expected = finder
            .compute_pair(&sources()[result.source_id], &receivers()[result.receiver_id])
            .expect("pair");
        assert_eq!(result.paths.len(), expected.len());
        for (got, want) in result.paths.iter().zip(&expected) {
            assert_eq!(got.points, want.points);
            assert_eq!(got.source_id, result.source_id);
            assert_eq!(got.receiver_id, result.receiver_id);
        }
    }

    // Blocked pair: over-roof path and both lateral paths
    let blocked = results
        .iter()
        .find(|r| r.source_id == 0 && r.receiver_id == 0)
        .expect("blocked pair result");
    assert!(blocked.paths[0].has_role(PointRole::HorizontalDiffraction));
    assert_eq!(
        blocked.paths.iter().filter(|p| p.has_role(PointRole::VerticalDiffraction)).count(),
        2
    );
}

#[test]
fn test_batch_is_deterministic_across_thread_counts() {
    let one = PathFinder::new(district(), PathFinderConfig { thread_count: 1, ..PathFinderConfig::default() })
        .expect("finder");
    let four = PathFinder::new(district(), PathFinderConfig { thread_count: 4, ..PathFinderConfig::default() })
        .expect("finder");
    assert_eq!(collect(&one, &sources(), &receivers()), collect(&four, &sources(), &receivers()));
}

#[test]
fn test_cancelled_batch_skips_receivers() {
    let finder = PathFinder::new(district(), PathFinderConfig::default()).expect("finder");
    let (sink, results) = PathSink::unbounded();
    let token = ProgressToken::new();
    token.cancel();
    let report = finder.run(&sources(), &receivers(), &sink, &token).expect("batch");
    assert!(report.cancelled);
    assert_eq!(report.receivers, 0);
    assert_eq!(report.pairs, 0);
    assert!(results.try_recv().is_err());
    assert_eq!(token.processed(), 0);
}

#[test]
fn test_failing_pairs_are_counted_and_isolated() {
    let finder = PathFinder::new(district(), PathFinderConfig::default()).expect("finder");
    let mut sources = sources();
    sources.push(Coordinate::new(f64::NAN, 0.0, 0.5));
    let (sink, results) = PathSink::unbounded();
    let token = ProgressToken::new();
    let report = finder.run(&sources, &receivers(), &sink, &token).expect("batch");
    drop(sink);

    // The broken source fails once per receiver, the others still produce paths
    assert_eq!(report.failed_pairs, receivers().len());
    assert_eq!(report.receivers, receivers().len());
    assert_eq!(token.processed(), receivers().len());
    assert!((token.fraction() - 1.0).abs() < 1e-12);
    let results: Vec<PairResult> = results.iter().collect();
    assert!(results.iter().all(|r| r.source_id != 3));
    assert!(results.iter().any(|r| r.source_id == 0 && r.receiver_id == 0));
}

#[test]
fn test_direct_path_carries_ground_parameters() {
    let finder = PathFinder::new(district(), PathFinderConfig::direct_only()).expect("finder");
    let paths = finder
        .compute_pair(&Coordinate::new(0.0, 12.0, 0.5), &Coordinate::new(100.0, 12.0, 4.0))
        .expect("pair");
    assert_eq!(paths.len(), 1);
    let ground = paths[0].ground.expect("ground parameters");
    // Soft ground under the first 30 m of 100 m
    assert!((ground.mean_ground_coefficient - 0.3).abs() < 1e-9);
    assert!((ground.source_height - 0.5).abs() < 1e-9);
}

#[test]
fn test_pair_results_survive_json() {
    let config = PathFinderConfig { thread_count: 2, ..PathFinderConfig::default() };
    let finder = PathFinder::new(district(), config).expect("finder");
    let results = collect(&finder, &sources(), &receivers());
    let blocked = results
        .iter()
        .find(|r| r.source_id == 0 && r.receiver_id == 0)
        .expect("blocked pair result");

    let json = serde_json::to_string(blocked).expect("serialize");
    let restored: PairResult = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(&restored, blocked);
    assert!(restored.paths.iter().all(|p| p.ground.is_some()));
}

#[test]
fn test_paths_dropped_by_a_closed_sink_are_not_counted() {
    let finder = PathFinder::new(district(), PathFinderConfig::default()).expect("finder");
    let (sink, results) = PathSink::unbounded();
    drop(results);
    let token = ProgressToken::new();
    let report = finder.run(&sources(), &receivers(), &sink, &token).expect("batch");
    assert!(report.pairs > 0);
    assert_eq!(report.failed_pairs, 0);
    assert_eq!(report.paths, 0);
}
