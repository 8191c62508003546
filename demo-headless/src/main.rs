use clap::Parser;
use geo::{LineString, Polygon};
use noise_path_core::{
    Coordinate, LineSourceRecord, PathFinder, PathFinderConfig, PathSink, PointRole, ProfileBuilder, ProgressToken,
};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Propagation path search over a synthetic city block grid
#[derive(Parser, Debug)]
#[command(name = "noise-path-demo")]
#[command(about = "Noise propagation path search demo", long_about = None)]
struct Args {
    /// Number of blocks along each side of the grid
    #[arg(short, long, default_value_t = 6)]
    blocks: u32,

    /// Block footprint size in meters
    #[arg(long, default_value_t = 30.0)]
    block_size: f64,

    /// Street width in meters
    #[arg(long, default_value_t = 15.0)]
    street_width: f64,

    /// Building height in meters
    #[arg(long, default_value_t = 12.0)]
    height: f64,

    /// Maximum distance between road source points in meters
    #[arg(long, default_value_t = 10.0)]
    source_spacing: f64,

    /// Number of road lanes
    #[arg(long, default_value_t = 2)]
    lanes: usize,

    /// Receiver spacing along the facades in meters
    #[arg(long, default_value_t = 20.0)]
    receiver_spacing: f64,

    /// Maximum reflection order
    #[arg(short, long, default_value_t = 1)]
    reflection_order: usize,

    /// Maximum source-receiver distance in meters
    #[arg(long, default_value_t = 200.0)]
    max_distance: f64,

    /// Ground absorption outside the park (0 hard, 1 soft)
    #[arg(long, default_value_t = 0.0)]
    gs: f64,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    println!("=== Noise Propagation Path Demo ===\n");

    let pitch = args.block_size + args.street_width;
    let extent = f64::from(args.blocks) * pitch;
    let mut scene = ProfileBuilder::new();

    // Blocks on a regular grid, one of them replaced by a soft park
    let park = (args.blocks / 2, args.blocks / 2);
    for row in 0..args.blocks {
        for col in 0..args.blocks {
            let x = f64::from(col) * pitch + args.street_width;
            let y = f64::from(row) * pitch + args.street_width;
            let footprint = Polygon::new(
                LineString::from(vec![
                    (x, y),
                    (x + args.block_size, y),
                    (x + args.block_size, y + args.block_size),
                    (x, y + args.block_size),
                ]),
                Vec::new(),
            );
            let fed = if (row, col) == park {
                scene.add_ground_effect(&footprint, 1.0).map(|_| ())
            } else {
                scene
                    .add_building(&footprint, args.height, Some(i64::from(row * args.blocks + col)))
                    .map(|_| ())
            };
            if let Err(e) = fed {
                eprintln!("Failed to feed block ({row}, {col}): {e}");
                return;
            }
        }
    }

    // Gentle slope rising to the north
    let side = extent + args.street_width;
    for (x, y) in [(0.0, 0.0), (side, 0.0), (0.0, side), (side, side)] {
        if let Err(e) = scene.add_topographic_point(Coordinate::new(x, y, 0.01 * y)) {
            eprintln!("Failed to add terrain: {e}");
            return;
        }
    }
    if let Err(e) = scene.set_default_ground_coefficient(args.gs) {
        eprintln!("Failed to set ground coefficient: {e}");
        return;
    }
    if let Err(e) = scene.finish_feeding() {
        eprintln!("Failed to freeze scene: {e}");
        return;
    }
    println!(
        "Scene: {} buildings, {} walls, {} ground zones ({} skipped)",
        scene.buildings().len(),
        scene.walls().len(),
        scene.ground_zones().len(),
        scene.warnings().len()
    );

    // Road along the first horizontal street
    let road_y = args.street_width / 2.0;
    let road = LineSourceRecord::new(
        80.0,
        vec![Coordinate::new(0.0, road_y, 0.05), Coordinate::new(side, road_y, 0.05)],
    );
    let lane_spacing = args.street_width / (args.lanes.max(1) as f64 + 1.0);
    let mut sources = Vec::new();
    let mut segment_length = 0.0;
    for lane in road.parallel_tracks(args.lanes, lane_spacing) {
        let split = noise_path_core::split_line_into_points(&lane, args.source_spacing);
        segment_length = split.segment_length;
        sources.extend(split.points);
    }
    println!(
        "Road: {:.0} dB source, {} lanes, {} points ({:.2} m segments)",
        road.emission,
        args.lanes,
        sources.len(),
        segment_length
    );

    // Receivers 2 m in front of the southern facade of the second block row, at 4 m
    let facade_y = pitch + args.street_width - 2.0;
    let count = (extent / args.receiver_spacing).floor() as usize;
    let receivers: Vec<Coordinate> = (0..count)
        .map(|i| Coordinate::new((i as f64 + 0.5) * args.receiver_spacing, facade_y, 0.01 * facade_y + 4.0))
        .collect();
    println!("Receivers: {}\n", receivers.len());

    let mut config = PathFinderConfig {
        reflection_order: args.reflection_order,
        max_src_dist: args.max_distance,
        gs: args.gs,
        ..PathFinderConfig::default()
    };
    if args.threads > 0 {
        config.thread_count = args.threads;
    }
    let finder = match PathFinder::new(Arc::new(scene), config) {
        Ok(finder) => finder,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };

    let (sink, results) = PathSink::unbounded();
    let token = ProgressToken::new();
    let started = Instant::now();
    let report = match finder.run(&sources, &receivers, &sink, &token) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Path search failed: {e}");
            return;
        }
    };
    drop(sink);

    let mut direct = 0;
    let mut over_roof = 0;
    let mut lateral = 0;
    let mut reflected = 0;
    let mut longest: f64 = 0.0;
    for result in results.iter() {
        for path in &result.paths {
            longest = longest.max(path.length());
            if path.reflection_count() > 0 {
                reflected += 1;
            } else if path.has_role(PointRole::HorizontalDiffraction) {
                over_roof += 1;
            } else if path.has_role(PointRole::VerticalDiffraction) {
                lateral += 1;
            } else {
                direct += 1;
            }
        }
    }

    println!("=== Results ===");
    println!("Elapsed: {:.2?}", started.elapsed());
    println!("Pairs: {} ({} failed)", report.pairs, report.failed_pairs);
    println!("Paths: {}", report.paths);
    println!("  direct:      {direct}");
    println!("  over roofs:  {over_roof}");
    println!("  lateral:     {lateral}");
    println!("  reflected:   {reflected}");
    println!("Longest path: {longest:.1} m");
}
