//! Path finder
//!
//! [`PathFinder`] runs the per-pair searches against a frozen scene: the direct profile
//! and its mean plane, the over-roof and lateral diffraction paths when the line of sight
//! is blocked, and the reflection paths. [`PathFinder::run`] fans the receivers out over a
//! rayon pool and pushes every pair's paths into a [`PathSink`].

pub mod batch;
pub mod config;
pub mod error;

pub use batch::{BatchReport, PairResult, PathSink, ProgressToken};
pub use config::{ConfigError, PathFinderConfig};
pub use error::PathError;

use crate::core_types::{distance_2d, Coord2, Coordinate};
use crate::diffraction::{compute_hedge_diffraction, side_hull_points};
use crate::path::{GroundParameters, PathPoint, PointRole, PropagationPath};
use crate::profile::CutProfile;
use crate::reflection::MirrorReceiversCompute;
use crate::scene::ProfileBuilder;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Propagation path search over a frozen scene.
#[derive(Debug, Clone)]
pub struct PathFinder {
    scene: Arc<ProfileBuilder>,
    config: PathFinderConfig,
}

impl PathFinder {
    /// Fails when the scene is still being fed or the configuration is invalid.
    pub fn new(scene: Arc<ProfileBuilder>, config: PathFinderConfig) -> Result<Self, PathError> {
        scene.ensure_frozen("PathFinder::new")?;
        config.validate()?;
        Ok(PathFinder { scene, config })
    }

    pub fn scene(&self) -> &ProfileBuilder {
        &self.scene
    }

    pub fn config(&self) -> &PathFinderConfig {
        &self.config
    }

    /// Lateral path from `p1` to `p2`, see [`crate::diffraction::compute_side_hull`].
    pub fn compute_side_hull(&self, clockwise: bool, p1: &Coordinate, p2: &Coordinate) -> Vec<Coordinate> {
        crate::diffraction::compute_side_hull(clockwise, p1, p2, &self.scene)
    }

    /// Every path from `source` to `receiver`, direct or diffracted paths first and
    /// reflections last.
    ///
    /// A pair farther apart than `max_src_dist` has no path.
    pub fn compute_pair(&self, source: &Coordinate, receiver: &Coordinate) -> Result<Vec<PropagationPath>, PathError> {
        check_finite(receiver, "receiver")?;
        let mirrors = (self.config.reflection_order > 0).then(|| {
            MirrorReceiversCompute::new(
                &self.scene,
                *receiver,
                self.config.reflection_order,
                self.config.max_ref_dist,
            )
        });
        self.pair_paths(source, receiver, mirrors.as_ref())
    }

    fn pair_paths(
        &self,
        source: &Coordinate,
        receiver: &Coordinate,
        mirrors: Option<&MirrorReceiversCompute<'_>>,
    ) -> Result<Vec<PropagationPath>, PathError> {
        check_finite(source, "source")?;
        check_finite(receiver, "receiver")?;
        if distance_2d(source, receiver) > self.config.max_src_dist {
            return Ok(Vec::new());
        }

        let profile = self.scene.get_profile_with_gs(source, receiver, self.config.gs);
        let ground = ground_parameters(&profile);
        let mut paths = Vec::new();

        if profile.is_free_field() {
            let mut direct = PropagationPath::new(vec![
                PathPoint::new(*source, PointRole::Source),
                PathPoint::new(*receiver, PointRole::Receiver),
            ]);
            direct.ground = Some(ground);
            paths.push(direct);
        } else {
            if self.config.compute_horizontal_diffraction {
                let mut over = compute_hedge_diffraction(&profile);
                over.ground = Some(ground);
                paths.push(over);
            }
            if self.config.compute_vertical_diffraction {
                for clockwise in [true, false] {
                    let hull = side_hull_points(clockwise, source, receiver, &self.scene);
                    if hull.len() < 3 {
                        continue;
                    }
                    let last = hull.len() - 1;
                    let points = hull
                        .into_iter()
                        .enumerate()
                        .map(|(i, vertex)| {
                            let role = match i {
                                0 => PointRole::Source,
                                i if i == last => PointRole::Receiver,
                                _ => PointRole::VerticalDiffraction,
                            };
                            PathPoint::new(vertex.position, role).with_obstacle(vertex.building, vertex.wall)
                        })
                        .collect();
                    let mut lateral = PropagationPath::new(points);
                    lateral.ground = Some(ground);
                    paths.push(lateral);
                }
            }
        }

        if let Some(mirrors) = mirrors {
            paths.extend(mirrors.reflection_paths(source, self.config.max_src_dist).into_iter().map(|mut path| {
                path.ground = Some(ground);
                path
            }));
        }
        Ok(paths)
    }

    /// Compute every source-receiver pair and push the results into `sink`.
    ///
    /// Receivers are spread over `thread_count` workers. The token is polled between
    /// receivers; once cancelled, the remaining receivers are skipped. A failing pair is
    /// logged and counted, the others carry on.
    pub fn run(
        &self,
        sources: &[Coordinate],
        receivers: &[Coordinate],
        sink: &PathSink,
        token: &ProgressToken,
    ) -> Result<BatchReport, PathError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.thread_count)
            .thread_name(|i| format!("path-worker-{i}"))
            .build()
            .map_err(|e| PathError::ThreadPool(e.to_string()))?;

        info!(
            "Starting path search: {} sources, {} receivers, {} threads",
            sources.len(),
            receivers.len(),
            self.config.thread_count
        );
        let started = Instant::now();
        token.start(receivers.len());

        let report = pool.install(|| {
            receivers
                .par_iter()
                .enumerate()
                .map(|(receiver_id, receiver)| self.process_receiver(receiver_id, receiver, sources, sink, token))
                .reduce(BatchReport::default, BatchReport::merge)
        });

        info!(
            "Path search finished in {:.2?}: {} receivers, {} pairs, {} paths, {} failed{}",
            started.elapsed(),
            report.receivers,
            report.pairs,
            report.paths,
            report.failed_pairs,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }

    fn process_receiver(
        &self,
        receiver_id: usize,
        receiver: &Coordinate,
        sources: &[Coordinate],
        sink: &PathSink,
        token: &ProgressToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        if token.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        let mirrors = if self.config.reflection_order > 0 && receiver.iter().all(|c| c.is_finite()) {
            let built = catch_unwind(AssertUnwindSafe(|| {
                MirrorReceiversCompute::new(
                    &self.scene,
                    *receiver,
                    self.config.reflection_order,
                    self.config.max_ref_dist,
                )
            }));
            match built {
                Ok(mirrors) => Some(mirrors),
                Err(payload) => {
                    warn!("Image receivers of receiver {receiver_id} failed: {}", panic_message(payload.as_ref()));
                    None
                }
            }
        } else {
            None
        };
        debug!(
            "Receiver {receiver_id}: {} image receivers",
            mirrors.as_ref().map_or(0, |m| m.arena().len())
        );

        for (source_id, source) in sources.iter().enumerate() {
            if distance_2d(source, receiver) > self.config.max_src_dist {
                continue;
            }
            report.pairs += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| self.pair_paths(source, receiver, mirrors.as_ref())))
                .unwrap_or_else(|payload| {
                    Err(PathError::WorkerPanic {
                        source_id,
                        receiver_id,
                        message: panic_message(payload.as_ref()),
                    })
                });
            match outcome {
                Ok(mut paths) if !paths.is_empty() => {
                    for path in &mut paths {
                        path.source_id = source_id;
                        path.receiver_id = receiver_id;
                    }
                    let count = paths.len();
                    if sink.push(PairResult { source_id, receiver_id, paths }) {
                        report.paths += count;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Pair source {source_id} / receiver {receiver_id} failed: {e}");
                    report.failed_pairs += 1;
                }
            }
        }

        report.receivers = 1;
        token.step();
        report
    }
}

/// Mean plane of the direct profile and the endpoint heights above it.
pub fn ground_parameters(profile: &CutProfile) -> GroundParameters {
    let mean_plane = profile.mean_plane();
    let source = Coord2::new(0.0, profile.start().z);
    let receiver = Coord2::new(profile.length(), profile.end().z);
    GroundParameters {
        mean_plane,
        source_height: mean_plane.height_above(&source),
        receiver_height: mean_plane.height_above(&receiver),
        projected_distance: mean_plane.projected_distance(&source, &receiver),
        mean_ground_coefficient: profile.mean_ground_coefficient(),
    }
}

fn check_finite(point: &Coordinate, role: &'static str) -> Result<(), PathError> {
    if point.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(PathError::NonFiniteCoordinate { role })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
