//! Lateral paths around building corners
//!
//! The side hull is the shortest path from `p1` to `p2` that hugs the silhouettes of the
//! obstacles standing above the propagation plane. It is grown as the convex hull of
//! `{p1, p2}` plus the corners of every obstacle a hull edge runs through, until no hull
//! edge is obstructed. The two halves of the final hull are the two lateral paths.

use super::convex_hull::convex_hull;
use crate::core_types::{coord_bits, lerp, segment_intersection, xy, Coord2, Coordinate, Vec2, GEOMETRY_EPSILON};
use crate::scene::index::segment_envelope;
use crate::scene::{ProfileBuilder, WIDE_ANGLE_TRANSLATION_EPSILON};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Hull growth rounds before the search gives up.
pub const MAX_HULL_ITERATIONS: usize = 100;

/// Hull perimeter over direct distance above which the lateral paths are dropped.
pub const MAX_RATIO_HULL_DIRECT_PATH: f64 = 4.0;

/// Vertex of a side hull with the obstacle it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct HullPoint {
    pub position: Coordinate,
    pub building: Option<usize>,
    pub wall: Option<usize>,
}

/// Plane through `p1` and `p2` that is horizontal across the path.
#[derive(Debug, Clone, Copy)]
struct CutPlane {
    origin: Coordinate,
    direction: Vec2,
    length: f64,
    rise: f64,
}

impl CutPlane {
    fn new(p1: &Coordinate, p2: &Coordinate) -> Self {
        let delta = xy(p2) - xy(p1);
        let length = delta.norm();
        CutPlane {
            origin: *p1,
            direction: delta / length,
            length,
            rise: p2.z - p1.z,
        }
    }

    fn z_at(&self, q: &Coord2) -> f64 {
        let along = (q - xy(&self.origin)).dot(&self.direction);
        self.origin.z + self.rise * along / self.length
    }
}

type EdgeKey = ([u64; 2], [u64; 2]);

/// Lateral path from `p1` to `p2`.
///
/// `clockwise == true` passes on the left of `p1 -> p2` seen from above. Intermediate
/// vertices take their elevation from the plane through `p1` and `p2`. The result is empty
/// when the endpoints coincide, when an endpoint is enclosed by obstacles, when the plane
/// runs under the ground at a corner, or when the search does not converge.
pub fn compute_side_hull(clockwise: bool, p1: &Coordinate, p2: &Coordinate, scene: &ProfileBuilder) -> Vec<Coordinate> {
    side_hull_points(clockwise, p1, p2, scene)
        .into_iter()
        .map(|point| point.position)
        .collect()
}

/// [`compute_side_hull`] keeping track of the obstacle behind every vertex.
pub fn side_hull_points(clockwise: bool, p1: &Coordinate, p2: &Coordinate, scene: &ProfileBuilder) -> Vec<HullPoint> {
    if (xy(p2) - xy(p1)).norm() < GEOMETRY_EPSILON {
        return Vec::new();
    }
    let plane = CutPlane::new(p1, p2);
    let mut points = vec![
        HullPoint { position: *p1, building: None, wall: None },
        HullPoint { position: *p2, building: None, wall: None },
    ];
    let mut buildings_in_hull: FxHashSet<usize> = FxHashSet::default();
    let mut walls_in_hull: FxHashSet<usize> = FxHashSet::default();
    let mut free_edges: FxHashSet<EdgeKey> = FxHashSet::default();

    for iteration in 0..MAX_HULL_ITERATIONS {
        let planar: Vec<Coord2> = points.iter().map(|p| xy(&p.position)).collect();
        let hull = convex_hull(&planar);
        let (Some(start), Some(end)) = (hull.iter().position(|&i| i == 0), hull.iter().position(|&i| i == 1)) else {
            trace!("Side hull endpoint enclosed after {iteration} iterations");
            return Vec::new();
        };

        let perimeter: f64 = (0..hull.len())
            .map(|k| (planar[hull[(k + 1) % hull.len()]] - planar[hull[k]]).norm())
            .sum();
        if perimeter / plane.length > MAX_RATIO_HULL_DIRECT_PATH {
            return Vec::new();
        }

        let mut grown = false;
        for k in 0..hull.len() {
            let (u, v) = (planar[hull[k]], planar[hull[(k + 1) % hull.len()]]);
            let key = (coord_bits(&u), coord_bits(&v));
            if free_edges.contains(&key) {
                continue;
            }
            let before = points.len();
            if !grow_with_obstacles(&u, &v, &plane, scene, &mut points, &mut buildings_in_hull, &mut walls_in_hull) {
                return Vec::new();
            }
            if points.len() == before {
                free_edges.insert(key);
            } else {
                grown = true;
            }
        }

        if !grown {
            let n = hull.len();
            let mut walk = Vec::with_capacity(n);
            let mut k = start;
            loop {
                walk.push(points[hull[k]].clone());
                if k == end {
                    break;
                }
                k = if clockwise { (k + n - 1) % n } else { (k + 1) % n };
            }
            return walk;
        }
    }
    trace!("Side hull did not converge in {MAX_HULL_ITERATIONS} iterations");
    Vec::new()
}

/// Append the corners of every new obstacle crossed by hull edge `u-v` and standing
/// above the plane. Returns `false` when a corner falls under the ground.
fn grow_with_obstacles(
    u: &Coord2,
    v: &Coord2,
    plane: &CutPlane,
    scene: &ProfileBuilder,
    points: &mut Vec<HullPoint>,
    buildings_in_hull: &mut FxHashSet<usize>,
    walls_in_hull: &mut FxHashSet<usize>,
) -> bool {
    let (min, max) = segment_envelope([u.x, u.y], [v.x, v.y], GEOMETRY_EPSILON);
    let (window_min, window_max) = ProfileBuilder::default_wide_angle_window();

    for index in scene.buildings_in_envelope(min, max) {
        if buildings_in_hull.contains(&index) || scene.buildings()[index].interior_spans(u, v).is_empty() {
            continue;
        }
        let mut corners = scene.wide_angle_points(index, window_min, window_max);
        corners.pop();
        let cut = roof_above_plane(&corners, plane);
        if cut.is_empty() {
            continue;
        }
        buildings_in_hull.insert(index);
        for corner in cut {
            let z = plane.z_at(&corner);
            if z < scene.ground_z(&corner) {
                return false;
            }
            points.push(HullPoint {
                position: Coordinate::new(corner.x, corner.y, z),
                building: Some(index),
                wall: None,
            });
        }
    }

    for index in scene.walls_in_envelope(min, max) {
        let wall = &scene.walls()[index];
        if wall.building().is_some() || walls_in_hull.contains(&index) {
            continue;
        }
        let Some(hit) = segment_intersection(u, v, &wall.a(), &wall.b()) else {
            continue;
        };
        if wall.top_at(hit.u) <= plane.z_at(&hit.point) {
            continue;
        }
        walls_in_hull.insert(index);
        let along = (wall.b() - wall.a()) / wall.length() * WIDE_ANGLE_TRANSLATION_EPSILON;
        for end in [wall.a() - along, wall.b() + along] {
            let z = plane.z_at(&end);
            if z < scene.ground_z(&end) {
                return false;
            }
            points.push(HullPoint {
                position: Coordinate::new(end.x, end.y, z),
                building: None,
                wall: Some(index),
            });
        }
    }
    true
}

/// Part of the roof outline that lies on or above the plane, in ring order.
///
/// Corners under the plane are dropped and replaced by the points where the outline
/// crosses the plane.
fn roof_above_plane(corners: &[Coordinate], plane: &CutPlane) -> Vec<Coord2> {
    let n = corners.len();
    if n == 0 {
        return Vec::new();
    }
    let mut cut = Vec::with_capacity(n);
    let mut last: Option<f64> = None;
    for k in 0..=n {
        let corner = &corners[k % n];
        let offset = corner.z - plane.z_at(&xy(corner));
        if let Some(previous) = last {
            if (offset >= 0.0) != (previous >= 0.0) {
                let from = xy(&corners[k - 1]);
                let t = previous / (previous - offset);
                let to = xy(corner);
                cut.push(Coord2::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t)));
            }
        }
        if offset >= 0.0 && k < n {
            cut.push(xy(corner));
        }
        last = Some(offset);
    }
    cut
}
