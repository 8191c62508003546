//! Image receiver enumeration and reflection path unfolding

use super::mirror::{ChainKey, IntersectionKind, MirrorArena, MirrorReceiver};
use crate::core_types::{
    mirror_across_line, orientation, segment_intersection, xy, Coord2, Coordinate, GEOMETRY_EPSILON,
};
use crate::path::{PathPoint, PointRole, PropagationPath};
use crate::scene::{ProfileBuilder, Wall};
use geo::{Intersects, Line, LineString, Polygon};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Region that can see an image receiver through its wall.
///
/// The wedge from the image through both wall ends, on the far side of the wall. Walls are
/// searched in the wedge truncated `reach` meters beyond the wall.
#[derive(Debug, Clone)]
struct VisibilityCone {
    apex: Coord2,
    a: Coord2,
    b: Coord2,
    truncated: Polygon<f64>,
}

impl VisibilityCone {
    fn new(apex: Coord2, a: Coord2, b: Coord2, reach: f64) -> Self {
        let far = |p: Coord2| {
            let direction = p - apex;
            let norm = direction.norm();
            if norm < GEOMETRY_EPSILON {
                p
            } else {
                p + direction / norm * reach
            }
        };
        let (far_a, far_b) = (far(a), far(b));
        let ring: LineString<f64> = vec![(a.x, a.y), (b.x, b.y), (far_b.x, far_b.y), (far_a.x, far_a.y)].into();
        VisibilityCone {
            apex,
            a,
            b,
            truncated: Polygon::new(ring, Vec::new()),
        }
    }

    /// Unbounded containment test
    fn contains(&self, p: &Coord2) -> bool {
        let apex_side = orientation(&self.a, &self.b, &self.apex);
        let point_side = orientation(&self.a, &self.b, p);
        if apex_side * point_side >= 0.0 {
            return false;
        }
        orientation(&self.apex, &self.a, p) * orientation(&self.apex, &self.b, p) <= 0.0
    }

    fn envelope(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for c in self.truncated.exterior().coords() {
            min[0] = min[0].min(c.x);
            min[1] = min[1].min(c.y);
            max[0] = max[0].max(c.x);
            max[1] = max[1].max(c.y);
        }
        (min, max)
    }

    fn reaches(&self, wall: &Wall) -> bool {
        let (a, b) = (wall.a(), wall.b());
        self.truncated.intersects(&Line::new((a.x, a.y), (b.x, b.y)))
    }
}

/// Image receivers of one receiver, up to `max_order` reflections.
///
/// Built once per receiver and queried for every source.
#[derive(Debug)]
pub struct MirrorReceiversCompute<'a> {
    scene: &'a ProfileBuilder,
    receiver: Coordinate,
    max_order: usize,
    max_ref_dist: f64,
    arena: MirrorArena,
    cones: Vec<VisibilityCone>,
}

impl<'a> MirrorReceiversCompute<'a> {
    /// Enumerate the image receivers of `receiver`.
    ///
    /// First order images come from every wall within `max_ref_dist` whose reflecting side
    /// faces the receiver. Higher orders mirror each image across the walls reached by its
    /// visibility cone, never reusing a wall within a chain.
    pub fn new(scene: &'a ProfileBuilder, receiver: Coordinate, max_order: usize, max_ref_dist: f64) -> Self {
        let mut compute = MirrorReceiversCompute {
            scene,
            receiver,
            max_order,
            max_ref_dist,
            arena: MirrorArena::new(),
            cones: Vec::new(),
        };
        compute.enumerate();
        compute
    }

    pub fn arena(&self) -> &MirrorArena {
        &self.arena
    }

    pub fn receiver(&self) -> &Coordinate {
        &self.receiver
    }

    fn mirror(
        &mut self,
        image_of: &Coordinate,
        parent: Option<usize>,
        wall: &Wall,
        order: usize,
        seen: &mut FxHashSet<ChainKey>,
    ) -> Option<usize> {
        let position = mirror_across_line(&xy(image_of), &wall.a(), &wall.b());
        let node = MirrorReceiver {
            position: Coordinate::new(position.x, position.y, self.receiver.z),
            parent,
            wall: wall.index(),
            wall_key: wall.key(),
            building: wall.building(),
            kind: if wall.building().is_some() {
                IntersectionKind::BuildingWall
            } else {
                IntersectionKind::Wall
            },
            order,
        };
        let index = self.arena.push_unique(node, seen)?;
        self.cones.push(VisibilityCone::new(position, wall.a(), wall.b(), self.max_ref_dist));
        Some(index)
    }

    fn enumerate(&mut self) {
        if self.max_order == 0 {
            return;
        }
        let scene = self.scene;
        let r = xy(&self.receiver);
        let reach = self.max_ref_dist;
        let mut seen: FxHashSet<ChainKey> = FxHashSet::default();

        let mut level = Vec::new();
        for index in scene.walls_in_envelope([r.x - reach, r.y - reach], [r.x + reach, r.y + reach]) {
            let wall = &scene.walls()[index];
            if wall.length() < GEOMETRY_EPSILON || wall.distance_to(&r) > reach || !wall.faces(&r) {
                continue;
            }
            let receiver = self.receiver;
            level.extend(self.mirror(&receiver, None, wall, 1, &mut seen));
        }

        for order in 2..=self.max_order {
            let mut next = Vec::new();
            for &parent in &level {
                let Some((parent_position, parent_key)) = self.arena.get(parent).map(|n| (n.position, n.wall_key)) else {
                    continue;
                };
                let (min, max) = self.cones[parent].envelope();
                for index in scene.walls_in_envelope(min, max) {
                    let wall = &scene.walls()[index];
                    let key = wall.key();
                    if key == parent_key
                        || wall.length() < GEOMETRY_EPSILON
                        || self.arena.uses_wall(parent, &key)
                        || !wall.faces(&xy(&parent_position))
                        || !self.cones[parent].reaches(wall)
                    {
                        continue;
                    }
                    next.extend(self.mirror(&parent_position, Some(parent), wall, order, &mut seen));
                }
            }
            trace!("{} image receivers of order {order}", next.len());
            if next.is_empty() {
                break;
            }
            level = next;
        }
    }

    /// Reflection paths from `source` to the receiver, shortest chains first.
    ///
    /// Chains whose unfolded length exceeds `max_length` are skipped.
    pub fn reflection_paths(&self, source: &Coordinate, max_length: f64) -> Vec<PropagationPath> {
        let s = xy(source);
        let mut paths = Vec::new();
        for (index, node) in self.arena.iter().enumerate() {
            let Some(wall) = self.scene.wall(node.wall) else {
                continue;
            };
            let image = xy(&node.position);
            if (image - s).norm() > max_length
                || !wall.faces(&s)
                || !self.cones[index].contains(&s)
                || segment_intersection(&s, &image, &wall.a(), &wall.b()).is_none()
            {
                continue;
            }
            if let Some(path) = self.unfold(source, index) {
                paths.push(path);
            }
        }
        paths
    }

    /// Turn the chain ending at `index` into world-space reflection points and validate
    /// them against the walls and the free field.
    fn unfold(&self, source: &Coordinate, index: usize) -> Option<PropagationPath> {
        let mut current = xy(source);
        let mut hits: Vec<(Coord2, &Wall, f64)> = Vec::new();
        for node in self.arena.chain(index) {
            let wall = self.scene.wall(node.wall)?;
            let hit = segment_intersection(&current, &xy(&node.position), &wall.a(), &wall.b())?;
            hits.push((hit.point, wall, hit.u));
            current = hit.point;
        }

        let r = xy(&self.receiver);
        let total = hits
            .iter()
            .map(|(p, _, _)| *p)
            .chain(std::iter::once(r))
            .fold((xy(source), 0.0), |(prev, sum), p| (p, sum + (p - prev).norm()))
            .1;
        if total < GEOMETRY_EPSILON {
            return None;
        }

        let mut points = vec![PathPoint::new(*source, PointRole::Source)];
        let mut travelled = 0.0;
        let mut previous = xy(source);
        for (p, wall, u) in &hits {
            travelled += (p - previous).norm();
            previous = *p;
            let z = source.z + (self.receiver.z - source.z) * travelled / total;
            if z > wall.top_at(*u) + GEOMETRY_EPSILON {
                return None;
            }
            points.push(
                PathPoint::new(Coordinate::new(p.x, p.y, z), PointRole::Reflection)
                    .with_obstacle(wall.building(), Some(wall.index())),
            );
        }
        points.push(PathPoint::new(self.receiver, PointRole::Receiver));

        let free = points
            .windows(2)
            .all(|leg| self.scene.get_profile(&leg[0].position, &leg[1].position).is_free_field());
        free.then(|| PropagationPath::new(points))
    }
}
