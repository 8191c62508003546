//! Profile cutting against the frozen scene

use super::{CutPoint, CutPointKind, CutProfile, GroundSegment};
use crate::core_types::{distance_2d, segment_intersection, xy, Coord2, Coordinate, GEOMETRY_EPSILON};
use crate::scene::index::segment_envelope;
use crate::scene::ProfileBuilder;
use std::cmp::Ordering;

/// Intersection collected before distances are known
struct RawCut {
    t: f64,
    point: CutPoint,
}

fn canonical_order(a: &Coordinate, b: &Coordinate) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

impl ProfileBuilder {
    /// Cut the scene along `p1 -> p2` using the scene default ground coefficient.
    pub fn get_profile(&self, p1: &Coordinate, p2: &Coordinate) -> CutProfile {
        self.get_profile_with_gs(p1, p2, self.default_ground_coefficient())
    }

    /// Cut the scene along `p1 -> p2`; stretches outside every ground zone get `gs`.
    ///
    /// The profile is computed once on the canonically ordered segment, so cutting
    /// `p2 -> p1` gives the same points in reverse order.
    pub fn get_profile_with_gs(&self, p1: &Coordinate, p2: &Coordinate, gs: f64) -> CutProfile {
        if canonical_order(p1, p2) == Ordering::Greater {
            self.cut(p2, p1, gs).reversed()
        } else {
            self.cut(p1, p2, gs)
        }
    }

    fn cut(&self, start: &Coordinate, end: &Coordinate, gs: f64) -> CutProfile {
        let length = distance_2d(start, end);
        let (a, b) = (xy(start), xy(end));
        let source = CutPoint {
            kind: CutPointKind::Source,
            position: *start,
            ground_elevation: self.ground_z(&a),
            distance: 0.0,
            building: None,
            wall: None,
            ground_zone: None,
        };
        if length < GEOMETRY_EPSILON {
            return CutProfile {
                points: vec![source],
                segments: Vec::new(),
                start: *start,
                end: *end,
                length: 0.0,
                default_coefficient: gs,
            };
        }

        let (min, max) = segment_envelope([a.x, a.y], [b.x, b.y], GEOMETRY_EPSILON);
        let mut raw: Vec<RawCut> = Vec::new();

        for index in self.walls_in_envelope(min, max) {
            let wall = &self.walls()[index];
            let Some(hit) = segment_intersection(&a, &b, &wall.a(), &wall.b()) else {
                continue;
            };
            raw.push(RawCut {
                t: hit.t,
                point: CutPoint {
                    kind: if wall.building().is_some() {
                        CutPointKind::BuildingWall
                    } else {
                        CutPointKind::Wall
                    },
                    position: Coordinate::new(hit.point.x, hit.point.y, wall.top_at(hit.u)),
                    ground_elevation: self.ground_z(&hit.point),
                    distance: 0.0,
                    building: wall.building(),
                    wall: Some(index),
                    ground_zone: None,
                },
            });
        }

        if let Some(tin) = self.tin() {
            for crossing in tin.crossings(&a, &b) {
                raw.push(RawCut {
                    t: crossing.t,
                    point: CutPoint {
                        kind: CutPointKind::Topography,
                        position: crossing.position,
                        ground_elevation: crossing.position.z,
                        distance: 0.0,
                        building: None,
                        wall: None,
                        ground_zone: None,
                    },
                });
            }
        }

        let zones = self.ground_zones_in_envelope(min, max);
        let mut breaks = vec![0.0, 1.0];
        for &index in &zones {
            let zone = &self.ground_zones()[index];
            for (z0, z1) in zone.boundary_segments() {
                let Some(hit) = segment_intersection(&a, &b, &z0, &z1) else {
                    continue;
                };
                breaks.push(hit.t);
                raw.push(RawCut {
                    t: hit.t,
                    point: CutPoint {
                        kind: CutPointKind::GroundEffect,
                        position: Coordinate::new(hit.point.x, hit.point.y, self.ground_z(&hit.point)),
                        ground_elevation: self.ground_z(&hit.point),
                        distance: 0.0,
                        building: None,
                        wall: None,
                        ground_zone: Some(index),
                    },
                });
            }
        }

        raw.sort_by(|l, r| {
            l.t.total_cmp(&r.t)
                .then(l.point.kind.cmp(&r.point.kind))
                .then(l.point.wall.cmp(&r.point.wall))
                .then(l.point.ground_zone.cmp(&r.point.ground_zone))
        });

        let mut points = Vec::with_capacity(raw.len() + 2);
        points.push(source);
        points.extend(raw.into_iter().map(|mut cut| {
            cut.point.distance = cut.t * length;
            cut.point
        }));
        points.push(CutPoint {
            kind: CutPointKind::Receiver,
            position: *end,
            ground_elevation: self.ground_z(&b),
            distance: length,
            building: None,
            wall: None,
            ground_zone: None,
        });

        CutProfile {
            points,
            segments: self.ground_segments_along(&a, &b, length, &zones, breaks, gs),
            start: *start,
            end: *end,
            length,
            default_coefficient: gs,
        }
    }

    /// Split `a-b` at the zone boundaries and give every stretch the coefficient of the
    /// topmost zone covering its midpoint.
    fn ground_segments_along(
        &self,
        a: &Coord2,
        b: &Coord2,
        length: f64,
        zones: &[usize],
        mut breaks: Vec<f64>,
        gs: f64,
    ) -> Vec<GroundSegment> {
        breaks.sort_by(f64::total_cmp);
        let min_step = GEOMETRY_EPSILON / length;
        breaks.dedup_by(|next, prev| (*next - *prev).abs() < min_step);

        let mut segments: Vec<GroundSegment> = Vec::new();
        for w in breaks.windows(2) {
            if w[1] - w[0] < min_step {
                continue;
            }
            let mid = a + (b - a) * (0.5 * (w[0] + w[1]));
            let zone = zones
                .iter()
                .rev()
                .copied()
                .find(|&z| self.ground_zones()[z].contains(&mid));
            let coefficient = zone.map_or(gs, |z| self.ground_zones()[z].coefficient());
            let (start, end) = (w[0] * length, w[1] * length);
            match segments.last_mut() {
                Some(last) if last.zone == zone && last.coefficient == coefficient => last.end = end,
                _ => segments.push(GroundSegment {
                    start,
                    end,
                    coefficient,
                    zone,
                }),
            }
        }
        if let Some(last) = segments.last_mut() {
            last.end = length;
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn scene() -> ProfileBuilder {
        let mut scene = ProfileBuilder::new();
        scene
            .add_building(
                &polygon![(x: 10.0, y: -5.0), (x: 20.0, y: -5.0), (x: 20.0, y: 5.0), (x: 10.0, y: 5.0)],
                10.0,
                None,
            )
            .expect("feeding");
        scene
            .add_ground_effect(&polygon![(x: 0.0, y: -50.0), (x: 60.0, y: -50.0), (x: 60.0, y: 50.0), (x: 0.0, y: 50.0)], 0.5)
            .expect("feeding");
        scene
            .add_ground_effect(&polygon![(x: 30.0, y: -50.0), (x: 40.0, y: -50.0), (x: 40.0, y: 50.0), (x: 30.0, y: 50.0)], 1.0)
            .expect("feeding");
        scene.finish_feeding().expect("freeze");
        scene
    }

    #[test]
    fn test_building_walls_are_cut() {
        let scene = scene();
        let profile = scene.get_profile(&Coordinate::new(0.0, 0.0, 2.0), &Coordinate::new(50.0, 0.0, 2.0));
        let walls: Vec<&CutPoint> = profile.building_crossings().collect();
        assert_eq!(walls.len(), 2);
        assert_relative_eq!(walls[0].distance, 10.0, epsilon = 1e-9);
        assert_relative_eq!(walls[1].distance, 20.0, epsilon = 1e-9);
        assert_relative_eq!(walls[0].position.z, 10.0);
        assert!(!profile.is_free_field());
        assert_eq!(profile.points().first().map(|p| p.kind), Some(CutPointKind::Source));
        assert_eq!(profile.points().last().map(|p| p.kind), Some(CutPointKind::Receiver));
    }

    #[test]
    fn test_topmost_zone_wins() {
        let scene = scene();
        let profile = scene.get_profile_with_gs(&Coordinate::new(-10.0, 20.0, 2.0), &Coordinate::new(70.0, 20.0, 2.0), 0.0);
        let coefficients: Vec<f64> = profile.ground_segments().iter().map(|s| s.coefficient).collect();
        assert_eq!(coefficients, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
        // 10 m at 0, 30 m at 0.5, 10 m at 1, 20 m at 0.5, 10 m at 0
        assert_relative_eq!(profile.mean_ground_coefficient(), (15.0 + 10.0 + 10.0) / 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_segment_yields_single_point() {
        let scene = scene();
        let p = Coordinate::new(5.0, 5.0, 1.0);
        let profile = scene.get_profile(&p, &p);
        assert_eq!(profile.points().len(), 1);
        assert!(profile.is_free_field());
    }

    #[test]
    fn test_free_field_above_roof() {
        let scene = scene();
        let profile = scene.get_profile(&Coordinate::new(0.0, 0.0, 12.0), &Coordinate::new(50.0, 0.0, 12.0));
        assert!(profile.is_free_field());
    }
}
