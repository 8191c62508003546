//! Paths over roofs and wall tops

use crate::core_types::{orientation, Coord2, GEOMETRY_EPSILON};
use crate::path::{PathPoint, PointRole, PropagationPath};
use crate::profile::{CutPointKind, CutProfile};

/// Path over the obstacles of `profile` in its vertical plane.
///
/// The path is the upper convex hull of the endpoints, the wall tops and the terrain in
/// the (distance, elevation) plane. Its intermediate vertices are horizontal-edge
/// diffraction points. A profile in free field gives the two-point direct path.
pub fn compute_hedge_diffraction(profile: &CutProfile) -> PropagationPath {
    let source = PathPoint::new(*profile.start(), PointRole::Source);
    let receiver = PathPoint::new(*profile.end(), PointRole::Receiver);
    let length = profile.length();
    if length < GEOMETRY_EPSILON {
        return PropagationPath::new(vec![source, receiver]);
    }

    // Candidate index into the profile points, `None` for the endpoints
    let mut candidates: Vec<(Coord2, Option<usize>)> = vec![(Coord2::new(0.0, profile.start().z), None)];
    candidates.extend(profile.points().iter().enumerate().filter_map(|(i, p)| {
        let relevant = matches!(
            p.kind,
            CutPointKind::BuildingWall | CutPointKind::Wall | CutPointKind::Topography
        );
        (relevant && p.distance > GEOMETRY_EPSILON && p.distance < length - GEOMETRY_EPSILON)
            .then(|| (Coord2::new(p.distance, p.position.z), Some(i)))
    }));
    candidates.push((Coord2::new(length, profile.end().z), None));

    let mut upper: Vec<(Coord2, Option<usize>)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        while let [.., a, b] = upper[..] {
            if orientation(&a.0, &b.0, &candidate.0) < 0.0 {
                break;
            }
            upper.pop();
        }
        upper.push(candidate);
    }

    let mut points = Vec::with_capacity(upper.len());
    points.push(source);
    points.extend(upper.iter().filter_map(|(_, index)| *index).map(|i| {
        let cut = &profile.points()[i];
        PathPoint::new(cut.position, PointRole::HorizontalDiffraction).with_obstacle(cut.building, cut.wall)
    }));
    points.push(receiver);
    PropagationPath::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Coordinate;
    use crate::scene::ProfileBuilder;
    use geo::polygon;

    fn two_blocks() -> ProfileBuilder {
        let mut scene = ProfileBuilder::new();
        scene
            .add_building(&polygon![(x: 10.0, y: -5.0), (x: 20.0, y: -5.0), (x: 20.0, y: 5.0), (x: 10.0, y: 5.0)], 10.0, None)
            .expect("feeding");
        scene
            .add_building(&polygon![(x: 30.0, y: -5.0), (x: 40.0, y: -5.0), (x: 40.0, y: 5.0), (x: 30.0, y: 5.0)], 10.0, None)
            .expect("feeding");
        scene.finish_feeding().expect("freeze");
        scene
    }

    #[test]
    fn test_over_two_flat_roofs() {
        let scene = two_blocks();
        let profile = scene.get_profile(&Coordinate::new(0.0, 0.0, 1.0), &Coordinate::new(50.0, 0.0, 1.0));
        let path = compute_hedge_diffraction(&profile);
        assert_eq!(path.points.len(), 4);
        assert_eq!(path.points[1].role, PointRole::HorizontalDiffraction);
        assert!((path.points[1].position.x - 10.0).abs() < 1e-9);
        assert!((path.points[2].position.x - 40.0).abs() < 1e-9);
        assert_eq!(path.points[1].building, Some(0));
        assert_eq!(path.points[2].building, Some(1));
    }

    #[test]
    fn test_free_field_gives_direct_path() {
        let scene = two_blocks();
        let profile = scene.get_profile(&Coordinate::new(0.0, 20.0, 1.0), &Coordinate::new(50.0, 20.0, 1.0));
        assert_eq!(compute_hedge_diffraction(&profile).points.len(), 2);
    }
}
