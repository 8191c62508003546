//! Lateral diffraction paths around building corners
use geo::{LineString, Polygon};
use noise_path_core::scene::WIDE_ANGLE_TRANSLATION_EPSILON;
use noise_path_core::{compute_side_hull, Coordinate, ProfileBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

fn polygon(ring: &[(f64, f64)]) -> Polygon<f64> {
    Polygon::new(LineString::from(ring.to_vec()), Vec::new())
}

fn scene(buildings: &[(&[(f64, f64)], f64)]) -> ProfileBuilder {
    let mut scene = ProfileBuilder::new();
    for (ring, height) in buildings {
        scene.add_building(&polygon(ring), *height, None).expect("feeding");
    }
    scene.finish_feeding().expect("freeze");
    scene
}

fn distance_2d(a: &Coordinate, x: f64, y: f64) -> f64 {
    (a.x - x).hypot(a.y - y)
}

fn assert_hull(hull: &[Coordinate], expected: &[(f64, f64)]) {
    assert_eq!(hull.len(), expected.len(), "hull {hull:?}");
    for (point, (x, y)) in hull.iter().zip(expected) {
        assert!(distance_2d(point, *x, *y) < 0.02, "expected ({x}, {y}), got {point:?}");
    }
}

fn four_buildings() -> ProfileBuilder {
    scene(&[
        (&[(5.0, 6.0), (6.0, 5.0), (7.0, 5.0), (7.0, 8.0), (6.0, 8.0), (5.0, 7.0), (5.0, 6.0)], 4.0),
        (&[(9.0, 7.0), (11.0, 7.0), (11.0, 11.0), (9.0, 11.0), (9.0, 7.0)], 4.0),
        (&[(12.0, 8.0), (13.0, 8.0), (13.0, 10.0), (12.0, 10.0), (12.0, 8.0)], 4.0),
        (&[(10.0, 4.0), (11.0, 4.0), (11.0, 6.0), (10.0, 6.0), (10.0, 4.0)], 4.0),
    ])
}

#[test]
fn test_four_buildings_both_sides() {
    let scene = four_buildings();
    let p1 = Coordinate::new(2.0, 6.5, 1.6);
    let p2 = Coordinate::new(14.0, 6.5, 1.6);

    let left = compute_side_hull(true, &p1, &p2, &scene);
    assert_hull(&left, &[(2.0, 6.5), (9.0, 11.0), (11.0, 11.0), (13.0, 10.0), (14.0, 6.5)]);

    let right = compute_side_hull(false, &p1, &p2, &scene);
    assert_hull(&right, &[(2.0, 6.5), (6.0, 5.0), (10.0, 4.0), (11.0, 4.0), (14.0, 6.5)]);

    // Same paths walked from the other end
    let left_back = compute_side_hull(false, &p2, &p1, &scene);
    assert_hull(&left_back, &[(14.0, 6.5), (13.0, 10.0), (11.0, 11.0), (9.0, 11.0), (2.0, 6.5)]);
    let right_back = compute_side_hull(true, &p2, &p1, &scene);
    assert_hull(&right_back, &[(14.0, 6.5), (11.0, 4.0), (10.0, 4.0), (6.0, 5.0), (2.0, 6.5)]);

    // Flat endpoints keep the intermediate corners at endpoint height
    assert!(left.iter().all(|p| (p.z - 1.6).abs() < 1e-9));
}

#[test]
fn test_each_leg_of_the_hull_is_free_field() {
    let scene = four_buildings();
    let p1 = Coordinate::new(2.0, 6.5, 1.6);
    let p2 = Coordinate::new(14.0, 6.5, 1.6);
    assert!(!scene.get_profile(&p1, &p2).is_free_field());
    for clockwise in [true, false] {
        let hull = compute_side_hull(clockwise, &p1, &p2, &scene);
        for leg in hull.windows(2) {
            assert!(scene.get_profile(&leg[0], &leg[1]).is_free_field(), "blocked leg {leg:?}");
        }
    }
}

#[test]
fn test_receiver_in_concave_pocket_has_no_lateral_path() {
    let scene = scene(&[
        (&[(5.0, 6.0), (4.0, 5.0), (7.0, 5.0), (7.0, 8.0), (4.0, 8.0), (5.0, 7.0), (5.0, 6.0)], 4.0),
        (&[(9.0, 7.0), (11.0, 7.0), (11.0, 11.0), (9.0, 11.0), (9.0, 7.0)], 4.0),
        (&[(12.0, 8.0), (13.0, 8.0), (13.0, 10.0), (12.0, 10.0), (12.0, 8.0)], 4.0),
        (&[(10.0, 4.0), (11.0, 4.0), (11.0, 6.0), (10.0, 6.0), (10.0, 4.0)], 4.0),
    ]);
    let p1 = Coordinate::new(4.5, 6.5, 1.6);
    let p2 = Coordinate::new(14.0, 6.5, 1.6);
    assert!(compute_side_hull(true, &p1, &p2, &scene).is_empty());
    assert!(compute_side_hull(false, &p1, &p2, &scene).is_empty());
    assert!(compute_side_hull(false, &p2, &p1, &scene).is_empty());
    assert!(compute_side_hull(true, &p2, &p1, &scene).is_empty());
}

fn over_building_scene() -> ProfileBuilder {
    scene(&[
        (&[(5.0, 5.0), (7.0, 5.0), (7.0, 6.0), (8.0, 6.0), (8.0, 8.0), (5.0, 8.0), (5.0, 5.0)], 4.3),
        (&[(9.0, 7.0), (10.0, 7.0), (10.0, 9.0), (9.0, 9.0), (9.0, 7.0)], 4.3),
    ])
}

#[test]
fn test_wide_angle_corners_of_l_shaped_building() {
    let scene = over_building_scene();
    let corners = scene.wide_angle_points(0, PI * (1.0 + 1.0 / 16.0), PI * (2.0 - 1.0 / 16.0));
    let expected = [(5.0, 5.0), (7.0, 5.0), (8.0, 6.0), (8.0, 8.0), (5.0, 8.0), (5.0, 5.0)];
    assert_eq!(corners.len(), expected.len());
    for (corner, (x, y)) in corners.iter().zip(expected) {
        assert!(distance_2d(corner, x, y) < 2.0 * WIDE_ANGLE_TRANSLATION_EPSILON);
    }
}

#[test]
fn test_rising_path_passes_over_the_low_building() {
    let scene = over_building_scene();
    let p1 = Coordinate::new(4.0, 3.0, 3.0);
    let p2 = Coordinate::new(13.0, 10.0, 6.7);

    assert_hull(&compute_side_hull(true, &p1, &p2, &scene), &[(4.0, 3.0), (5.0, 8.0), (13.0, 10.0)]);
    assert_hull(&compute_side_hull(false, &p1, &p2, &scene), &[(4.0, 3.0), (7.0, 5.0), (13.0, 10.0)]);
    assert_hull(&compute_side_hull(false, &p2, &p1, &scene), &[(13.0, 10.0), (5.0, 8.0), (4.0, 3.0)]);
    assert_hull(&compute_side_hull(true, &p2, &p1, &scene), &[(13.0, 10.0), (7.0, 5.0), (4.0, 3.0)]);
}

#[test]
fn test_airborne_source_plane_under_ground_is_rejected() {
    let scene = scene(&[(
        &[
            (223393.0, 6757706.0),
            (223402.0, 6757696.0),
            (223409.0, 6757703.0),
            (223411.0, 6757705.0),
            (223414.0, 6757702.0),
            (223417.0, 6757704.0),
            (223421.0, 6757709.0),
            (223423.0, 6757712.0),
            (223437.0, 6757725.0),
            (223435.0, 6757728.0),
            (223441.0, 6757735.0),
            (223448.0, 6757741.0),
            (223439.0, 6757751.0),
            (223433.0, 6757745.0),
            (223432.0, 6757745.0),
            (223430.0, 6757747.0),
            (223417.0, 6757734.0),
            (223402.0, 6757720.0),
            (223404.0, 6757717.0),
            (223393.0, 6757706.0),
        ],
        13.0,
    )]);
    let source = Coordinate::new(223512.78, 6757739.7, 500.0);
    let receiver = Coordinate::new(223392.04632028608, 6757724.944483406, 2.0);
    assert!(compute_side_hull(false, &receiver, &source, &scene).is_empty());
}

#[test]
fn test_reversed_endpoints_give_reversed_hull() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let mut scene = ProfileBuilder::new();
        for row in 0..4 {
            for column in 0..4 {
                let x0 = f64::from(column) * 20.0 + rng.random_range(1.0..5.0);
                let y0 = f64::from(row) * 20.0 + rng.random_range(1.0..5.0);
                let x1 = x0 + rng.random_range(5.0..12.0);
                let y1 = y0 + rng.random_range(5.0..12.0);
                let footprint = polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
                scene
                    .add_building(&footprint, rng.random_range(5.0..15.0), None)
                    .expect("feeding");
            }
        }
        scene.finish_feeding().expect("freeze");

        let a = Coordinate::new(rng.random_range(-10.0..90.0), rng.random_range(-10.0..90.0), rng.random_range(0.5..3.0));
        let b = Coordinate::new(rng.random_range(-10.0..90.0), rng.random_range(-10.0..90.0), rng.random_range(0.5..3.0));
        for clockwise in [true, false] {
            let forward = compute_side_hull(clockwise, &a, &b, &scene);
            let mut backward = compute_side_hull(!clockwise, &b, &a, &scene);
            backward.reverse();
            assert_eq!(forward.len(), backward.len(), "{a:?} -> {b:?}");
            for (p, q) in forward.iter().zip(&backward) {
                assert!((p - q).norm() < 1e-6, "{p:?} != {q:?}");
            }
        }
    }
}
