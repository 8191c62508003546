//! Core types and utilities

pub mod geometry;
pub mod vec3;

pub use geometry::{
    coord_bits, cross, distance_2d, lerp, mirror_across_line, orientation, point_segment_distance,
    segment_intersection, xy, SegmentHit, GEOMETRY_EPSILON,
};
pub use vec3::{Coord2, Coordinate, Vec2, Vec3};
