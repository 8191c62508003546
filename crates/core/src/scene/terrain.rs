//! Triangulated terrain relief

use super::index::{query, segment_envelope, IndexedBox};
use crate::core_types::geometry::{coord_bits, lerp};
use crate::core_types::{orientation, segment_intersection, xy, Coord2, Coordinate, GEOMETRY_EPSILON};
use rstar::RTree;
use rustc_hash::FxHashSet;

/// Triangulated irregular network built from the topographic samples.
///
/// Triangulation is a Delaunay triangulation of the samples projected on the XY plane.
#[derive(Debug, Clone)]
pub struct Tin {
    vertices: Vec<Coordinate>,
    triangles: Vec<[usize; 3]>,
    tree: RTree<IndexedBox>,
}

/// Crossing of a profile segment with a TIN edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinCrossing {
    /// Parameter along the profile segment
    pub t: f64,
    /// Crossing point with the terrain elevation
    pub position: Coordinate,
}

impl Tin {
    /// Triangulate the samples. Coincident samples keep the first elevation seen.
    ///
    /// Returns `None` when fewer than three distinct non-collinear samples exist.
    pub fn from_samples(samples: &[Coordinate]) -> Option<Self> {
        let mut seen = FxHashSet::default();
        let vertices: Vec<Coordinate> = samples
            .iter()
            .filter(|p| seen.insert(coord_bits(&xy(p))))
            .copied()
            .collect();
        if vertices.len() < 3 {
            return None;
        }
        let points: Vec<delaunator::Point> = vertices
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&points);
        let triangles: Vec<[usize; 3]> = triangulation
            .triangles
            .chunks(3)
            .filter(|c| c.len() == 3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        if triangles.is_empty() {
            return None;
        }
        let boxes = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| {
                let mut min = [f64::INFINITY; 2];
                let mut max = [f64::NEG_INFINITY; 2];
                for &v in tri {
                    min[0] = min[0].min(vertices[v].x);
                    min[1] = min[1].min(vertices[v].y);
                    max[0] = max[0].max(vertices[v].x);
                    max[1] = max[1].max(vertices[v].y);
                }
                IndexedBox::new(i, (min, max))
            })
            .collect();
        Some(Tin {
            vertices,
            triangles,
            tree: RTree::bulk_load(boxes),
        })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn corners(&self, tri: usize) -> [Coordinate; 3] {
        let [a, b, c] = self.triangles[tri];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Interpolated elevation at `p`, `None` outside the triangulated area.
    pub fn elevation_at(&self, p: &Coord2) -> Option<f64> {
        let candidates = query(&self.tree, [p.x, p.y], [p.x, p.y]);
        candidates.into_iter().find_map(|tri| {
            let [a, b, c] = self.corners(tri);
            let (a2, b2, c2) = (xy(&a), xy(&b), xy(&c));
            let area = orientation(&a2, &b2, &c2);
            if area.abs() < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
                return None;
            }
            let wa = orientation(&b2, &c2, p) / area;
            let wb = orientation(&c2, &a2, p) / area;
            let wc = 1.0 - wa - wb;
            let tolerance = -1e-9;
            (wa >= tolerance && wb >= tolerance && wc >= tolerance).then(|| wa * a.z + wb * b.z + wc * c.z)
        })
    }

    /// Every TIN edge crossed by segment `a-b`, unsorted. Shared edges are reported once.
    pub fn crossings(&self, a: &Coord2, b: &Coord2) -> Vec<TinCrossing> {
        let (min, max) = segment_envelope([a.x, a.y], [b.x, b.y], GEOMETRY_EPSILON);
        let mut visited: FxHashSet<(usize, usize)> = FxHashSet::default();
        let mut out = Vec::new();
        for tri in query(&self.tree, min, max) {
            let idx = self.triangles[tri];
            for k in 0..3 {
                let (i, j) = (idx[k], idx[(k + 1) % 3]);
                if !visited.insert((i.min(j), i.max(j))) {
                    continue;
                }
                let (e0, e1) = (self.vertices[i], self.vertices[j]);
                if let Some(hit) = segment_intersection(a, b, &xy(&e0), &xy(&e1)) {
                    out.push(TinCrossing {
                        t: hit.t,
                        position: Coordinate::new(hit.point.x, hit.point.y, lerp(e0.z, e1.z, hit.u)),
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slope() -> Tin {
        // z = x / 10 over a 100 m square
        Tin::from_samples(&[
            Coordinate::new(0.0, 0.0, 0.0),
            Coordinate::new(100.0, 0.0, 10.0),
            Coordinate::new(100.0, 100.0, 10.0),
            Coordinate::new(0.0, 100.0, 0.0),
            Coordinate::new(0.0, 0.0, 3.0),
        ])
        .expect("triangulation")
    }

    #[test]
    fn test_duplicates_are_removed() {
        assert_eq!(slope().vertices().len(), 4);
        assert_eq!(slope().triangle_count(), 2);
    }

    #[test]
    fn test_interpolated_elevation() {
        let tin = slope();
        assert_relative_eq!(tin.elevation_at(&Coord2::new(25.0, 60.0)).unwrap_or(f64::NAN), 2.5, epsilon = 1e-9);
        assert!(tin.elevation_at(&Coord2::new(150.0, 50.0)).is_none());
    }

    #[test]
    fn test_collinear_samples_do_not_triangulate() {
        assert!(Tin::from_samples(&[
            Coordinate::new(0.0, 0.0, 0.0),
            Coordinate::new(1.0, 0.0, 0.0),
            Coordinate::new(2.0, 0.0, 0.0),
        ])
        .is_none());
    }

    #[test]
    fn test_crossings_follow_surface() {
        let tin = slope();
        let hits = tin.crossings(&Coord2::new(-10.0, 50.0), &Coord2::new(110.0, 50.0));
        // Hull edges at x = 0 and x = 100 plus the diagonal
        assert_eq!(hits.len(), 3);
        for hit in hits {
            assert_relative_eq!(hit.position.z, hit.position.x / 10.0, epsilon = 1e-9);
        }
    }
}
