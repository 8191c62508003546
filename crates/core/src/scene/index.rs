//! R-tree entries shared by the scene indices

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Bounding box of one scene object, addressed by its index in the owning `Vec`.
#[derive(Debug, Clone)]
pub(crate) struct IndexedBox {
    pub(crate) index: usize,
    env: AABB<[f64; 2]>,
}

impl IndexedBox {
    pub(crate) fn new(index: usize, (min, max): ([f64; 2], [f64; 2])) -> Self {
        IndexedBox {
            index,
            env: AABB::from_corners(min, max),
        }
    }
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

impl PointDistance for IndexedBox {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.env.distance_2(point)
    }
}

/// Sorted indices of all entries whose box intersects `min..max`.
pub(crate) fn query(tree: &RTree<IndexedBox>, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
    let envelope = AABB::from_corners(min, max);
    let mut hits: Vec<usize> = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|entry| entry.index)
        .collect();
    hits.sort_unstable();
    hits
}

/// Envelope of a segment, grown by `margin` on every side.
pub(crate) fn segment_envelope(a: [f64; 2], b: [f64; 2], margin: f64) -> ([f64; 2], [f64; 2]) {
    (
        [a[0].min(b[0]) - margin, a[1].min(b[1]) - margin],
        [a[0].max(b[0]) + margin, a[1].max(b[1]) + margin],
    )
}
