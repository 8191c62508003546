//! Image receivers and their arena

use crate::core_types::Coordinate;
use crate::scene::WallKey;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Kind of wall an image receiver was mirrored across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntersectionKind {
    BuildingWall,
    Wall,
}

/// Receiver mirrored across one wall, possibly after earlier mirrors.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorReceiver {
    /// Image position; `z` is the receiver elevation
    pub position: Coordinate,
    /// Arena index of the previous image, `None` for a first order image
    pub parent: Option<usize>,
    pub wall: usize,
    /// Physical identity of `wall`, shared by walls digitised more than once
    pub wall_key: WallKey,
    pub building: Option<usize>,
    pub kind: IntersectionKind,
    /// Number of reflections of the chain ending here (1 for first order)
    pub order: usize,
}

/// Identity of a whole mirror chain: every (position, wall, building) tuple from the
/// node up to its first-order ancestor. Walls are compared by physical identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainKey(Vec<([u64; 3], WallKey, Option<usize>)>);

/// Flat storage of every image receiver; parents are referenced by index.
#[derive(Debug, Clone, Default)]
pub struct MirrorArena {
    nodes: Vec<MirrorReceiver>,
}

impl MirrorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: MirrorReceiver) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Push `node` unless an identical chain is already stored.
    pub(crate) fn push_unique(&mut self, node: MirrorReceiver, seen: &mut FxHashSet<ChainKey>) -> Option<usize> {
        let index = self.push(node);
        if seen.insert(self.chain_key(index)) {
            Some(index)
        } else {
            self.nodes.pop();
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&MirrorReceiver> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MirrorReceiver> {
        self.nodes.iter()
    }

    /// Nodes from `index` up to its first order ancestor
    pub fn chain(&self, index: usize) -> impl Iterator<Item = &MirrorReceiver> + '_ {
        std::iter::successors(self.nodes.get(index), |node| node.parent.and_then(|p| self.nodes.get(p)))
    }

    pub fn chain_key(&self, index: usize) -> ChainKey {
        ChainKey(
            self.chain(index)
                .map(|node| {
                    (
                        [node.position.x.to_bits(), node.position.y.to_bits(), node.position.z.to_bits()],
                        node.wall_key,
                        node.building,
                    )
                })
                .collect(),
        )
    }

    /// Whether the physical wall `key` is already used by the chain ending at `index`
    pub fn uses_wall(&self, index: usize, key: &WallKey) -> bool {
        self.chain(index).any(|node| node.wall_key == *key)
    }

    /// Chain equality: same tuples all the way to the first order image.
    pub fn same_chain(&self, a: usize, b: usize) -> bool {
        self.chain_key(a) == self.chain_key(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Coord2;

    fn key(wall: usize) -> WallKey {
        let x = wall as f64;
        WallKey::new(&Coord2::new(x, 0.0), &Coord2::new(x, 10.0))
    }

    fn node(x: f64, parent: Option<usize>, wall: usize, order: usize) -> MirrorReceiver {
        MirrorReceiver {
            position: Coordinate::new(x, 0.0, 1.5),
            parent,
            wall,
            wall_key: key(wall),
            building: Some(0),
            kind: IntersectionKind::BuildingWall,
            order,
        }
    }

    #[test]
    fn test_chain_walks_to_root() {
        let mut arena = MirrorArena::new();
        let root = arena.push(node(1.0, None, 3, 1));
        let child = arena.push(node(2.0, Some(root), 5, 2));
        let orders: Vec<usize> = arena.chain(child).map(|n| n.order).collect();
        assert_eq!(orders, vec![2, 1]);
        assert!(arena.uses_wall(child, &key(3)));
        assert!(!arena.uses_wall(root, &key(5)));
    }

    #[test]
    fn test_chain_equality_compares_ancestors() {
        let mut arena = MirrorArena::new();
        let a = arena.push(node(1.0, None, 3, 1));
        let b = arena.push(node(7.0, None, 4, 1));
        let child_a = arena.push(node(2.0, Some(a), 5, 2));
        let child_b = arena.push(node(2.0, Some(b), 5, 2));
        let child_a2 = arena.push(node(2.0, Some(a), 5, 2));
        assert!(!arena.same_chain(child_a, child_b));
        assert!(arena.same_chain(child_a, child_a2));
    }

    #[test]
    fn test_duplicate_chain_is_not_stored() {
        let mut arena = MirrorArena::new();
        let mut seen = FxHashSet::default();
        let root = arena.push_unique(node(1.0, None, 3, 1), &mut seen);
        assert_eq!(root, Some(0));
        assert_eq!(arena.push_unique(node(1.0, None, 3, 1), &mut seen), None);
        assert_eq!(arena.len(), 1);
    }
}
