//! Scene index
//!
//! [`ProfileBuilder`] collects buildings, free-standing walls, topographic samples and
//! ground-effect zones, then freezes them into spatial indices with
//! [`ProfileBuilder::finish_feeding`]. A frozen builder is immutable and is shared across
//! worker threads behind an `Arc` without locking.
//!
//! Feeding is tolerant: malformed geometry is skipped with a warning and recorded in
//! [`ProfileBuilder::warnings`], it never fails the batch. Feeding after the freeze is a
//! usage error reported as [`SceneError::Frozen`].

pub mod building;
pub mod error;
pub mod ground;
pub(crate) mod index;
pub mod terrain;
pub mod wall;

pub use building::Building;
pub use error::{SceneError, SceneWarning};
pub use ground::GroundEffectZone;
pub use terrain::{Tin, TinCrossing};
pub use wall::{Wall, WallKey};

use crate::core_types::{xy, Coord2, Coordinate, GEOMETRY_EPSILON};
use building::{normalize_ring, ring_envelope};
use geo::{LineString, Polygon};
use index::{query, IndexedBox};
use rstar::RTree;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Outward offset of wide-angle corners from the building (meters).
pub const WIDE_ANGLE_TRANSLATION_EPSILON: f64 = 0.01;

/// Angular margin (radians) under which a ring vertex counts as collinear.
pub const WIDE_ANGLE_EPSILON: f64 = 1e-6;

/// Wall absorption used when the caller supplies none.
pub const DEFAULT_WALL_ALPHA: f64 = 0.1;

/// Free wall segment waiting for its ground elevation.
#[derive(Debug, Clone)]
struct PendingWall {
    a: Coord2,
    b: Coord2,
    height: f64,
    alpha: f64,
    primary_key: Option<i64>,
}

/// Scene index and profile cutter.
#[derive(Debug)]
pub struct ProfileBuilder {
    buildings: Vec<Building>,
    pending_walls: Vec<PendingWall>,
    walls: Vec<Wall>,
    topography: Vec<Coordinate>,
    ground_zones: Vec<GroundEffectZone>,
    default_ground_coefficient: f64,
    warnings: Vec<SceneWarning>,
    tin: Option<Tin>,
    building_tree: RTree<IndexedBox>,
    wall_tree: RTree<IndexedBox>,
    zone_tree: RTree<IndexedBox>,
    frozen: bool,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileBuilder {
    /// Create an empty scene in the feeding phase
    pub fn new() -> Self {
        ProfileBuilder {
            buildings: Vec::new(),
            pending_walls: Vec::new(),
            walls: Vec::new(),
            topography: Vec::new(),
            ground_zones: Vec::new(),
            default_ground_coefficient: 0.0,
            warnings: Vec::new(),
            tin: None,
            building_tree: RTree::new(),
            wall_tree: RTree::new(),
            zone_tree: RTree::new(),
            frozen: false,
        }
    }

    fn ensure_feeding(&self, operation: &'static str) -> Result<(), SceneError> {
        if self.frozen {
            Err(SceneError::Frozen { operation })
        } else {
            Ok(())
        }
    }

    pub(crate) fn ensure_frozen(&self, operation: &'static str) -> Result<(), SceneError> {
        if self.frozen {
            Ok(())
        } else {
            Err(SceneError::NotFrozen { operation })
        }
    }

    fn skip(&mut self, warning: SceneWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Add a building with the default wall absorption.
    ///
    /// Returns the building index, or `None` when the geometry was skipped.
    pub fn add_building(
        &mut self,
        footprint: &Polygon<f64>,
        height: f64,
        primary_key: Option<i64>,
    ) -> Result<Option<usize>, SceneError> {
        self.add_building_with_alpha(footprint, height, DEFAULT_WALL_ALPHA, primary_key)
    }

    /// Add a building. Only the exterior ring of `footprint` is used.
    pub fn add_building_with_alpha(
        &mut self,
        footprint: &Polygon<f64>,
        height: f64,
        alpha: f64,
        primary_key: Option<i64>,
    ) -> Result<Option<usize>, SceneError> {
        self.ensure_feeding("add_building")?;
        if !height.is_finite() || height < 0.0 {
            self.skip(SceneWarning::InvalidHeight { object: "building", height });
            return Ok(None);
        }
        let raw: Vec<Coord2> = footprint.exterior().coords().map(|c| Coord2::new(c.x, c.y)).collect();
        if raw.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            self.skip(SceneWarning::NonFiniteCoordinate { object: "building" });
            return Ok(None);
        }
        let Some(ring) = normalize_ring(&raw) else {
            self.skip(SceneWarning::DegenerateBuilding { primary_key });
            return Ok(None);
        };
        self.buildings.push(Building::from_ring(ring, height, alpha, primary_key));
        Ok(Some(self.buildings.len() - 1))
    }

    /// Add a free-standing wall (noise barrier). Every polyline segment becomes one wall
    /// whose top is `height` above the ground at each end.
    ///
    /// Returns the number of segments kept.
    pub fn add_wall(
        &mut self,
        line: &LineString<f64>,
        height: f64,
        primary_key: Option<i64>,
    ) -> Result<usize, SceneError> {
        self.add_wall_with_alpha(line, height, DEFAULT_WALL_ALPHA, primary_key)
    }

    pub fn add_wall_with_alpha(
        &mut self,
        line: &LineString<f64>,
        height: f64,
        alpha: f64,
        primary_key: Option<i64>,
    ) -> Result<usize, SceneError> {
        self.ensure_feeding("add_wall")?;
        if !height.is_finite() || height < 0.0 {
            self.skip(SceneWarning::InvalidHeight { object: "wall", height });
            return Ok(0);
        }
        let mut points: Vec<Coord2> = Vec::new();
        for c in line.coords() {
            if !c.x.is_finite() || !c.y.is_finite() {
                self.skip(SceneWarning::NonFiniteCoordinate { object: "wall" });
                return Ok(0);
            }
            let p = Coord2::new(c.x, c.y);
            if points.last().is_some_and(|last| (last - p).norm() < GEOMETRY_EPSILON) {
                continue;
            }
            points.push(p);
        }
        if points.len() < 2 {
            self.skip(SceneWarning::DegenerateWall { primary_key });
            return Ok(0);
        }
        let added = points.len() - 1;
        self.pending_walls.extend(points.windows(2).map(|w| PendingWall {
            a: w[0],
            b: w[1],
            height,
            alpha,
            primary_key,
        }));
        Ok(added)
    }

    /// Add one terrain elevation sample.
    pub fn add_topographic_point(&mut self, point: Coordinate) -> Result<(), SceneError> {
        self.ensure_feeding("add_topographic_point")?;
        if !point.coords.iter().all(|v| v.is_finite()) {
            self.skip(SceneWarning::NonFiniteCoordinate { object: "topographic point" });
            return Ok(());
        }
        self.topography.push(point);
        Ok(())
    }

    /// Add a contour or break line; every vertex becomes a terrain sample.
    pub fn add_topographic_line(&mut self, line: &[Coordinate]) -> Result<(), SceneError> {
        self.ensure_feeding("add_topographic_line")?;
        if line.iter().any(|p| !p.coords.iter().all(|v| v.is_finite())) {
            self.skip(SceneWarning::NonFiniteCoordinate { object: "topographic line" });
            return Ok(());
        }
        let mut distinct: Vec<Coordinate> = Vec::with_capacity(line.len());
        for p in line {
            if distinct.last().is_some_and(|last| (xy(last) - xy(p)).norm() < GEOMETRY_EPSILON) {
                continue;
            }
            distinct.push(*p);
        }
        if distinct.len() < 2 {
            self.skip(SceneWarning::DegenerateTopographicLine { vertex_count: distinct.len() });
            return Ok(());
        }
        self.topography.extend(distinct);
        Ok(())
    }

    /// Add a ground-effect zone. Zones added later lie on top of earlier ones.
    ///
    /// Returns the zone index, or `None` when skipped.
    pub fn add_ground_effect(&mut self, area: &Polygon<f64>, coefficient: f64) -> Result<Option<usize>, SceneError> {
        self.ensure_feeding("add_ground_effect")?;
        if !(0.0..=1.0).contains(&coefficient) {
            self.skip(SceneWarning::InvalidGroundEffect { coefficient });
            return Ok(None);
        }
        let raw: Vec<Coord2> = area.exterior().coords().map(|c| Coord2::new(c.x, c.y)).collect();
        let finite = area
            .interiors()
            .iter()
            .flat_map(LineString::coords)
            .chain(area.exterior().coords())
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !finite {
            self.skip(SceneWarning::NonFiniteCoordinate { object: "ground effect zone" });
            return Ok(None);
        }
        let Some(ring) = normalize_ring(&raw) else {
            self.skip(SceneWarning::InvalidGroundEffect { coefficient });
            return Ok(None);
        };
        let index = self.ground_zones.len();
        self.ground_zones.push(GroundEffectZone {
            ring,
            polygon: area.clone(),
            coefficient,
            index,
        });
        Ok(Some(index))
    }

    /// Ground coefficient of the area not covered by any zone.
    pub fn set_default_ground_coefficient(&mut self, coefficient: f64) -> Result<(), SceneError> {
        self.ensure_feeding("set_default_ground_coefficient")?;
        if (0.0..=1.0).contains(&coefficient) {
            self.default_ground_coefficient = coefficient;
        } else {
            self.skip(SceneWarning::InvalidGroundEffect { coefficient });
        }
        Ok(())
    }

    /// Build the terrain, the wall list and the spatial indices, then freeze the scene.
    pub fn finish_feeding(&mut self) -> Result<(), SceneError> {
        self.ensure_feeding("finish_feeding")?;
        self.tin = Tin::from_samples(&self.topography);

        let mut walls = Vec::new();
        for i in 0..self.buildings.len() {
            let base = self.buildings[i]
                .ring
                .iter()
                .filter_map(|p| self.ground_elevation(p))
                .fold(None, |acc: Option<f64>, z| Some(acc.map_or(z, |m| m.min(z))))
                .unwrap_or(0.0);
            let building = &mut self.buildings[i];
            building.base_elevation = base;
            building.first_wall = walls.len();
            let roof = building.roof_elevation();
            for edge in 0..building.edge_count() {
                let (a, b) = building.edge(edge);
                walls.push(Wall {
                    p0: Coordinate::new(a.x, a.y, roof),
                    p1: Coordinate::new(b.x, b.y, roof),
                    height: building.height,
                    building: Some(i),
                    edge: Some(edge),
                    alpha: building.alpha,
                    primary_key: building.primary_key,
                    index: walls.len(),
                });
            }
        }
        for pending in std::mem::take(&mut self.pending_walls) {
            let za = self.ground_z(&pending.a) + pending.height;
            let zb = self.ground_z(&pending.b) + pending.height;
            walls.push(Wall {
                p0: Coordinate::new(pending.a.x, pending.a.y, za),
                p1: Coordinate::new(pending.b.x, pending.b.y, zb),
                height: pending.height,
                building: None,
                edge: None,
                alpha: pending.alpha,
                primary_key: pending.primary_key,
                index: walls.len(),
            });
        }
        self.walls = walls;

        self.building_tree = RTree::bulk_load(
            self.buildings
                .iter()
                .enumerate()
                .map(|(i, b)| IndexedBox::new(i, b.envelope()))
                .collect(),
        );
        self.wall_tree = RTree::bulk_load(
            self.walls
                .iter()
                .map(|w| IndexedBox::new(w.index, w.envelope()))
                .collect(),
        );
        self.zone_tree = RTree::bulk_load(
            self.ground_zones
                .iter()
                .map(|z| IndexedBox::new(z.index, ring_envelope(&z.ring)))
                .collect(),
        );
        self.frozen = true;
        debug!(
            "Scene frozen: {} buildings, {} walls, {} ground zones, {} terrain triangles, {} warnings",
            self.buildings.len(),
            self.walls.len(),
            self.ground_zones.len(),
            self.tin.as_ref().map_or(0, Tin::triangle_count),
            self.warnings.len()
        );
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Geometry skipped while feeding
    pub fn warnings(&self) -> &[SceneWarning] {
        &self.warnings
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, index: usize) -> Option<&Building> {
        self.buildings.get(index)
    }

    /// Building edges followed by free walls; empty before `finish_feeding`
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, index: usize) -> Option<&Wall> {
        self.walls.get(index)
    }

    pub fn ground_zones(&self) -> &[GroundEffectZone] {
        &self.ground_zones
    }

    pub fn default_ground_coefficient(&self) -> f64 {
        self.default_ground_coefficient
    }

    pub fn tin(&self) -> Option<&Tin> {
        self.tin.as_ref()
    }

    /// Indices of buildings whose bounding box intersects the envelope, ascending.
    pub fn buildings_in_envelope(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        query(&self.building_tree, min, max)
    }

    /// Indices of walls whose bounding box intersects the envelope, ascending.
    pub fn walls_in_envelope(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        query(&self.wall_tree, min, max)
    }

    /// Indices of ground zones whose bounding box intersects the envelope, ascending.
    pub fn ground_zones_in_envelope(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        query(&self.zone_tree, min, max)
    }

    /// Closest building to `p` with its horizontal distance (0 when inside).
    pub fn nearest_building(&self, p: &Coord2) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (entry, box_distance_2) in self.building_tree.nearest_neighbor_iter_with_distance_2(&[p.x, p.y]) {
            if best.is_some_and(|(_, d)| box_distance_2 > d * d) {
                break;
            }
            let d = self.buildings[entry.index].distance_to(p);
            if best.is_none_or(|(i, bd)| d < bd || (d == bd && entry.index < i)) {
                best = Some((entry.index, d));
            }
        }
        best
    }

    /// Terrain elevation at `p`, `None` outside the triangulation or without topography.
    pub fn ground_elevation(&self, p: &Coord2) -> Option<f64> {
        self.tin.as_ref().and_then(|tin| tin.elevation_at(p))
    }

    /// Terrain elevation at `p`, 0 where unknown
    pub fn ground_z(&self, p: &Coord2) -> f64 {
        self.ground_elevation(p).unwrap_or(0.0)
    }

    /// Roof elevation of a building
    pub fn roof_elevation(&self, building: usize) -> Option<f64> {
        self.buildings.get(building).map(Building::roof_elevation)
    }

    /// Angular window used by the side hull: every convex corner
    pub fn default_wide_angle_window() -> (f64, f64) {
        (PI + WIDE_ANGLE_EPSILON, 2.0 * PI)
    }

    /// Corners of `building` whose free-field opening angle lies strictly inside
    /// `(min_angle, max_angle)`, pushed outward along the bisector by
    /// [`WIDE_ANGLE_TRANSLATION_EPSILON`].
    ///
    /// Points follow ring order and the list is closed (first point repeated). Elevations
    /// are the roof plus the same epsilon.
    pub fn wide_angle_points(&self, building: usize, min_angle: f64, max_angle: f64) -> Vec<Coordinate> {
        let Some(b) = self.buildings.get(building) else {
            return Vec::new();
        };
        let ring = b.ring();
        let n = ring.len();
        let z = b.roof_elevation() + WIDE_ANGLE_TRANSLATION_EPSILON;
        let mut out = Vec::new();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let to_prev = (prev - cur).y.atan2((prev - cur).x);
            let to_next = (next - cur).y.atan2((next - cur).x);
            let mut open = to_next - to_prev;
            while open <= -PI {
                open += 2.0 * PI;
            }
            while open > PI {
                open -= 2.0 * PI;
            }
            if open < 0.0 {
                open += 2.0 * PI;
            }
            if open > min_angle && open < max_angle {
                let bisector = to_prev + open / 2.0;
                out.push(Coordinate::new(
                    cur.x + bisector.cos() * WIDE_ANGLE_TRANSLATION_EPSILON,
                    cur.y + bisector.sin() * WIDE_ANGLE_TRANSLATION_EPSILON,
                    z,
                ));
            }
        }
        if let Some(first) = out.first().copied() {
            out.push(first);
        }
        out
    }
}
