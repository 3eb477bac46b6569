use foundation::LonLatBounds;
use foundation::math::{LocalProjection, LonLat, Vec2};

use super::config::CellSize;

/// Integer address of a grid cell; `i` counts east, `j` counts north.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellIndex {
    pub i: i64,
    pub j: i64,
}

impl CellIndex {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }
}

/// Index of the cell holding a projected position.
///
/// Cells are half-open, `[k * size, (k + 1) * size)` on both axes, so a point
/// on the line shared by cells `k - 1` and `k` belongs to `k`: every cell owns
/// its south and west edges.
///
/// Note: this is the `floor` rule. A shared line therefore goes to the
/// north/east neighbour `k`, not to the lower-index (south/west) cell `k - 1`.
pub fn cell_index_of(projected: Vec2, cell_size_m: f64) -> CellIndex {
    CellIndex::new(
        (projected.x / cell_size_m).floor() as i64,
        (projected.y / cell_size_m).floor() as i64,
    )
}

/// Fixes where the grid lies on the ground.
///
/// The origin is a corner shared by four cells for every cell size, so grids
/// of different sizes over the same anchor never drift against each other.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridAnchor {
    projection: LocalProjection,
}

impl GridAnchor {
    pub fn new(origin: LonLat, reference_lat_deg: f64) -> Self {
        Self {
            projection: LocalProjection::new(origin, reference_lat_deg),
        }
    }

    /// South-west corner of `bounds` as origin, measured at its mid latitude.
    pub fn for_bounds(bounds: &LonLatBounds) -> Self {
        Self::new(bounds.min, bounds.center().lat_deg)
    }

    pub fn origin(&self) -> LonLat {
        self.projection.origin()
    }

    pub fn reference_lat_deg(&self) -> f64 {
        self.projection.reference_lat_deg()
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub fn cell_index(&self, p: LonLat, cell_size: CellSize) -> CellIndex {
        cell_index_of(self.projection.project(p), cell_size.meters())
    }

    /// Geographic extent of the cell, cut off at the edges of the WGS84 domain.
    pub fn cell_bounds(&self, index: CellIndex, cell_size: CellSize) -> LonLatBounds {
        let s = cell_size.meters();
        let sw = Vec2::new(index.i as f64, index.j as f64).scale(s);
        let ne = sw + Vec2::new(s, s);
        LonLatBounds::new(
            self.projection.unproject(sw).clamped(),
            self.projection.unproject(ne).clamped(),
        )
    }

    /// Geometric center of the cell in geographic coordinates.
    ///
    /// Cells reaching past a pole or the antimeridian get their center
    /// clamped into the WGS84 domain. It then still lies inside the cell,
    /// since every populated cell holds at least one valid position.
    pub fn cell_centroid(&self, index: CellIndex, cell_size: CellSize) -> LonLat {
        let s = cell_size.meters();
        let center = Vec2::new(index.i as f64 + 0.5, index.j as f64 + 0.5).scale(s);
        self.projection.unproject(center).clamped()
    }
}
