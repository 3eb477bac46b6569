use crate::math::LonLat;

/// Geographic bounding box in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLatBounds {
    pub min: LonLat,
    pub max: LonLat,
}

impl LonLatBounds {
    pub fn new(min: LonLat, max: LonLat) -> Self {
        Self { min, max }
    }

    pub fn from_point(p: LonLat) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    ///
    /// Uses only min/max, so the result does not depend on iteration order.
    pub fn from_points(points: impl IntoIterator<Item = LonLat>) -> Option<Self> {
        let mut it = points.into_iter();
        let mut bounds = Self::from_point(it.next()?);
        for p in it {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LonLat) {
        self.min.lon_deg = self.min.lon_deg.min(p.lon_deg);
        self.min.lat_deg = self.min.lat_deg.min(p.lat_deg);
        self.max.lon_deg = self.max.lon_deg.max(p.lon_deg);
        self.max.lat_deg = self.max.lat_deg.max(p.lat_deg);
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            0.5 * (self.min.lon_deg + self.max.lon_deg),
            0.5 * (self.min.lat_deg + self.max.lat_deg),
        )
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon_deg >= self.min.lon_deg
            && p.lon_deg <= self.max.lon_deg
            && p.lat_deg >= self.min.lat_deg
            && p.lat_deg <= self.max.lat_deg
    }
}
