use super::{LonLat, Vec2, meters_per_degree_lat, meters_per_degree_lon};

/// Reference latitudes are limited to this magnitude; at the poles the
/// east-west scale vanishes.
pub const MAX_REFERENCE_LAT_DEG: f64 = 89.0;

/// Local equirectangular projection onto a metric plane.
///
/// `x` grows east and `y` grows north, both in meters, measured from `origin`.
/// Scale factors are the WGS84 radii of curvature at `reference_lat_deg`, so
/// distances are accurate near that latitude and the mapping stays affine in
/// (lon, lat). Being affine means rectangles in the plane map to lon/lat
/// rectangles and their centers map to centers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalProjection {
    origin: LonLat,
    reference_lat_deg: f64,
    meters_per_deg_lon: f64,
    meters_per_deg_lat: f64,
}

impl LocalProjection {
    /// `reference_lat_deg` is clamped to [`MAX_REFERENCE_LAT_DEG`].
    pub fn new(origin: LonLat, reference_lat_deg: f64) -> Self {
        let reference_lat_deg =
            reference_lat_deg.clamp(-MAX_REFERENCE_LAT_DEG, MAX_REFERENCE_LAT_DEG);
        Self {
            origin,
            reference_lat_deg,
            meters_per_deg_lon: meters_per_degree_lon(reference_lat_deg),
            meters_per_deg_lat: meters_per_degree_lat(reference_lat_deg),
        }
    }

    pub fn origin(&self) -> LonLat {
        self.origin
    }

    pub fn reference_lat_deg(&self) -> f64 {
        self.reference_lat_deg
    }

    pub fn project(&self, p: LonLat) -> Vec2 {
        Vec2::new(
            (p.lon_deg - self.origin.lon_deg) * self.meters_per_deg_lon,
            (p.lat_deg - self.origin.lat_deg) * self.meters_per_deg_lat,
        )
    }

    pub fn unproject(&self, v: Vec2) -> LonLat {
        LonLat::new(
            self.origin.lon_deg + v.x / self.meters_per_deg_lon,
            self.origin.lat_deg + v.y / self.meters_per_deg_lat,
        )
    }
}
