/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geographic position in degrees (WGS84).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    /// True when both components are finite and inside the WGS84 domain.
    pub fn is_valid(self) -> bool {
        self.lon_deg.is_finite()
            && self.lat_deg.is_finite()
            && (-180.0..=180.0).contains(&self.lon_deg)
            && (-90.0..=90.0).contains(&self.lat_deg)
    }

    /// Nearest position inside the WGS84 domain.
    pub fn clamped(self) -> Self {
        Self {
            lon_deg: self.lon_deg.clamp(-180.0, 180.0),
            lat_deg: self.lat_deg.clamp(-90.0, 90.0),
        }
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

/// Meridional radius of curvature `M` at the given latitude (meters).
pub fn meridional_radius(lat_rad: f64) -> f64 {
    let s = lat_rad.sin();
    let w2 = 1.0 - WGS84_E2 * s * s;
    WGS84_A * (1.0 - WGS84_E2) / (w2 * w2.sqrt())
}

/// Prime-vertical radius of curvature `N` at the given latitude (meters).
pub fn prime_vertical_radius(lat_rad: f64) -> f64 {
    let s = lat_rad.sin();
    WGS84_A / (1.0 - WGS84_E2 * s * s).sqrt()
}

/// Ground distance covered by one degree of latitude at `lat_deg`.
pub fn meters_per_degree_lat(lat_deg: f64) -> f64 {
    meridional_radius(lat_deg.to_radians()).to_radians()
}

/// Ground distance covered by one degree of longitude at `lat_deg`.
pub fn meters_per_degree_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    (prime_vertical_radius(lat_rad) * lat_rad.cos()).to_radians()
}
