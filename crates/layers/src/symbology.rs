use compute::analysis::ValueDomain;
use serde::Serialize;

/// Yellow to dark blue, lowest to highest.
pub const POPULATION_RAMP: [[u8; 3]; 8] = [
    [255, 255, 204],
    [199, 233, 180],
    [127, 205, 187],
    [29, 145, 192],
    [8, 104, 172],
    [8, 78, 158],
    [8, 48, 107],
    [4, 24, 87],
];

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub visible: bool,
    pub opacity: f32,
    pub extruded: bool,
    pub pickable: bool,
}

impl LayerStyle {
    pub const fn new(visible: bool, opacity: f32, extruded: bool, pickable: bool) -> Self {
        Self {
            visible,
            opacity,
            extruded,
            pickable,
        }
    }

    /// Opacity as an 8-bit alpha channel.
    pub fn alpha(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::new(true, 0.4, true, true)
    }
}

/// Quantize scale over a fixed list of colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorRamp {
    colors: Vec<[u8; 3]>,
}

impl ColorRamp {
    /// Returns `None` for an empty color list.
    pub fn new(colors: Vec<[u8; 3]>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self { colors })
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Bin of `value` when `domain` is split into equal-width bins, one per color.
    ///
    /// The domain maximum falls into the last bin; a degenerate domain maps
    /// everything to the first.
    pub fn quantize(&self, value: f64, domain: &ValueDomain) -> usize {
        let n = self.colors.len();
        let t = domain.normalize(value);
        ((t * n as f64).floor() as usize).min(n - 1)
    }

    pub fn color(&self, value: f64, domain: &ValueDomain) -> [u8; 3] {
        self.colors[self.quantize(value, domain)]
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            colors: POPULATION_RAMP.to_vec(),
        }
    }
}

/// Linear map from aggregated values to column heights in meters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ElevationMapping {
    pub range: [f64; 2],
    pub scale: f64,
}

impl ElevationMapping {
    pub fn elevation_m(&self, value: f64, domain: &ValueDomain) -> f64 {
        let [lo, hi] = self.range;
        (lo + domain.normalize(value) * (hi - lo)) * self.scale
    }
}

impl Default for ElevationMapping {
    fn default() -> Self {
        Self {
            range: [0.0, 1000.0],
            scale: 40.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorRamp, ElevationMapping, LayerStyle, POPULATION_RAMP};
    use compute::analysis::ValueDomain;

    const DOMAIN: ValueDomain = ValueDomain { min: 0.0, max: 80.0 };

    #[test]
    fn quantize_uses_equal_width_bins() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.quantize(0.0, &DOMAIN), 0);
        assert_eq!(ramp.quantize(9.99, &DOMAIN), 0);
        assert_eq!(ramp.quantize(10.0, &DOMAIN), 1);
        assert_eq!(ramp.quantize(45.0, &DOMAIN), 4);
        assert_eq!(ramp.quantize(80.0, &DOMAIN), 7);
        assert_eq!(ramp.quantize(500.0, &DOMAIN), 7);
        assert_eq!(ramp.quantize(-3.0, &DOMAIN), 0);
    }

    #[test]
    fn extremes_get_ramp_ends() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.color(0.0, &DOMAIN), POPULATION_RAMP[0]);
        assert_eq!(ramp.color(80.0, &DOMAIN), [4, 24, 87]);

        let flat = ValueDomain { min: 7.0, max: 7.0 };
        assert_eq!(ramp.color(7.0, &flat), [255, 255, 204]);
    }

    #[test]
    fn empty_ramp_is_rejected() {
        assert!(ColorRamp::new(Vec::new()).is_none());
        let single = ColorRamp::new(vec![[1, 2, 3]]).unwrap();
        assert_eq!(single.color(40.0, &DOMAIN), [1, 2, 3]);
    }

    #[test]
    fn elevation_is_scaled_linear_map() {
        let e = ElevationMapping::default();
        assert_eq!(e.elevation_m(0.0, &DOMAIN), 0.0);
        assert_eq!(e.elevation_m(40.0, &DOMAIN), 500.0 * 40.0);
        assert_eq!(e.elevation_m(80.0, &DOMAIN), 1000.0 * 40.0);
    }

    #[test]
    fn default_style_matches_population_layer() {
        let s = LayerStyle::default();
        assert!(s.visible && s.extruded && s.pickable);
        assert_eq!(s.opacity, 0.4);
        assert_eq!(s.alpha(), 102);
    }
}
