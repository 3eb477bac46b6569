/// A cell edge length in meters that passed validation against a
/// [`CellSizeRange`].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct CellSize(f64);

impl CellSize {
    pub fn meters(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for CellSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidConfig {
    NotFinite(f64),
    OutOfRange { value: f64, min: f64, max: f64 },
    OffStep { value: f64, min: f64, step: f64 },
    InvalidRange { min: f64, max: f64 },
}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidConfig::NotFinite(v) => write!(f, "cell size must be finite, got {v}"),
            InvalidConfig::OutOfRange { value, min, max } => {
                write!(f, "cell size {value} outside allowed range [{min}, {max}]")
            }
            InvalidConfig::OffStep { value, min, step } => {
                write!(f, "cell size {value} is not {min} plus a multiple of {step}")
            }
            InvalidConfig::InvalidRange { min, max } => {
                write!(f, "invalid cell size range [{min}, {max}]")
            }
        }
    }
}

impl std::error::Error for InvalidConfig {}

// Relative slack when checking step alignment, absorbs decimal round-off
// such as 0.1 + 0.2.
const STEP_TOLERANCE: f64 = 1e-9;

/// Allowed cell sizes: a closed interval, optionally quantized to a step
/// counted from `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSizeRange {
    min: f64,
    max: f64,
    step: Option<f64>,
}

impl Default for CellSizeRange {
    /// 100 m to 1000 m in 100 m steps.
    fn default() -> Self {
        Self {
            min: 100.0,
            max: 1000.0,
            step: Some(100.0),
        }
    }
}

impl CellSizeRange {
    pub fn new(min: f64, max: f64, step: Option<f64>) -> Result<Self, InvalidConfig> {
        let step_ok = step.is_none_or(|s| s.is_finite() && s > 0.0);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && max >= min && step_ok) {
            return Err(InvalidConfig::InvalidRange { min, max });
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> Option<f64> {
        self.step
    }

    /// Checks `candidate` against the range and step.
    ///
    /// Accepted values are snapped onto the step lattice so that inputs like
    /// `300.00000000001` and `300.0` validate to the same cell size.
    pub fn validate(&self, candidate: f64) -> Result<CellSize, InvalidConfig> {
        if !candidate.is_finite() {
            return Err(InvalidConfig::NotFinite(candidate));
        }
        if candidate < self.min || candidate > self.max {
            return Err(InvalidConfig::OutOfRange {
                value: candidate,
                min: self.min,
                max: self.max,
            });
        }
        let Some(step) = self.step else {
            return Ok(CellSize(candidate));
        };

        let k = (candidate - self.min) / step;
        let k_round = k.round();
        if (k - k_round).abs() > STEP_TOLERANCE * k.abs().max(1.0) {
            return Err(InvalidConfig::OffStep {
                value: candidate,
                min: self.min,
                step,
            });
        }
        let snapped = (self.min + k_round * step).clamp(self.min, self.max);
        Ok(CellSize(snapped))
    }

    /// Every allowed value in ascending order; empty without a step.
    pub fn values(&self) -> Vec<CellSize> {
        let Some(step) = self.step else {
            return Vec::new();
        };
        let n = ((self.max - self.min) / step + STEP_TOLERANCE).floor() as u64;
        (0..=n)
            .map(|k| CellSize(self.min + k as f64 * step))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CellSizeRange, InvalidConfig};

    #[test]
    fn accepts_slider_values() {
        let r = CellSizeRange::default();
        for v in [100.0, 200.0, 500.0, 1000.0] {
            assert_eq!(r.validate(v).unwrap().meters(), v);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        let r = CellSizeRange::default();
        assert_eq!(
            r.validate(50.0),
            Err(InvalidConfig::OutOfRange {
                value: 50.0,
                min: 100.0,
                max: 1000.0
            })
        );
        assert!(matches!(
            r.validate(1100.0),
            Err(InvalidConfig::OutOfRange { .. })
        ));
        assert!(matches!(r.validate(-100.0), Err(InvalidConfig::OutOfRange { .. })));
    }

    #[test]
    fn rejects_off_step_and_non_finite() {
        let r = CellSizeRange::default();
        assert!(matches!(r.validate(150.0), Err(InvalidConfig::OffStep { .. })));
        assert!(matches!(r.validate(f64::NAN), Err(InvalidConfig::NotFinite(_))));
        assert!(matches!(
            r.validate(f64::INFINITY),
            Err(InvalidConfig::NotFinite(_))
        ));
    }

    #[test]
    fn snaps_round_off_onto_step() {
        let r = CellSizeRange::new(0.1, 1.0, Some(0.1)).unwrap();
        let v = r.validate(0.1 + 0.2).unwrap();
        assert!((v.meters() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn continuous_range_accepts_any_inner_value() {
        let r = CellSizeRange::new(100.0, 1000.0, None).unwrap();
        assert_eq!(r.validate(123.4).unwrap().meters(), 123.4);
        assert!(r.values().is_empty());
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(CellSizeRange::new(0.0, 10.0, None).is_err());
        assert!(CellSizeRange::new(10.0, 5.0, None).is_err());
        assert!(CellSizeRange::new(10.0, 50.0, Some(0.0)).is_err());
    }

    #[test]
    fn lists_step_values() {
        let values: Vec<f64> = CellSizeRange::default()
            .values()
            .into_iter()
            .map(|c| c.meters())
            .collect();
        assert_eq!(values.len(), 10);
        assert_eq!(values.first(), Some(&100.0));
        assert_eq!(values.last(), Some(&1000.0));
    }
}
