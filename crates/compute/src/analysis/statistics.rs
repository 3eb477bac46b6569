use crate::grid::CellSet;

/// Closed value interval observed over a cell set.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ValueDomain {
    pub min: f64,
    pub max: f64,
}

impl ValueDomain {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `v` inside the domain, clamped to `[0, 1]`.
    ///
    /// A degenerate domain maps every value to `0`.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 || !span.is_finite() {
            return 0.0;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}

pub struct Statistics;

impl Statistics {
    pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<ValueDomain> {
        let mut it = values.into_iter();
        let first = it.next()?;
        let mut min = first;
        let mut max = first;
        for v in it {
            min = min.min(v);
            max = max.max(v);
        }
        Some(ValueDomain { min, max })
    }

    /// Domain of the aggregated `key` over all cells.
    pub fn domain(cells: &CellSet, key: &str) -> Option<ValueDomain> {
        let col = cells.key_column(key)?;
        Self::min_max(cells.cells().iter().map(|c| c.values[col]))
    }
}

#[cfg(test)]
mod tests {
    use super::{Statistics, ValueDomain};

    #[test]
    fn min_max_works() {
        let d = Statistics::min_max([3.0, -1.0, 7.5]).unwrap();
        assert_eq!(d, ValueDomain { min: -1.0, max: 7.5 });
        assert!(Statistics::min_max(std::iter::empty()).is_none());
    }

    #[test]
    fn normalize_clamps_and_handles_flat_domains() {
        let d = ValueDomain { min: 10.0, max: 20.0 };
        assert_eq!(d.normalize(15.0), 0.5);
        assert_eq!(d.normalize(25.0), 1.0);
        assert_eq!(d.normalize(0.0), 0.0);

        let flat = ValueDomain { min: 5.0, max: 5.0 };
        assert_eq!(flat.normalize(5.0), 0.0);
    }
}
