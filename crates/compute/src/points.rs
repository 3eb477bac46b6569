use std::sync::atomic::{AtomicU64, Ordering};

use foundation::LonLatBounds;
use foundation::math::LonLat;

use crate::grid::GridAnchor;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded point collection.
///
/// Every constructed [`PointCollection`] receives a fresh version, so a
/// version names exactly one immutable set of points for the process
/// lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionVersion(pub u64);

/// A geo-tagged record with one value per weight key of its collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub position: LonLat,
    pub weights: Box<[f64]>,
}

impl Point {
    pub fn new(position: LonLat, weights: impl Into<Box<[f64]>>) -> Self {
        Self {
            position,
            weights: weights.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointError {
    InvalidPosition { index: usize, lon: f64, lat: f64 },
    WeightArity { index: usize, expected: usize, found: usize },
    DuplicateWeightKey(String),
}

impl std::fmt::Display for PointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointError::InvalidPosition { index, lon, lat } => {
                write!(f, "point {index} has invalid position lon={lon} lat={lat}")
            }
            PointError::WeightArity {
                index,
                expected,
                found,
            } => write!(
                f,
                "point {index} carries {found} weights, expected {expected}"
            ),
            PointError::DuplicateWeightKey(key) => write!(f, "duplicate weight key: {key}"),
        }
    }
}

impl std::error::Error for PointError {}

/// Immutable, validated set of points sharing one weight schema.
///
/// Bounds and the grid anchor are derived once at construction; they depend
/// only on the multiset of positions, never on record order.
#[derive(Debug)]
pub struct PointCollection {
    version: CollectionVersion,
    weight_keys: Vec<String>,
    points: Vec<Point>,
    bounds: Option<LonLatBounds>,
    anchor: Option<GridAnchor>,
}

impl PointCollection {
    pub fn new(weight_keys: Vec<String>, points: Vec<Point>) -> Result<Self, PointError> {
        for (i, key) in weight_keys.iter().enumerate() {
            if weight_keys[..i].contains(key) {
                return Err(PointError::DuplicateWeightKey(key.clone()));
            }
        }
        for (index, p) in points.iter().enumerate() {
            if !p.position.is_valid() {
                return Err(PointError::InvalidPosition {
                    index,
                    lon: p.position.lon_deg,
                    lat: p.position.lat_deg,
                });
            }
            if p.weights.len() != weight_keys.len() {
                return Err(PointError::WeightArity {
                    index,
                    expected: weight_keys.len(),
                    found: p.weights.len(),
                });
            }
        }

        let bounds = LonLatBounds::from_points(points.iter().map(|p| p.position));
        let anchor = bounds.as_ref().map(GridAnchor::for_bounds);
        Ok(Self {
            version: CollectionVersion(NEXT_VERSION.fetch_add(1, Ordering::Relaxed)),
            weight_keys,
            points,
            bounds,
            anchor,
        })
    }

    /// Empty collection with the given schema.
    pub fn empty(weight_keys: Vec<String>) -> Result<Self, PointError> {
        Self::new(weight_keys, Vec::new())
    }

    pub fn version(&self) -> CollectionVersion {
        self.version
    }

    pub fn weight_keys(&self) -> &[String] {
        &self.weight_keys
    }

    /// Column of `key` in every point's `weights`.
    pub fn weight_column(&self, key: &str) -> Option<usize> {
        self.weight_keys.iter().position(|k| k == key)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        self.bounds
    }

    /// Grid anchor for this collection, `None` when there are no points.
    pub fn anchor(&self) -> Option<GridAnchor> {
        self.anchor
    }
}
