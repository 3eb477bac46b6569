use std::collections::BTreeMap;

use foundation::LonLatBounds;
use foundation::math::{LonLat, stable_sum};

use super::anchor::{CellIndex, GridAnchor};
use super::config::{CellSize, InvalidConfig};
use crate::points::{CollectionVersion, PointCollection};

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateError {
    InvalidConfig(InvalidConfig),
    UnknownWeightKey(String),
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::InvalidConfig(e) => write!(f, "invalid grid config: {e}"),
            AggregateError::UnknownWeightKey(key) => write!(f, "unknown weight key: {key}"),
        }
    }
}

impl std::error::Error for AggregateError {}

impl From<InvalidConfig> for AggregateError {
    fn from(e: InvalidConfig) -> Self {
        AggregateError::InvalidConfig(e)
    }
}

/// One populated grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub index: CellIndex,
    pub centroid: LonLat,
    /// Number of points assigned to the cell, always at least one.
    pub count: usize,
    /// SUM per weight key, in the order of [`CellSet::weight_keys`].
    pub values: Vec<f64>,
}

/// The `{centroid, elevation, color}` row handed to a renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderCell {
    pub index: CellIndex,
    pub centroid: LonLat,
    pub elevation_value: f64,
    pub color_value: f64,
}

/// Result of one aggregation pass; a pure function of
/// `(collection, cell size, weight keys)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSet {
    cell_size: CellSize,
    version: CollectionVersion,
    anchor: Option<GridAnchor>,
    weight_keys: Vec<String>,
    cells: Vec<Cell>,
}

impl CellSet {
    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    pub fn version(&self) -> CollectionVersion {
        self.version
    }

    pub fn anchor(&self) -> Option<GridAnchor> {
        self.anchor
    }

    pub fn weight_keys(&self) -> &[String] {
        &self.weight_keys
    }

    /// Populated cells sorted by index.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn key_column(&self, key: &str) -> Option<usize> {
        self.weight_keys.iter().position(|k| k == key)
    }

    pub fn value(&self, cell: &Cell, key: &str) -> Option<f64> {
        self.key_column(key).and_then(|c| cell.values.get(c).copied())
    }

    /// Number of points across all cells.
    pub fn point_count(&self) -> usize {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Sum of `key` over every cell.
    pub fn total(&self, key: &str) -> Option<f64> {
        let col = self.key_column(key)?;
        let mut values: Vec<f64> = self.cells.iter().map(|c| c.values[col]).collect();
        Some(stable_sum(&mut values))
    }

    pub fn get(&self, index: CellIndex) -> Option<&Cell> {
        self.cells
            .binary_search_by(|c| c.index.cmp(&index))
            .ok()
            .map(|i| &self.cells[i])
    }

    /// Populated cell containing `p`, if any.
    pub fn cell_at(&self, p: LonLat) -> Option<&Cell> {
        let anchor = self.anchor?;
        self.get(anchor.cell_index(p, self.cell_size))
    }

    pub fn cell_bounds(&self, index: CellIndex) -> Option<LonLatBounds> {
        self.anchor.map(|a| a.cell_bounds(index, self.cell_size))
    }

    pub fn render_cells(
        &self,
        elevation_key: &str,
        color_key: &str,
    ) -> Result<Vec<RenderCell>, AggregateError> {
        let elevation = self
            .key_column(elevation_key)
            .ok_or_else(|| AggregateError::UnknownWeightKey(elevation_key.to_string()))?;
        let color = self
            .key_column(color_key)
            .ok_or_else(|| AggregateError::UnknownWeightKey(color_key.to_string()))?;
        Ok(self
            .cells
            .iter()
            .map(|c| RenderCell {
                index: c.index,
                centroid: c.centroid,
                elevation_value: c.values[elevation],
                color_value: c.values[color],
            })
            .collect())
    }
}

/// Bins `points` into square cells of `cell_size` and sums each requested
/// weight per cell.
///
/// Empty regions produce no cells. Member weights are summed with
/// [`stable_sum`], so the output is bit-identical for any ordering of the
/// input records. Duplicate keys are collapsed to their first occurrence.
pub fn aggregate<S: AsRef<str>>(
    points: &PointCollection,
    cell_size: CellSize,
    weight_keys: &[S],
) -> Result<CellSet, AggregateError> {
    let mut keys: Vec<String> = Vec::with_capacity(weight_keys.len());
    let mut columns: Vec<usize> = Vec::with_capacity(weight_keys.len());
    for key in weight_keys {
        let key = key.as_ref();
        if keys.iter().any(|k| k == key) {
            continue;
        }
        let col = points
            .weight_column(key)
            .ok_or_else(|| AggregateError::UnknownWeightKey(key.to_string()))?;
        keys.push(key.to_string());
        columns.push(col);
    }

    let anchor = points.anchor();
    let mut cells = Vec::new();
    if let Some(anchor) = anchor {
        let mut members: BTreeMap<CellIndex, Vec<usize>> = BTreeMap::new();
        for (i, p) in points.points().iter().enumerate() {
            members
                .entry(anchor.cell_index(p.position, cell_size))
                .or_default()
                .push(i);
        }

        cells.reserve(members.len());
        let mut scratch: Vec<f64> = Vec::new();
        for (index, member_ids) in members {
            let values = columns
                .iter()
                .map(|&col| {
                    scratch.clear();
                    scratch.extend(member_ids.iter().map(|&i| points.points()[i].weights[col]));
                    stable_sum(&mut scratch)
                })
                .collect();
            cells.push(Cell {
                index,
                centroid: anchor.cell_centroid(index, cell_size),
                count: member_ids.len(),
                values,
            });
        }
    }

    Ok(CellSet {
        cell_size,
        version: points.version(),
        anchor,
        weight_keys: keys,
        cells,
    })
}
