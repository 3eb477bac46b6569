//! Extruded grid layer over an aggregated cell set.

use compute::analysis::{Statistics, ValueDomain};
use compute::{AggregateError, CellSet};
use foundation::math::LonLat;
use serde::Serialize;

use crate::layer::{Layer, LayerId};
use crate::symbology::{ColorRamp, ElevationMapping, LayerStyle};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

impl Default for ViewState {
    /// Centered on Switzerland.
    fn default() -> Self {
        Self {
            latitude: 46.8182,
            longitude: 8.2275,
            zoom: 7.0,
            bearing: 0.0,
            pitch: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayerProps {
    pub view_state: ViewState,
    pub style: LayerStyle,
    pub color_ramp: ColorRamp,
    pub elevation: ElevationMapping,
}

impl Default for GridLayerProps {
    fn default() -> Self {
        Self {
            view_state: ViewState::default(),
            style: LayerStyle::default(),
            color_ramp: ColorRamp::default(),
            elevation: ElevationMapping::default(),
        }
    }
}

/// One extruded column per populated cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub index: [i64; 2],
    pub position: [f64; 2],
    pub cell_size_m: f64,
    pub elevation_value: f64,
    pub color_value: f64,
    pub elevation_m: f64,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickInfo {
    pub index: [i64; 2],
    pub position: [f64; 2],
    pub count: usize,
    /// `(key, sum)` in the cell set's key order.
    pub values: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    id: LayerId,
    pub props: GridLayerProps,
    elevation_key: String,
    color_key: String,
}

impl GridLayer {
    pub fn new(
        id: impl Into<String>,
        elevation_key: impl Into<String>,
        color_key: impl Into<String>,
    ) -> Self {
        Self {
            id: LayerId::new(id),
            props: GridLayerProps::default(),
            elevation_key: elevation_key.into(),
            color_key: color_key.into(),
        }
    }

    pub fn elevation_key(&self) -> &str {
        &self.elevation_key
    }

    pub fn color_key(&self) -> &str {
        &self.color_key
    }

    /// Column instances for every cell, colored and scaled against the value
    /// domains of this set.
    pub fn columns(&self, cells: &CellSet) -> Result<Vec<Column>, AggregateError> {
        let rows = cells.render_cells(&self.elevation_key, &self.color_key)?;
        let flat = ValueDomain { min: 0.0, max: 0.0 };
        let elevation_domain = Statistics::domain(cells, &self.elevation_key).unwrap_or(flat);
        let color_domain = Statistics::domain(cells, &self.color_key).unwrap_or(flat);
        let alpha = self.props.style.alpha();
        let extruded = self.props.style.extruded;

        Ok(rows
            .into_iter()
            .map(|r| {
                let [red, green, blue] = self.props.color_ramp.color(r.color_value, &color_domain);
                let elevation_m = if extruded {
                    self.props.elevation.elevation_m(r.elevation_value, &elevation_domain)
                } else {
                    0.0
                };
                Column {
                    index: [r.index.i, r.index.j],
                    position: r.centroid.as_array(),
                    cell_size_m: cells.cell_size().meters(),
                    elevation_value: r.elevation_value,
                    color_value: r.color_value,
                    elevation_m,
                    color: [red, green, blue, alpha],
                }
            })
            .collect())
    }

    /// Populated cell under `p`; `None` if the layer is not pickable.
    pub fn pick(&self, cells: &CellSet, p: LonLat) -> Option<PickInfo> {
        if !self.props.style.pickable {
            return None;
        }
        let cell = cells.cell_at(p)?;
        Some(PickInfo {
            index: [cell.index.i, cell.index.j],
            position: cell.centroid.as_array(),
            count: cell.count,
            values: cells
                .weight_keys()
                .iter()
                .cloned()
                .zip(cell.values.iter().copied())
                .collect(),
        })
    }
}

impl Layer for GridLayer {
    fn id(&self) -> &LayerId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::GridLayer;
    use crate::layer::Layer;
    use crate::symbology::POPULATION_RAMP;
    use compute::{AggregateError, CellSet, CellSizeRange, Point, PointCollection, aggregate};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    const KEY: &str = "B22BTOT";

    fn statpop_cells() -> CellSet {
        let keys = vec![KEY.to_string()];
        let pts = vec![
            Point::new(LonLat::new(8.0, 46.0), vec![10.0]),
            Point::new(LonLat::new(8.0005, 46.0003), vec![5.0]),
            Point::new(LonLat::new(9.0, 47.0), vec![7.0]),
        ];
        let c = PointCollection::new(keys.clone(), pts).unwrap();
        let size = CellSizeRange::default().validate(100.0).unwrap();
        aggregate(&c, size, &keys).unwrap()
    }

    #[test]
    fn columns_span_ramp_and_elevation_range() {
        let layer = GridLayer::new("grid-layer", KEY, KEY);
        let cols = layer.columns(&statpop_cells()).unwrap();
        assert_eq!(cols.len(), 2);

        // (0,0) holds 15, the maximum; (767,1111) holds 7, the minimum.
        assert_eq!(cols[0].index, [0, 0]);
        assert_eq!(cols[0].color_value, 15.0);
        assert_eq!(cols[0].elevation_m, 40_000.0);
        let [r, g, b] = POPULATION_RAMP[7];
        assert_eq!(cols[0].color, [r, g, b, 102]);

        assert_eq!(cols[1].color_value, 7.0);
        assert_eq!(cols[1].elevation_m, 0.0);
        let [r, g, b] = POPULATION_RAMP[0];
        assert_eq!(cols[1].color, [r, g, b, 102]);
        assert!(cols.iter().all(|c| c.cell_size_m == 100.0));
    }

    #[test]
    fn flat_layer_has_no_height() {
        let mut layer = GridLayer::new("grid-layer", KEY, KEY);
        layer.props.style.extruded = false;
        let cols = layer.columns(&statpop_cells()).unwrap();
        assert!(cols.iter().all(|c| c.elevation_m == 0.0));
    }

    #[test]
    fn unknown_key_is_reported() {
        let layer = GridLayer::new("grid-layer", "B21BTOT", KEY);
        assert!(matches!(
            layer.columns(&statpop_cells()),
            Err(AggregateError::UnknownWeightKey(k)) if k == "B21BTOT"
        ));
    }

    #[test]
    fn pick_resolves_populated_cells_only() {
        let layer = GridLayer::new("grid-layer", KEY, KEY);
        let cells = statpop_cells();

        let hit = layer.pick(&cells, LonLat::new(8.0003, 46.0001)).unwrap();
        assert_eq!(hit.index, [0, 0]);
        assert_eq!(hit.count, 2);
        assert_eq!(hit.values, vec![(KEY.to_string(), 15.0)]);

        assert!(layer.pick(&cells, LonLat::new(8.5, 46.5)).is_none());

        let mut hidden = layer.clone();
        hidden.props.style.pickable = false;
        assert!(hidden.pick(&cells, LonLat::new(8.0, 46.0)).is_none());
    }

    #[test]
    fn defaults_center_on_switzerland() {
        let layer = GridLayer::new("grid-layer", KEY, KEY);
        assert_eq!(layer.id().as_str(), "grid-layer");
        let v = layer.props.view_state;
        assert_eq!((v.latitude, v.longitude, v.zoom), (46.8182, 8.2275, 7.0));
        assert_eq!((v.bearing, v.pitch), (0.0, 30.0));
        assert_eq!(layer.props.elevation.scale, 40.0);
    }
}
