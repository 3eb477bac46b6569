//! Serialized views of an aggregated cell set.

use compute::CellSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellExport {
    pub version: String,
    pub cell_size_m: f64,
    pub weight_keys: Vec<String>,
    /// `[lon, lat]` of the grid origin; absent for an empty grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    pub cells: Vec<CellRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellRecord {
    pub i: i64,
    pub j: i64,
    pub centroid: [f64; 2],
    pub count: usize,
    /// Per-key sums, in `weight_keys` order.
    pub values: Vec<f64>,
}

impl CellExport {
    pub fn from_cells(cells: &CellSet, source_hash: Option<String>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            cell_size_m: cells.cell_size().meters(),
            weight_keys: cells.weight_keys().to_vec(),
            origin: cells.anchor().map(|a| a.origin().as_array()),
            source_hash,
            cells: cells
                .cells()
                .iter()
                .map(|c| CellRecord {
                    i: c.index.i,
                    j: c.index.j,
                    centroid: c.centroid.as_array(),
                    count: c.count,
                    values: c.values.clone(),
                })
                .collect(),
        }
    }
}

/// GeoJSON FeatureCollection with one square polygon per populated cell.
///
/// Properties carry the cell index, the member count and one entry per
/// weight key.
pub fn cells_to_geojson(cells: &CellSet) -> Value {
    let mut features = Vec::with_capacity(cells.len());
    for cell in cells.cells() {
        let Some(b) = cells.cell_bounds(cell.index) else {
            continue;
        };
        let ring = vec![
            position(b.min.lon_deg, b.min.lat_deg),
            position(b.max.lon_deg, b.min.lat_deg),
            position(b.max.lon_deg, b.max.lat_deg),
            position(b.min.lon_deg, b.max.lat_deg),
            position(b.min.lon_deg, b.min.lat_deg),
        ];

        let mut geometry = Map::new();
        geometry.insert("type".to_string(), Value::String("Polygon".to_string()));
        geometry.insert(
            "coordinates".to_string(),
            Value::Array(vec![Value::Array(ring)]),
        );

        let mut props = Map::new();
        props.insert("i".to_string(), Value::from(cell.index.i));
        props.insert("j".to_string(), Value::from(cell.index.j));
        props.insert("count".to_string(), Value::from(cell.count));
        for (key, v) in cells.weight_keys().iter().zip(&cell.values) {
            props.insert(key.clone(), Value::from(*v));
        }

        let mut feature = Map::new();
        feature.insert("type".to_string(), Value::String("Feature".to_string()));
        feature.insert("geometry".to_string(), Value::Object(geometry));
        feature.insert("properties".to_string(), Value::Object(props));
        features.push(Value::Object(feature));
    }

    let mut root = Map::new();
    root.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    root.insert("features".to_string(), Value::Array(features));
    Value::Object(root)
}

fn position(lon: f64, lat: f64) -> Value {
    Value::Array(vec![Value::from(lon), Value::from(lat)])
}

#[cfg(test)]
mod tests {
    use super::{CellExport, cells_to_geojson};
    use compute::{CellSizeRange, Point, PointCollection, aggregate};
    use foundation::math::LonLat;

    fn sample() -> compute::CellSet {
        let keys = vec!["B22BTOT".to_string()];
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
    fn export_survives_json() {
        let set = sample();
        let export = CellExport::from_cells(&set, Some("abc".into()));
        assert_eq!(export.cells.len(), 2);
        assert_eq!(export.origin, Some([8.0, 46.0]));
        assert_eq!(export.cells[0].values, vec![15.0]);
        assert_eq!(export.cells[0].count, 2);

        let bytes = serde_json::to_vec(&export).unwrap();
        let back: CellExport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, export);
    }

    #[test]
    fn geojson_has_closed_square_rings() {
        let set = sample();
        let gj = cells_to_geojson(&set);
        assert_eq!(gj["type"], "FeatureCollection");
        let features = gj["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        let first = &features[0];
        assert_eq!(first["geometry"]["type"], "Polygon");
        let ring = first["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[0][0].as_f64(), Some(8.0));
        assert_eq!(ring[0][1].as_f64(), Some(46.0));
        assert_eq!(first["properties"]["count"], 2);
        assert_eq!(first["properties"]["B22BTOT"].as_f64(), Some(15.0));
    }

    #[test]
    fn empty_set_exports_empty_collection() {
        let keys = vec!["w".to_string()];
        let c = PointCollection::empty(keys.clone()).unwrap();
        let size = CellSizeRange::default().validate(100.0).unwrap();
        let set = aggregate(&c, size, &keys).unwrap();

        assert!(cells_to_geojson(&set)["features"].as_array().unwrap().is_empty());
        let export = CellExport::from_cells(&set, None);
        assert!(export.origin.is_none());
        assert!(export.cells.is_empty());
    }
}
