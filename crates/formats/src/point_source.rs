//! Point source decoding.
//!
//! The source is a JSON array of flat records, e.g.
//! `[{"LON": 8.0, "LAT": 46.0, "B22BTOT": 10}, ...]`. Extra fields are ignored.

use compute::{Point, PointCollection, PointError};
use foundation::math::LonLat;
use serde_json::{Map, Value};

/// Which record fields carry the position and the weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSchema {
    pub lon_field: String,
    pub lat_field: String,
    pub weight_fields: Vec<String>,
}

impl Default for PointSchema {
    fn default() -> Self {
        Self {
            lon_field: "LON".to_string(),
            lat_field: "LAT".to_string(),
            weight_fields: vec!["B22BTOT".to_string()],
        }
    }
}

#[derive(Debug)]
pub enum PointSourceError {
    Json(serde_json::Error),
    NotAnArray,
    NotAnObject { row: usize },
    MissingField { row: usize, field: String },
    InvalidNumber { row: usize, field: String },
    Points(PointError),
}

impl std::fmt::Display for PointSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointSourceError::Json(e) => write!(f, "JSON parse error: {e}"),
            PointSourceError::NotAnArray => write!(f, "expected a JSON array of records"),
            PointSourceError::NotAnObject { row } => write!(f, "record {row} is not an object"),
            PointSourceError::MissingField { row, field } => {
                write!(f, "record {row} is missing field {field}")
            }
            PointSourceError::InvalidNumber { row, field } => {
                write!(f, "record {row} field {field} is not a number")
            }
            PointSourceError::Points(e) => write!(f, "invalid point data: {e}"),
        }
    }
}

impl std::error::Error for PointSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PointSourceError::Json(e) => Some(e),
            PointSourceError::Points(e) => Some(e),
            _ => None,
        }
    }
}

/// A decoded point source.
#[derive(Debug)]
pub struct PointSource {
    pub collection: PointCollection,
    /// blake3 hex digest of the raw payload.
    pub content_hash: String,
}

pub fn decode_points(bytes: &[u8], schema: &PointSchema) -> Result<PointSource, PointSourceError> {
    let value: Value = serde_json::from_slice(bytes).map_err(PointSourceError::Json)?;
    let collection = points_from_value(&value, schema)?;
    Ok(PointSource {
        collection,
        content_hash: blake3::hash(bytes).to_hex().to_string(),
    })
}

pub fn points_from_value(
    value: &Value,
    schema: &PointSchema,
) -> Result<PointCollection, PointSourceError> {
    let rows = value.as_array().ok_or(PointSourceError::NotAnArray)?;

    let mut points = Vec::with_capacity(rows.len());
    for (row, record) in rows.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or(PointSourceError::NotAnObject { row })?;
        let lon = number_field(obj, row, &schema.lon_field)?;
        let lat = number_field(obj, row, &schema.lat_field)?;
        let weights = schema
            .weight_fields
            .iter()
            .map(|field| number_field(obj, row, field))
            .collect::<Result<Vec<f64>, _>>()?;
        points.push(Point::new(LonLat::new(lon, lat), weights));
    }

    PointCollection::new(schema.weight_fields.clone(), points).map_err(PointSourceError::Points)
}

// Numbers may also arrive as numeric strings in CSV-derived exports.
fn number_field(obj: &Map<String, Value>, row: usize, field: &str) -> Result<f64, PointSourceError> {
    let invalid = || PointSourceError::InvalidNumber {
        row,
        field: field.to_string(),
    };
    match obj.get(field) {
        None | Some(Value::Null) => Err(PointSourceError::MissingField {
            row,
            field: field.to_string(),
        }),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::{PointSchema, PointSourceError, decode_points};
    use compute::PointError;
    use foundation::math::LonLat;

    const SAMPLE: &str = r#"[
        {"RELI": 1, "LON": 8.0, "LAT": 46.0, "B22BTOT": 10},
        {"RELI": 2, "LON": 8.0005, "LAT": 46.0003, "B22BTOT": 5},
        {"RELI": 3, "LON": "9.0", "LAT": 47.0, "B22BTOT": 7.0}
    ]"#;

    #[test]
    fn decodes_statpop_records() {
        let src = decode_points(SAMPLE.as_bytes(), &PointSchema::default()).unwrap();
        let points = src.collection.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].position, LonLat::new(9.0, 47.0));
        assert_eq!(&*points[1].weights, &[5.0]);
        assert_eq!(src.collection.weight_keys(), &["B22BTOT".to_string()]);
        assert_eq!(src.content_hash.len(), 64);
    }

    #[test]
    fn hash_tracks_payload_bytes() {
        let a = decode_points(SAMPLE.as_bytes(), &PointSchema::default()).unwrap();
        let b = decode_points(SAMPLE.as_bytes(), &PointSchema::default()).unwrap();
        let c = decode_points(b"[]", &PointSchema::default()).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
        assert!(c.collection.is_empty());
    }

    #[test]
    fn reports_missing_weight() {
        let payload = r#"[{"LON": 8.0, "LAT": 46.0}]"#;
        let err = decode_points(payload.as_bytes(), &PointSchema::default()).unwrap_err();
        assert!(matches!(
            err,
            PointSourceError::MissingField { row: 0, ref field } if field == "B22BTOT"
        ));
    }

    #[test]
    fn reports_non_numeric_field() {
        let payload = r#"[{"LON": 8.0, "LAT": 46.0, "B22BTOT": 1}, {"LON": true, "LAT": 46.0, "B22BTOT": 1}]"#;
        let err = decode_points(payload.as_bytes(), &PointSchema::default()).unwrap_err();
        assert!(matches!(err, PointSourceError::InvalidNumber { row: 1, .. }));
    }

    #[test]
    fn rejects_non_array_and_bad_json() {
        let schema = PointSchema::default();
        assert!(matches!(
            decode_points(br#"{"LON": 1}"#, &schema),
            Err(PointSourceError::NotAnArray)
        ));
        assert!(matches!(
            decode_points(b"[1, 2]", &schema),
            Err(PointSourceError::NotAnObject { row: 0 })
        ));
        assert!(matches!(
            decode_points(b"[{", &schema),
            Err(PointSourceError::Json(_))
        ));
    }

    #[test]
    fn rejects_positions_outside_wgs84() {
        let payload = r#"[{"LON": 2600000, "LAT": 1200000, "B22BTOT": 3}]"#;
        let err = decode_points(payload.as_bytes(), &PointSchema::default()).unwrap_err();
        assert!(matches!(
            err,
            PointSourceError::Points(PointError::InvalidPosition { index: 0, .. })
        ));
    }

    #[test]
    fn custom_schema_selects_fields() {
        let payload = r#"[{"x": 7.4, "y": 46.9, "men": 3, "women": 4}]"#;
        let schema = PointSchema {
            lon_field: "x".into(),
            lat_field: "y".into(),
            weight_fields: vec!["women".into(), "men".into()],
        };
        let src = decode_points(payload.as_bytes(), &schema).unwrap();
        assert_eq!(&*src.collection.points()[0].weights, &[4.0, 3.0]);
    }
}
