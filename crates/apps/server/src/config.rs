use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use compute::{CellSizeRange, ControllerConfig, InvalidConfig};
use formats::PointSchema;

pub const DEFAULT_ADDR: &str = "127.0.0.1:9200";
pub const DEFAULT_DATA_URL: &str =
    "https://eeon-statpop.s3.eu-central-2.amazonaws.com/statpop_2022.json";
pub const DEFAULT_WEIGHT_FIELD: &str = "B22BTOT";

#[derive(Parser, Debug)]
#[command(author, version, about = "Population density grid server")]
pub struct Args {
    /// Listen address (env: POPGRID_ADDR, default 127.0.0.1:9200)
    #[arg(long)]
    pub addr: Option<String>,

    /// Point source URL (env: POPGRID_DATA_URL, default: STATPOP 2022)
    #[arg(long)]
    pub data_url: Option<String>,

    /// Read the point source from a local file instead (env: POPGRID_DATA_FILE)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    #[arg(long, default_value = "LON")]
    pub lon_field: String,

    #[arg(long, default_value = "LAT")]
    pub lat_field: String,

    /// Weight field, repeatable. The first drives elevation, the second (if
    /// any) drives color. (env: POPGRID_WEIGHT_FIELDS, comma separated)
    #[arg(long = "weight-field")]
    pub weight_fields: Vec<String>,

    /// Initial cell size in meters
    #[arg(long, default_value_t = 100.0)]
    pub cell_size: f64,

    #[arg(long, default_value_t = 100.0)]
    pub cell_size_min: f64,

    #[arg(long, default_value_t = 1000.0)]
    pub cell_size_max: f64,

    /// Slider step in meters; 0 allows any value in range
    #[arg(long, default_value_t = 100.0)]
    pub cell_size_step: f64,

    /// Cached cell sets kept for quick re-selection
    #[arg(long, default_value_t = 16)]
    pub memo_capacity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: SocketAddr,
    pub source: SourceLocation,
    pub schema: PointSchema,
    pub controller: ControllerConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAddr(String),
    CellSize(InvalidConfig),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidAddr(addr) => write!(f, "invalid listen address: {addr}"),
            ConfigError::CellSize(e) => write!(f, "invalid cell size settings: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Args {
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Command line first, then `lookup` (the environment), then defaults.
    pub fn resolve_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let addr_raw = self
            .addr
            .or_else(|| lookup("POPGRID_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_raw.clone()))?;

        let source = match self
            .data_file
            .or_else(|| lookup("POPGRID_DATA_FILE").map(PathBuf::from))
        {
            Some(path) => SourceLocation::File(path),
            None => SourceLocation::Url(
                self.data_url
                    .or_else(|| lookup("POPGRID_DATA_URL"))
                    .unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
            ),
        };

        let mut weight_fields = self.weight_fields;
        if weight_fields.is_empty() {
            weight_fields = lookup("POPGRID_WEIGHT_FIELDS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
        }
        if weight_fields.is_empty() {
            weight_fields.push(DEFAULT_WEIGHT_FIELD.to_string());
        }

        // Only an exact 0 lifts the step; negative or NaN steps fail below.
        let step = if self.cell_size_step == 0.0 {
            None
        } else {
            Some(self.cell_size_step)
        };
        let range = CellSizeRange::new(self.cell_size_min, self.cell_size_max, step)
            .map_err(ConfigError::CellSize)?;
        range.validate(self.cell_size).map_err(ConfigError::CellSize)?;

        let elevation_key = weight_fields[0].clone();
        let color_key = weight_fields.get(1).unwrap_or(&weight_fields[0]).clone();
        let mut controller = ControllerConfig::new(elevation_key, color_key);
        controller.range = range;
        controller.initial_cell_size = self.cell_size;
        controller.memo_capacity = self.memo_capacity;

        Ok(Settings {
            addr,
            source,
            schema: PointSchema {
                lon_field: self.lon_field,
                lat_field: self.lat_field,
                weight_fields,
            },
            controller,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use clap::Parser;
    use compute::InvalidConfig;

    use super::{Args, ConfigError, DEFAULT_DATA_URL, SourceLocation};

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["popgrid-server"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_statpop_layer() {
        let s = parse(&[]).resolve_with(env_of(&[])).unwrap();
        assert_eq!(s.addr.to_string(), "127.0.0.1:9200");
        assert_eq!(s.source, SourceLocation::Url(DEFAULT_DATA_URL.to_string()));
        assert_eq!(s.schema.weight_fields, vec!["B22BTOT".to_string()]);
        assert_eq!(s.controller.elevation_key, "B22BTOT");
        assert_eq!(s.controller.color_key, "B22BTOT");
        assert_eq!(s.controller.initial_cell_size, 100.0);
        assert_eq!(s.controller.range.max(), 1000.0);
        assert_eq!(s.controller.range.step(), Some(100.0));
        assert_eq!(s.controller.memo_capacity, 16);
    }

    #[test]
    fn environment_fills_missing_flags() {
        let env = env_of(&[
            ("POPGRID_ADDR", "0.0.0.0:8080"),
            ("POPGRID_DATA_FILE", "/data/statpop.json"),
            ("POPGRID_WEIGHT_FIELDS", "B22BTOT, B22BMTOT"),
        ]);
        let s = parse(&[]).resolve_with(env).unwrap();
        assert_eq!(s.addr.port(), 8080);
        assert_eq!(
            s.source,
            SourceLocation::File(PathBuf::from("/data/statpop.json"))
        );
        assert_eq!(s.controller.elevation_key, "B22BTOT");
        assert_eq!(s.controller.color_key, "B22BMTOT");
    }

    #[test]
    fn flags_win_over_environment() {
        let env = env_of(&[
            ("POPGRID_ADDR", "0.0.0.0:8080"),
            ("POPGRID_WEIGHT_FIELDS", "B21BTOT"),
        ]);
        let s = parse(&[
            "--addr",
            "127.0.0.1:7000",
            "--weight-field",
            "B22BWTOT",
            "--data-url",
            "http://localhost/points.json",
            "--cell-size",
            "300",
        ])
        .resolve_with(env)
        .unwrap();
        assert_eq!(s.addr.port(), 7000);
        assert_eq!(s.schema.weight_fields, vec!["B22BWTOT".to_string()]);
        assert_eq!(
            s.source,
            SourceLocation::Url("http://localhost/points.json".to_string())
        );
        assert_eq!(s.controller.initial_cell_size, 300.0);
    }

    #[test]
    fn zero_step_allows_any_size() {
        let s = parse(&["--cell-size-step", "0", "--cell-size", "123.5"])
            .resolve_with(env_of(&[]))
            .unwrap();
        assert_eq!(s.controller.range.step(), None);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        for step in ["--cell-size-step=-100", "--cell-size-step=NaN"] {
            let err = parse(&[step]).resolve_with(env_of(&[])).unwrap_err();
            assert!(
                matches!(err, ConfigError::CellSize(InvalidConfig::InvalidRange { .. })),
                "{step}"
            );
        }
    }

    #[test]
    fn rejects_bad_settings() {
        let err = parse(&["--cell-size", "50"])
            .resolve_with(env_of(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CellSize(InvalidConfig::OutOfRange { .. })
        ));

        let err = parse(&["--cell-size-min", "500", "--cell-size-max", "200"])
            .resolve_with(env_of(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CellSize(InvalidConfig::InvalidRange { .. })
        ));

        let err = parse(&["--addr", "nowhere"])
            .resolve_with(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr(_)));
    }
}
