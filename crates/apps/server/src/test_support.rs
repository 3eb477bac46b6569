use std::sync::Arc;

use compute::{ControllerConfig, Point, PointCollection};
use foundation::math::LonLat;
use layers::GridLayer;

use crate::grid_service::GridService;
use crate::AppState;

pub const KEY: &str = "B22BTOT";

/// Two points sharing a 100 m cell near (8, 46) and one far away near (9, 47).
pub fn statpop_points() -> Arc<PointCollection> {
    let pts = vec![
        Point::new(LonLat::new(8.0, 46.0), vec![10.0]),
        Point::new(LonLat::new(8.0005, 46.0003), vec![5.0]),
        Point::new(LonLat::new(9.0, 47.0), vec![7.0]),
    ];
    Arc::new(PointCollection::new(vec![KEY.to_string()], pts).unwrap())
}

pub fn statpop_service() -> GridService {
    GridService::new(statpop_points(), ControllerConfig::new(KEY, KEY)).unwrap()
}

pub fn app_state() -> AppState {
    AppState {
        grid: Arc::new(statpop_service()),
        layer: Arc::new(GridLayer::new("grid-layer", KEY, KEY)),
        source_hash: Arc::from("0".repeat(64)),
    }
}
