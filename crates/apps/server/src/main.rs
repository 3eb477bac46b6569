use std::sync::Arc;

use clap::Parser;
use layers::GridLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod grid_service;
mod routes;
mod source;
#[cfg(test)]
mod test_support;

use crate::config::Args;
use crate::grid_service::GridService;

#[derive(Clone)]
pub struct AppState {
    grid: Arc<GridService>,
    layer: Arc<GridLayer>,
    /// blake3 digest of the loaded point source.
    source_hash: Arc<str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Args::parse().resolve()?;
    info!(source = ?settings.source, "loading point source");

    let http = reqwest::Client::new();
    let source = match source::load(&settings.source, &settings.schema, &http).await {
        Ok(source) => source,
        Err(err) => {
            error!("point source unavailable: {err}");
            return Err(err.into());
        }
    };
    info!(
        points = source.collection.len(),
        hash = %source.content_hash,
        "point source decoded"
    );

    let layer = GridLayer::new(
        "grid-layer",
        settings.controller.elevation_key.clone(),
        settings.controller.color_key.clone(),
    );
    let grid = GridService::new(Arc::new(source.collection), settings.controller)?;
    let state = AppState {
        grid: Arc::new(grid),
        layer: Arc::new(layer),
        source_hash: Arc::from(source.content_hash),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    info!("popgrid server listening on http://{}", settings.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
