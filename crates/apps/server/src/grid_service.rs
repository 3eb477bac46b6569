//! Async driver around the interaction controller.
//!
//! The controller sits behind a short-lived lock; aggregation itself runs on
//! the blocking pool with the lock released, so newer requests can supersede
//! an in-flight one. Published cell sets fan out through a watch channel.

use std::sync::Arc;

use compute::{
    AggregateError, CellSet, CompletedJob, ControllerConfig, ControllerState,
    InteractionController, InvalidConfig, Outcome, PointCollection, RecomputeJob, RenderSink,
};
use parking_lot::Mutex;
use runtime::MetricsSnapshot;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Render sink that replaces the value of a watch channel.
pub struct WatchSink {
    tx: watch::Sender<Option<Arc<CellSet>>>,
}

impl RenderSink for WatchSink {
    fn publish(&mut self, cells: Arc<CellSet>) {
        self.tx.send_replace(Some(cells));
    }
}

#[derive(Debug)]
pub enum ServiceError {
    Rejected(InvalidConfig),
    Aggregate(AggregateError),
    Join(tokio::task::JoinError),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Rejected(e) => write!(f, "{e}"),
            ServiceError::Aggregate(e) => write!(f, "aggregation failed: {e}"),
            ServiceError::Join(e) => write!(f, "recompute task failed: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CellSizeReply {
    pub cell_size: f64,
    pub generation: u64,
    pub outcome: &'static str,
}

impl CellSizeReply {
    fn new(cell_size: f64, outcome: Outcome) -> Self {
        let (generation, outcome) = match outcome {
            Outcome::Published { generation, .. } => (generation, "published"),
            Outcome::Stale { generation } => (generation, "superseded"),
        };
        Self {
            cell_size,
            generation: generation.0,
            outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GridConfigView {
    pub cell_size: f64,
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
    /// Every selectable size; empty when any value in range is allowed.
    pub allowed: Vec<f64>,
    pub state: &'static str,
    pub generation: u64,
    pub in_flight: bool,
    pub points: usize,
    pub weight_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventView {
    pub generation: u64,
    pub kind: &'static str,
    pub message: String,
}

pub struct GridService {
    controller: Mutex<InteractionController<WatchSink>>,
    published: watch::Receiver<Option<Arc<CellSet>>>,
}

impl GridService {
    /// Builds the controller; the initial cell set is published before this
    /// returns.
    pub fn new(
        points: Arc<PointCollection>,
        config: ControllerConfig,
    ) -> Result<Self, AggregateError> {
        let (tx, rx) = watch::channel(None);
        let controller = InteractionController::new(points, config, WatchSink { tx })?;
        Ok(Self {
            controller: Mutex::new(controller),
            published: rx,
        })
    }

    pub fn published(&self) -> Option<Arc<CellSet>> {
        self.published.borrow().clone()
    }

    /// Validates and schedules a recompute.
    pub fn begin(&self, candidate: f64) -> Result<RecomputeJob, InvalidConfig> {
        let result = self.controller.lock().request(candidate);
        match &result {
            Ok(job) => debug!(
                generation = job.generation().0,
                cell_size = %job.cell_size(),
                cached = job.is_cached(),
                "cell size accepted"
            ),
            Err(e) => warn!(candidate, "cell size rejected: {e}"),
        }
        result
    }

    pub fn finish(&self, done: CompletedJob) -> Result<Outcome, AggregateError> {
        let cell_size = done.cell_size();
        let outcome = self.controller.lock().complete(done)?;
        match outcome {
            Outcome::Published { generation, cells } => {
                info!(generation = generation.0, %cell_size, cells, "grid published")
            }
            Outcome::Stale { generation } => {
                debug!(generation = generation.0, %cell_size, "superseded result dropped")
            }
        }
        Ok(outcome)
    }

    pub async fn set_cell_size(&self, candidate: f64) -> Result<CellSizeReply, ServiceError> {
        let job = self.begin(candidate).map_err(ServiceError::Rejected)?;
        let cell_size = job.cell_size().meters();
        let done = if job.is_cached() {
            job.run()
        } else {
            tokio::task::spawn_blocking(move || job.run())
                .await
                .map_err(ServiceError::Join)?
        };
        let outcome = self.finish(done).map_err(ServiceError::Aggregate)?;
        Ok(CellSizeReply::new(cell_size, outcome))
    }

    pub fn config(&self) -> GridConfigView {
        let c = self.controller.lock();
        let state = match c.state() {
            ControllerState::Idle => "idle",
            ControllerState::Validating => "validating",
            ControllerState::Recomputing(_) => "recomputing",
            ControllerState::RejectedConfig => "rejected_config",
        };
        GridConfigView {
            cell_size: c.cell_size().meters(),
            min: c.range().min(),
            max: c.range().max(),
            step: c.range().step(),
            allowed: c.range().values().iter().map(|s| s.meters()).collect(),
            state,
            generation: c.generation().0,
            in_flight: c.in_flight(),
            points: c.points().len(),
            weight_keys: c.weight_keys().to_vec(),
        }
    }

    /// Controller transitions still held by the bounded log, oldest first.
    pub fn events(&self) -> Vec<EventView> {
        self.controller
            .lock()
            .events()
            .events()
            .iter()
            .map(|e| EventView {
                generation: e.generation.0,
                kind: e.kind.as_str(),
                message: e.message.clone(),
            })
            .collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.controller.lock().metrics().snapshot()
    }
}
