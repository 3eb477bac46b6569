//! Cell-size interaction controller.
//!
//! The controller is the single writer of the grid configuration. A request
//! moves through `Idle -> Validating -> {Recomputing -> Idle | RejectedConfig -> Idle}`.
//! Accepted requests hand out a [`RecomputeJob`] that may run on any thread;
//! its [`CompletedJob`] is handed back through [`InteractionController::complete`],
//! which publishes it only if no newer request was accepted meanwhile.

use std::sync::Arc;
use std::time::Instant;

use runtime::{Counter, EventKind, EventLog, Gauge, Generation, Metrics, RequestTracker};

use crate::grid::{
    AggregateError, CellSet, CellSize, CellSizeRange, GridMemo, InvalidConfig, MemoKey, aggregate,
};
use crate::points::PointCollection;

/// Consumer of published cell sets (a renderer, a channel, a cache...).
pub trait RenderSink {
    fn publish(&mut self, cells: Arc<CellSet>);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    /// Transient, only held while a candidate is checked.
    Validating,
    Recomputing(Generation),
    /// Transient, only held while a rejection is recorded.
    RejectedConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub range: CellSizeRange,
    pub initial_cell_size: f64,
    pub elevation_key: String,
    pub color_key: String,
    pub memo_capacity: usize,
}

impl ControllerConfig {
    pub fn new(elevation_key: impl Into<String>, color_key: impl Into<String>) -> Self {
        Self {
            range: CellSizeRange::default(),
            initial_cell_size: 100.0,
            elevation_key: elevation_key.into(),
            color_key: color_key.into(),
            memo_capacity: 16,
        }
    }

    /// Keys to aggregate: elevation first, color second, without repeats.
    pub fn weight_keys(&self) -> Vec<String> {
        let mut keys = vec![self.elevation_key.clone()];
        if self.color_key != self.elevation_key {
            keys.push(self.color_key.clone());
        }
        keys
    }
}

#[derive(Debug)]
enum Work {
    Ready(Arc<CellSet>),
    Compute {
        points: Arc<PointCollection>,
        weight_keys: Vec<String>,
    },
}

/// Aggregation scheduled for one accepted request.
#[derive(Debug)]
pub struct RecomputeJob {
    generation: Generation,
    cell_size: CellSize,
    work: Work,
}

impl RecomputeJob {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    /// True when the result was served from the memo and `run` is free.
    pub fn is_cached(&self) -> bool {
        matches!(self.work, Work::Ready(_))
    }

    pub fn run(self) -> CompletedJob {
        let started = Instant::now();
        let (result, computed) = match self.work {
            Work::Ready(cells) => (Ok(cells), false),
            Work::Compute {
                points,
                weight_keys,
            } => (
                aggregate(&points, self.cell_size, &weight_keys).map(Arc::new),
                true,
            ),
        };
        CompletedJob {
            generation: self.generation,
            cell_size: self.cell_size,
            result,
            computed,
            elapsed_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug)]
pub struct CompletedJob {
    generation: Generation,
    cell_size: CellSize,
    result: Result<Arc<CellSet>, AggregateError>,
    computed: bool,
    elapsed_micros: u64,
}

impl CompletedJob {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Published { generation: Generation, cells: usize },
    /// A newer request was accepted before this one finished.
    Stale { generation: Generation },
}

pub struct InteractionController<S> {
    points: Arc<PointCollection>,
    range: CellSizeRange,
    cell_size: CellSize,
    elevation_key: String,
    color_key: String,
    weight_keys: Vec<String>,
    tracker: RequestTracker,
    state: ControllerState,
    memo: GridMemo,
    published: Option<Arc<CellSet>>,
    sink: S,
    events: EventLog,
    metrics: Metrics,
}

impl<S: RenderSink> InteractionController<S> {
    /// Builds the controller and publishes the initial cell set.
    ///
    /// Requires the point collection up front: aggregation never runs
    /// without data.
    pub fn new(
        points: Arc<PointCollection>,
        config: ControllerConfig,
        sink: S,
    ) -> Result<Self, AggregateError> {
        let cell_size = config.range.validate(config.initial_cell_size)?;
        let weight_keys = config.weight_keys();
        if let Some(missing) = weight_keys.iter().find(|k| points.weight_column(k).is_none()) {
            return Err(AggregateError::UnknownWeightKey(missing.clone()));
        }

        let mut controller = Self {
            points,
            range: config.range,
            cell_size,
            elevation_key: config.elevation_key,
            color_key: config.color_key,
            weight_keys,
            tracker: RequestTracker::new(),
            state: ControllerState::Idle,
            memo: GridMemo::new(config.memo_capacity),
            published: None,
            sink,
            events: EventLog::new(),
            metrics: Metrics::new(),
        };
        controller.metrics.inc(Counter::Requests);
        let job = controller.start(cell_size);
        controller.complete(job.run())?;
        Ok(controller)
    }

    /// Validates `candidate` and, on success, schedules a recompute that
    /// supersedes any in-flight one.
    ///
    /// On rejection nothing changes: neither the current cell size nor the
    /// published cells.
    pub fn request(&mut self, candidate: f64) -> Result<RecomputeJob, InvalidConfig> {
        self.metrics.inc(Counter::Requests);
        let resume = match self.state {
            ControllerState::Recomputing(g) => ControllerState::Recomputing(g),
            _ => ControllerState::Idle,
        };

        self.state = ControllerState::Validating;
        match self.range.validate(candidate) {
            Ok(cell_size) => Ok(self.start(cell_size)),
            Err(e) => {
                self.state = ControllerState::RejectedConfig;
                self.metrics.inc(Counter::Rejected);
                self.events
                    .emit(self.tracker.latest(), EventKind::Rejected, e.to_string());
                self.state = resume;
                Err(e)
            }
        }
    }

    /// Applies a finished job. Results of superseded requests are dropped.
    pub fn complete(&mut self, done: CompletedJob) -> Result<Outcome, AggregateError> {
        let CompletedJob {
            generation,
            cell_size,
            result,
            computed,
            elapsed_micros,
        } = done;

        if computed {
            self.metrics.inc(Counter::Recomputed);
            self.metrics.record_recompute_micros(elapsed_micros);
            if let Ok(cells) = &result {
                let key = MemoKey::new(cell_size, self.points.version(), &self.weight_keys);
                self.memo.insert(key, Arc::clone(cells));
                self.metrics
                    .set_gauge(Gauge::MemoEntries, self.memo.len() as i64);
            }
        }

        if !self.tracker.settle(generation) {
            self.metrics.inc(Counter::StaleDiscarded);
            self.events.emit(
                generation,
                EventKind::StaleDiscarded,
                format!("cell_size={cell_size}"),
            );
            return Ok(Outcome::Stale { generation });
        }

        self.state = ControllerState::Idle;
        let cells = result?;
        let count = cells.len();
        self.sink.publish(Arc::clone(&cells));
        self.published = Some(cells);
        self.metrics.inc(Counter::Published);
        self.metrics.set_gauge(Gauge::PublishedCells, count as i64);
        self.events.emit(
            generation,
            EventKind::Published,
            format!("cell_size={cell_size} cells={count}"),
        );
        Ok(Outcome::Published {
            generation,
            cells: count,
        })
    }

    /// Synchronous request, run and complete.
    pub fn apply(&mut self, candidate: f64) -> Result<Outcome, AggregateError> {
        let job = self.request(candidate)?;
        self.complete(job.run())
    }

    fn start(&mut self, cell_size: CellSize) -> RecomputeJob {
        self.cell_size = cell_size;
        let generation = self.tracker.issue();
        self.events.emit(
            generation,
            EventKind::Requested,
            format!("cell_size={cell_size}"),
        );
        self.metrics
            .set_gauge(Gauge::CellSizeMeters, cell_size.meters().round() as i64);

        let key = MemoKey::new(cell_size, self.points.version(), &self.weight_keys);
        let reuse = self
            .published
            .as_ref()
            .filter(|p| p.cell_size() == cell_size && p.version() == self.points.version())
            .cloned()
            .or_else(|| self.memo.get(&key));

        let work = match reuse {
            Some(cells) => {
                self.metrics.inc(Counter::MemoHits);
                self.events
                    .emit(generation, EventKind::MemoHit, format!("cell_size={cell_size}"));
                Work::Ready(cells)
            }
            None => {
                self.events.emit(
                    generation,
                    EventKind::RecomputeStarted,
                    format!("cell_size={cell_size} points={}", self.points.len()),
                );
                Work::Compute {
                    points: Arc::clone(&self.points),
                    weight_keys: self.weight_keys.clone(),
                }
            }
        };

        self.state = ControllerState::Recomputing(generation);
        RecomputeJob {
            generation,
            cell_size,
            work,
        }
    }
}

impl<S> InteractionController<S> {
    /// Most recently accepted cell size.
    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    pub fn range(&self) -> &CellSizeRange {
        &self.range
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.tracker.latest()
    }

    /// True while the latest accepted request has not been published.
    pub fn in_flight(&self) -> bool {
        self.tracker.in_flight()
    }

    pub fn published(&self) -> Option<&Arc<CellSet>> {
        self.published.as_ref()
    }

    pub fn points(&self) -> &Arc<PointCollection> {
        &self.points
    }

    pub fn elevation_key(&self) -> &str {
        &self.elevation_key
    }

    pub fn color_key(&self) -> &str {
        &self.color_key
    }

    pub fn weight_keys(&self) -> &[String] {
        &self.weight_keys
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
