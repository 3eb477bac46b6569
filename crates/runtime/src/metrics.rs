use std::collections::BTreeMap;

/// Counters tracked for cell-size requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Counter {
    Requests,
    Rejected,
    Recomputed,
    MemoHits,
    Published,
    StaleDiscarded,
}

impl Counter {
    pub const ALL: [Counter; 6] = [
        Counter::Requests,
        Counter::Rejected,
        Counter::Recomputed,
        Counter::MemoHits,
        Counter::Published,
        Counter::StaleDiscarded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Requests => "requests",
            Counter::Rejected => "rejected",
            Counter::Recomputed => "recomputed",
            Counter::MemoHits => "memo_hits",
            Counter::Published => "published",
            Counter::StaleDiscarded => "stale_discarded",
        }
    }
}

/// Gauges describing the currently published cell set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gauge {
    CellSizeMeters,
    PublishedCells,
    MemoEntries,
}

impl Gauge {
    pub fn name(self) -> &'static str {
        match self {
            Gauge::CellSizeMeters => "cell_size_m",
            Gauge::PublishedCells => "published_cells",
            Gauge::MemoEntries => "memo_entries",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
    }
}

/// Deterministic metrics for the recompute loop.
///
/// Keys are enums held in sorted maps so snapshots have a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<Counter, u64>,
    gauges: BTreeMap<Gauge, i64>,
    recompute_micros: Histogram,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub recompute_micros: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, c: Counter) -> u64 {
        self.counters.get(&c).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, c: Counter) {
        *self.counters.entry(c).or_insert(0) += 1;
    }

    pub fn set_gauge(&mut self, g: Gauge, value: i64) {
        self.gauges.insert(g, value);
    }

    pub fn record_recompute_micros(&mut self, micros: u64) {
        self.recompute_micros.record(micros);
    }

    /// Stable snapshot; every counter is listed, including zeroes.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: Counter::ALL
                .iter()
                .map(|c| (c.name(), self.counter(*c)))
                .collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.name(), *v)).collect(),
            recompute_micros: self.recompute_micros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Counter, Gauge, Histogram, Metrics};

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.inc(Counter::Requests);
        m.inc(Counter::Requests);
        assert_eq!(m.counter(Counter::Requests), 2);
        assert_eq!(m.counter(Counter::Rejected), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        assert!(m.snapshot().gauges.is_empty());
        m.set_gauge(Gauge::CellSizeMeters, 100);
        m.set_gauge(Gauge::CellSizeMeters, 300);
        assert_eq!(m.snapshot().gauges, vec![(Gauge::CellSizeMeters.name(), 300)]);
    }

    #[test]
    fn histogram_tracks_min_max_sum_count() {
        let mut h = Histogram::default();
        h.record(5);
        h.record(2);
        h.record(7);
        assert_eq!(h.count, 3);
        assert_eq!(h.sum, 14);
        assert_eq!(h.min, 2);
        assert_eq!(h.max, 7);
    }

    #[test]
    fn snapshot_lists_every_counter_in_order() {
        let mut m = Metrics::new();
        m.inc(Counter::Published);
        m.set_gauge(Gauge::PublishedCells, 12);
        m.set_gauge(Gauge::CellSizeMeters, 100);

        let snap = m.snapshot();
        assert_eq!(snap.counters.len(), Counter::ALL.len());
        assert_eq!(snap.counters[0], ("requests", 0));
        assert!(snap.counters.contains(&("published", 1)));
        assert_eq!(
            snap.gauges,
            vec![("cell_size_m", 100), ("published_cells", 12)]
        );
    }
}
