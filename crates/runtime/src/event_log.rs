use crate::generation::Generation;

/// What happened to a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    Requested,
    Rejected,
    RecomputeStarted,
    MemoHit,
    Published,
    StaleDiscarded,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Requested => "requested",
            EventKind::Rejected => "rejected",
            EventKind::RecomputeStarted => "recompute_started",
            EventKind::MemoHit => "memo_hit",
            EventKind::Published => "published",
            EventKind::StaleDiscarded => "stale_discarded",
        }
    }
}

/// Traceable record of a controller transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Generation the event belongs to; rejected requests carry the latest
    /// generation at the time of rejection.
    pub generation: Generation,
    pub kind: EventKind,
    pub message: String,
}

/// Bounded in-memory event log. Oldest events are dropped first.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Event>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn emit(&mut self, generation: Generation, kind: EventKind, message: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.remove(0);
        }
        self.events.push(Event {
            generation,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, EventLog};
    use crate::generation::Generation;

    #[test]
    fn records_events_with_generation() {
        let mut log = EventLog::new();
        log.emit(Generation(2), EventKind::Published, "cell_size=200");
        assert_eq!(log.events().len(), 1);
        assert_eq!(log.events()[0].generation, Generation(2));
        assert_eq!(log.events().last().map(|e| e.kind), Some(EventKind::Published));
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let mut log = EventLog::with_capacity(2);
        log.emit(Generation(1), EventKind::Requested, "a");
        log.emit(Generation(1), EventKind::Published, "b");
        log.emit(Generation(2), EventKind::Requested, "c");
        let msgs: Vec<_> = log.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["b", "c"]);
    }

    #[test]
    fn kinds_have_stable_names() {
        assert_eq!(EventKind::RecomputeStarted.as_str(), "recompute_started");
        assert_eq!(EventKind::StaleDiscarded.as_str(), "stale_discarded");
    }
}
