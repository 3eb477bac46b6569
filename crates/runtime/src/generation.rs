/// Last-request-wins bookkeeping.
///
/// Every accepted request is stamped with a strictly increasing
/// [`Generation`]. Work finishing under a generation that is no longer the
/// latest is stale and must not be applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
    settled: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next generation, superseding every earlier one.
    pub fn issue(&mut self) -> Generation {
        self.latest = self.latest.wrapping_add(1);
        Generation(self.latest)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.latest
    }

    /// Marks `generation` as applied. Returns `false` (and changes nothing)
    /// when it has been superseded.
    pub fn settle(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.settled = generation.0;
        true
    }

    /// True while the latest issued generation has not been settled.
    pub fn in_flight(&self) -> bool {
        self.settled != self.latest
    }
}
