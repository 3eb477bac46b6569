use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::math::StableF64;

use super::aggregate::CellSet;
use super::config::CellSize;
use crate::points::CollectionVersion;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoKey {
    cell_size: StableF64,
    version: CollectionVersion,
    weight_keys: Vec<String>,
}

impl MemoKey {
    pub fn new(cell_size: CellSize, version: CollectionVersion, weight_keys: &[String]) -> Self {
        Self {
            cell_size: StableF64(cell_size.meters()),
            version,
            weight_keys: weight_keys.to_vec(),
        }
    }
}

#[derive(Debug)]
struct MemoEntry {
    cells: Arc<CellSet>,
    last_used_tick: u64,
}

/// Bounded cache of aggregation results.
///
/// Results are pure functions of their key, so any cached set can be
/// republished as-is. Eviction is LRU by tick with a tie-break on key order.
#[derive(Debug)]
pub struct GridMemo {
    capacity: usize,
    tick: u64,
    entries: BTreeMap<MemoKey, MemoEntry>,
}

impl GridMemo {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &MemoKey) -> Option<Arc<CellSet>> {
        self.tick = self.tick.wrapping_add(1);
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        entry.last_used_tick = tick;
        Some(Arc::clone(&entry.cells))
    }

    pub fn insert(&mut self, key: MemoKey, cells: Arc<CellSet>) {
        if self.capacity == 0 {
            return;
        }
        self.tick = self.tick.wrapping_add(1);
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                self.evict_lru();
            }
        }
        self.entries.insert(
            key,
            MemoEntry {
                cells,
                last_used_tick: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        let mut victim: Option<(&MemoKey, u64)> = None;
        for (k, e) in &self.entries {
            if victim.is_none_or(|(_, t)| e.last_used_tick < t) {
                victim = Some((k, e.last_used_tick));
            }
        }
        if let Some(key) = victim.map(|(k, _)| k.clone()) {
            self.entries.remove(&key);
        }
    }
}
