//! Eviction index: in-memory priority structure over resident artifacts.
//!
//! Ordering is `(size_bytes, created_at)` ascending, so `pop_min` returns the
//! smallest artifact and, among equal sizes, the oldest one. `name` is the
//! last tie-breaker to keep the order total.
//!
//! Arbitrary removal filters the heap and re-heapifies, which is O(n). The
//! capacities involved are tens of entries.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ArtifactName, ArtifactRef, CacheError, Result};

/// One resident artifact as tracked by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionEntry {
    pub name: ArtifactName,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl EvictionEntry {
    fn priority_cmp(&self, other: &Self) -> Ordering {
        (self.size_bytes, self.created_at, &self.name).cmp(&(
            other.size_bytes,
            other.created_at,
            &other.name,
        ))
    }
}

impl From<ArtifactRef> for EvictionEntry {
    fn from(artifact: ArtifactRef) -> Self {
        Self {
            name: artifact.name,
            path: artifact.path,
            size_bytes: artifact.size_bytes,
            created_at: artifact.created_at,
        }
    }
}

/// Heap slot.
///
/// We use reversed ordering so BinaryHeap acts as a min-heap.
#[derive(Debug, Clone)]
struct Slot(EvictionEntry);

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.priority_cmp(&self.0)
    }
}

/// Min-priority index of resident artifacts.
#[derive(Debug, Default)]
pub struct EvictionIndex {
    heap: BinaryHeap<Slot>,
    names: HashSet<ArtifactName>,
}

impl EvictionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new artifact. Fails on a name that is already tracked.
    pub fn insert(&mut self, entry: EvictionEntry) -> Result<()> {
        if self.names.contains(&entry.name) {
            return Err(CacheError::DuplicateInsert(entry.name.to_string()));
        }
        self.names.insert(entry.name.clone());
        self.heap.push(Slot(entry));
        Ok(())
    }

    pub fn peek_min(&self) -> Option<&EvictionEntry> {
        self.heap.peek().map(|slot| &slot.0)
    }

    pub fn pop_min(&mut self) -> Result<EvictionEntry> {
        let Slot(entry) = self.heap.pop().ok_or(CacheError::EmptyIndex)?;
        self.names.remove(&entry.name);
        Ok(entry)
    }

    /// Remove an arbitrary entry. Returns `false` if the name was not tracked.
    pub fn remove(&mut self, name: &ArtifactName) -> bool {
        if !self.names.remove(name) {
            return false;
        }
        let heap = std::mem::take(&mut self.heap);
        self.heap = heap
            .into_vec()
            .into_iter()
            .filter(|slot| &slot.0.name != name)
            .collect();
        true
    }

    pub fn contains(&self, name: &ArtifactName) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.heap.iter().map(|slot| slot.0.size_bytes).sum()
    }

    pub fn get(&self, name: &ArtifactName) -> Option<&EvictionEntry> {
        if !self.contains(name) {
            return None;
        }
        self.heap.iter().map(|slot| &slot.0).find(|e| &e.name == name)
    }

    /// Snapshot of all entries, in eviction order (next victim first).
    pub fn entries(&self) -> Vec<EvictionEntry> {
        let mut entries: Vec<EvictionEntry> =
            self.heap.iter().map(|slot| slot.0.clone()).collect();
        entries.sort_by(|a, b| a.priority_cmp(b));
        entries
    }
}
