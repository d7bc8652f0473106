//! Status - キャッシュの統計情報

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// CacheStats は stats() が返すスナップショット
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub resident: usize,
    pub capacity: usize,
    pub resident_bytes: u64,
    pub puts: u64,
    pub already_cached: u64,
    pub evictions: u64,
    pub hits: u64,
    pub misses: u64,
}

/// AudioCache 内部のカウンタ（ロック外で更新されるものがあるので atomic）
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub puts: AtomicU64,
    pub already_cached: AtomicU64,
    pub evictions: AtomicU64,
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, resident: usize, capacity: usize, resident_bytes: u64) -> CacheStats {
        CacheStats {
            resident,
            capacity,
            resident_bytes,
            puts: self.puts.load(Ordering::Relaxed),
            already_cached: self.already_cached.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
