//! CacheBuilder - AudioCache の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（容量 0 は build 時点で拒否する）

use std::sync::Arc;

use crate::app::cache::AudioCache;
use crate::app::config::DEFAULT_MAX_CACHE_SIZE;
use crate::domain::CacheError;
use crate::ports::{ArtifactStore, EventSink, NoopEventSink};

/// CacheBuilder は AudioCache を構築
///
/// # 使用例
/// ```ignore
/// let cache = CacheBuilder::new(FsArtifactStore::new("uploads", "mp3"))
///     .capacity(10)
///     .build()?;
/// ```
pub struct CacheBuilder<S> {
    store: S,
    capacity: usize,
    events: Arc<dyn EventSink>,
}

/// BuildError はキャッシュ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,
}

impl From<BuildError> for CacheError {
    fn from(e: BuildError) -> Self {
        CacheError::Config(e.to_string())
    }
}

impl<S: ArtifactStore> CacheBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            capacity: DEFAULT_MAX_CACHE_SIZE,
            events: Arc::new(NoopEventSink),
        }
    }

    /// 同時に resident にできるアーティファクト数
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// # 検証
    /// - capacity == 0 なら BuildError::ZeroCapacity
    pub fn build(self) -> Result<AudioCache<S>, BuildError> {
        if self.capacity == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        Ok(AudioCache::from_parts(self.store, self.capacity, self.events))
    }
}
