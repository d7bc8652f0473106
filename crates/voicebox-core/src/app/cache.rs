//! AudioCache - 容量制限付きの音声アーティファクトキャッシュ
//!
//! ArtifactStore（バイト列）と EvictionIndex（resident 集合と追い出し順）を
//! 常に一致させる唯一のコンポーネントです。
//!
//! # 排他制御
//! - put は「resident 判定 → write → 追い出し → insert」を 1 つの Mutex 内で行う
//! - get はロックを取らない。追い出し中の get は NotFound になるだけ
//!
//! # 追い出し方針
//! `(size_bytes, created_at)` の小さいもの（同サイズなら古いもの）から追い出す。
//! 追い出しは新しいアーティファクトを index に入れる前に行うので、
//! put したものがその put 自身で追い出されることはない。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::app::config::CacheConfig;
use crate::app::status::{CacheStats, Counters};
use crate::app::CacheBuilder;
use crate::domain::{ArtifactName, ArtifactRef, CacheError, CacheEvent, Result};
use crate::impls::FsArtifactStore;
use crate::index::{EvictionEntry, EvictionIndex};
use crate::ports::{ArtifactStore, ArtifactStream, EventSink};

/// put の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// 新しく書き込んだ。容量を空けるために追い出したものを含む
    Stored {
        artifact: ArtifactRef,
        evicted: Vec<EvictionEntry>,
    },
    /// 既に resident だった。バイト列には触れていない
    AlreadyCached { path: PathBuf },
}

impl PutOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PutOutcome::Stored { artifact, .. } => &artifact.path,
            PutOutcome::AlreadyCached { path } => path,
        }
    }

    pub fn is_already_cached(&self) -> bool {
        matches!(self, PutOutcome::AlreadyCached { .. })
    }

    pub fn evicted(&self) -> &[EvictionEntry] {
        match self {
            PutOutcome::Stored { evicted, .. } => evicted,
            PutOutcome::AlreadyCached { .. } => &[],
        }
    }
}

/// AudioCache はストアと追い出し index を所有する
///
/// `Arc<AudioCache<S>>` にしてトランスポート層から共有する。
pub struct AudioCache<S> {
    store: S,
    capacity: usize,
    index: Mutex<EvictionIndex>,
    events: Arc<dyn EventSink>,
    counters: Counters,
}

impl AudioCache<FsArtifactStore> {
    /// 設定から FS ストアのキャッシュを開く
    ///
    /// `reconcile_on_start` が有効ならディレクトリを走査して index を再構築する。
    pub async fn open(config: &CacheConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        let store = FsArtifactStore::new(&config.store_root, &config.extension);
        let cache = CacheBuilder::new(store)
            .capacity(config.max_cache_size)
            .event_sink(events)
            .build()?;
        if config.reconcile_on_start {
            cache.reconcile().await?;
        }
        Ok(cache)
    }
}

impl<S: ArtifactStore> AudioCache<S> {
    pub(crate) fn from_parts(store: S, capacity: usize, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            capacity,
            index: Mutex::new(EvictionIndex::new()),
            events,
            counters: Counters::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.store.path_for(name)
    }

    /// アーティファクトを保存し、必要なら容量まで追い出す
    ///
    /// # 手順（すべて index のロック内）
    /// 1. resident なら AlreadyCached（冪等）
    /// 2. Store.write。失敗したら index は変更しない
    /// 3. resident 数が capacity 未満になるまで最小のものを追い出す。
    ///    削除に失敗したら追い出し対象を index に戻し、書いたファイルを消してエラーを返す
    /// 4. index に insert
    pub async fn put(&self, name: &ArtifactName, bytes: &[u8]) -> Result<PutOutcome> {
        let mut index = self.index.lock().await;
        Counters::bump(&self.counters.puts);

        if index.contains(name) {
            Counters::bump(&self.counters.already_cached);
            tracing::debug!(name = %name, "artifact already cached");
            self.events.emit(CacheEvent::AlreadyCached { name: name.clone() });
            return Ok(PutOutcome::AlreadyCached {
                path: self.store.path_for(name),
            });
        }

        let artifact = self.store.write(name, bytes).await.inspect_err(|e| {
            tracing::error!(name = %name, error = %e, "failed to persist artifact");
        })?;

        let evicted = match self.evict_until(&mut index, self.capacity - 1).await {
            Ok(evicted) => evicted,
            Err(e) => {
                self.discard_written(&artifact).await;
                return Err(e);
            }
        };

        index.insert(EvictionEntry::from(artifact.clone())).inspect_err(|e| {
            tracing::error!(name = %name, error = %e, "eviction index out of sync with store");
        })?;

        tracing::info!(
            name = %name,
            path = %artifact.path.display(),
            size_bytes = artifact.size_bytes,
            resident = index.len(),
            evicted = evicted.len(),
            "artifact stored"
        );
        self.events.emit(CacheEvent::Stored {
            name: name.clone(),
            size_bytes: artifact.size_bytes,
        });

        Ok(PutOutcome::Stored { artifact, evicted })
    }

    /// index が `target_len` 件以下になるまで最小のものを追い出す
    ///
    /// 削除対象が既に無い場合は警告のみ。それ以外の削除エラーでは
    /// 対象を index に戻してからエラーを返す（ファイルが残る以上 resident のまま）。
    async fn evict_until(
        &self,
        index: &mut EvictionIndex,
        target_len: usize,
    ) -> Result<Vec<EvictionEntry>> {
        let mut evicted = Vec::new();
        while index.len() > target_len {
            let victim = index.pop_min().inspect_err(|e| {
                tracing::error!(error = %e, "eviction index emptied unexpectedly");
            })?;

            let deleted = self.store.delete(&victim.path).await;
            match deleted {
                Ok(()) => {
                    tracing::info!(
                        name = %victim.name,
                        size_bytes = victim.size_bytes,
                        created_at = %victim.created_at,
                        "artifact evicted"
                    );
                    self.events.emit(CacheEvent::Evicted {
                        name: victim.name.clone(),
                        size_bytes: victim.size_bytes,
                        created_at: victim.created_at,
                    });
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!(name = %victim.name, "evicted artifact was already gone from the store");
                    self.events.emit(CacheEvent::EvictionTargetMissing {
                        name: victim.name.clone(),
                    });
                }
                Err(e) => {
                    tracing::error!(name = %victim.name, error = %e, "failed to delete evicted artifact");
                    index.insert(victim)?;
                    return Err(e);
                }
            }

            Counters::bump(&self.counters.evictions);
            evicted.push(victim);
        }
        Ok(evicted)
    }

    /// put が途中で失敗したとき、index に入らなかったファイルを消す
    async fn discard_written(&self, artifact: &ArtifactRef) {
        match self.store.delete(&artifact.path).await {
            Ok(()) => {
                tracing::warn!(name = %artifact.name, "rolled back artifact after failed eviction");
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::error!(
                    name = %artifact.name,
                    error = %e,
                    "failed to roll back artifact; store holds a file the index does not track"
                );
            }
        }
    }

    /// アーティファクトのバイト列を返す
    ///
    /// index は参照も変更もしない。未アップロードでも追い出し済みでも同じ NotFound。
    pub async fn get(&self, name: &ArtifactName) -> Result<Bytes> {
        let path = self.store.path_for(name);
        let result = self.store.read(&path).await;
        self.record_lookup(name, result)
    }

    /// ストリームで開く（ダウンロード用）
    pub async fn open_stream(&self, name: &ArtifactName) -> Result<ArtifactStream> {
        let path = self.store.path_for(name);
        let result = self.store.open(&path).await;
        self.record_lookup(name, result)
    }

    fn record_lookup<T>(&self, name: &ArtifactName, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                Counters::bump(&self.counters.hits);
                tracing::debug!(name = %name, "cache hit");
                Ok(value)
            }
            Err(e) if e.is_not_found() => {
                Counters::bump(&self.counters.misses);
                tracing::debug!(name = %name, "cache miss");
                Err(CacheError::NotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn contains(&self, name: &ArtifactName) -> bool {
        self.index.lock().await.contains(name)
    }

    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.lock().await.is_empty()
    }

    /// resident なアーティファクト（次に追い出されるものが先頭）
    pub async fn resident(&self) -> Vec<EvictionEntry> {
        self.index.lock().await.entries()
    }

    pub async fn stats(&self) -> CacheStats {
        let index = self.index.lock().await;
        self.counters
            .snapshot(index.len(), self.capacity, index.total_bytes())
    }

    /// ストアを走査して index を再構築する
    ///
    /// 再起動直後はストアにファイルが残っていても index は空なので、
    /// stat し直した (size, created_at) で登録し、容量を超えた分は追い出す。
    /// 戻り値は再構築後の resident 数。
    pub async fn reconcile(&self) -> Result<usize> {
        let mut index = self.index.lock().await;
        let found = self.store.list().await?;
        let scanned = found.len();

        for artifact in found {
            if index.contains(&artifact.name) {
                continue;
            }
            index.insert(EvictionEntry::from(artifact))?;
        }

        let evicted = self.evict_until(&mut index, self.capacity).await?;
        tracing::info!(
            scanned,
            resident = index.len(),
            evicted = evicted.len(),
            "eviction index rebuilt from store"
        );
        Ok(index.len())
    }

    /// ストア外で消されたアーティファクトを index から外す
    ///
    /// ストアには触れない。戻り値は外した名前。
    pub async fn prune_missing(&self) -> Result<Vec<ArtifactName>> {
        let mut index = self.index.lock().await;
        let mut missing = Vec::new();
        for entry in index.entries() {
            let found = self.store.stat(&entry.path).await;
            match found {
                Ok(_) => {}
                Err(e) if e.is_not_found() => missing.push(entry.name),
                Err(e) => return Err(e),
            }
        }

        for name in &missing {
            index.remove(name);
            tracing::warn!(name = %name, "artifact deleted outside the cache; dropped from index");
            self.events.emit(CacheEvent::Pruned { name: name.clone() });
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryArtifactStore, RecordingEventSink};
    use crate::ports::{ArtifactStream, FixedClock};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    type TestStore = InMemoryArtifactStore<Arc<FixedClock>>;

    struct Fixture {
        cache: AudioCache<TestStore>,
        clock: Arc<FixedClock>,
        sink: Arc<RecordingEventSink>,
    }

    impl Fixture {
        fn new(capacity: usize) -> Self {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let clock = Arc::new(FixedClock::new(start));
            let sink = Arc::new(RecordingEventSink::new());
            let store = InMemoryArtifactStore::with_clock("mp3", clock.clone());
            let cache = CacheBuilder::new(store)
                .capacity(capacity)
                .event_sink(sink.clone())
                .build()
                .unwrap();
            Self { cache, clock, sink }
        }

        /// 1 秒進めてから put（created_at を一意にする）
        async fn put(&self, raw: &str, size: usize) -> PutOutcome {
            self.clock.advance(Duration::seconds(1));
            self.cache.put(&name(raw), &vec![0u8; size]).await.unwrap()
        }

        /// index とストアが一致していること
        async fn assert_lockstep(&self) {
            let resident = self.cache.resident().await;
            assert_eq!(resident.len(), self.cache.store().len());
            for entry in resident {
                assert!(self.cache.store().contains_path(&entry.path));
            }
        }
    }

    fn name(raw: &str) -> ArtifactName {
        ArtifactName::new(raw).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_returns_bytes() {
        let fx = Fixture::new(2);
        let outcome = fx.cache.put(&name("x"), b"hello").await.unwrap();
        assert!(!outcome.is_already_cached());
        assert_eq!(outcome.path(), Path::new("mem/x.mp3"));
        assert_eq!(&fx.cache.get(&name("x")).await.unwrap()[..], b"hello");
        assert_eq!(fx.cache.len().await, 1);
    }

    #[tokio::test]
    async fn second_put_of_same_name_is_noop() {
        let fx = Fixture::new(2);
        let first = fx.put("x", 10).await;
        let second = fx.cache.put(&name("x"), b"different bytes").await.unwrap();

        assert!(second.is_already_cached());
        assert_eq!(first.path(), second.path());
        assert_eq!(fx.cache.get(&name("x")).await.unwrap().len(), 10);
        assert_eq!(fx.cache.len().await, 1);
        assert!(fx.sink.evicted_names().is_empty());
        assert!(matches!(
            fx.sink.events().last(),
            Some(CacheEvent::AlreadyCached { .. })
        ));
    }

    #[tokio::test]
    async fn evicts_smallest_resident_when_full() {
        let fx = Fixture::new(2);
        fx.put("a", 100).await;
        fx.put("b", 50).await;
        let outcome = fx.put("c", 200).await;

        let evicted: Vec<&str> = outcome.evicted().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(evicted, vec!["b"]);
        assert_eq!(fx.sink.evicted_names(), vec!["b"]);
        assert!(fx.cache.contains(&name("a")).await);
        assert!(fx.cache.contains(&name("c")).await);
        fx.assert_lockstep().await;
    }

    #[tokio::test]
    async fn equal_sizes_evict_oldest_first() {
        let fx = Fixture::new(2);
        fx.put("first", 10).await;
        fx.put("second", 10).await;
        fx.put("third", 10).await;
        assert_eq!(fx.sink.evicted_names(), vec!["first"]);
    }

    #[tokio::test]
    async fn capacity_one_keeps_latest_upload() {
        let fx = Fixture::new(1);
        fx.put("x", 10).await;
        assert_eq!(fx.cache.len().await, 1);

        fx.put("y", 5).await;
        assert_eq!(fx.cache.len().await, 1);
        assert!(fx.cache.contains(&name("y")).await);

        assert!(fx.cache.get(&name("x")).await.unwrap_err().is_not_found());
        assert_eq!(fx.cache.get(&name("y")).await.unwrap().len(), 5);
        fx.assert_lockstep().await;
    }

    #[tokio::test]
    async fn misses_look_the_same_for_evicted_and_unknown() {
        let fx = Fixture::new(1);
        fx.put("gone", 1).await;
        fx.put("kept", 2).await;

        let never = fx.cache.get(&name("never-uploaded")).await.unwrap_err();
        let evicted = fx.cache.get(&name("gone")).await.unwrap_err();
        assert!(matches!(&never, CacheError::NotFound(n) if n == "never-uploaded"));
        assert!(matches!(&evicted, CacheError::NotFound(n) if n == "gone"));
        assert_eq!(never.kind(), evicted.kind());
    }

    #[rstest]
    #[case::one(1)]
    #[case::two(2)]
    #[case::five(5)]
    #[tokio::test]
    async fn resident_count_never_exceeds_capacity(#[case] capacity: usize) {
        let fx = Fixture::new(capacity);
        let sizes = [7, 3, 9, 1, 4, 4, 8, 2, 6, 5, 3, 10];
        for (i, size) in sizes.iter().enumerate() {
            fx.put(&format!("clip{i}"), *size).await;
            assert!(fx.cache.len().await <= capacity);
            fx.assert_lockstep().await;
        }
        assert_eq!(fx.cache.len().await, capacity);
        assert_eq!(fx.sink.evicted_names().len(), sizes.len() - capacity);
    }

    #[tokio::test]
    async fn get_does_not_change_eviction_order() {
        let fx = Fixture::new(2);
        fx.put("small", 1).await;
        fx.put("big", 100).await;
        for _ in 0..5 {
            fx.cache.get(&name("small")).await.unwrap();
        }
        fx.put("new", 50).await;
        assert_eq!(fx.sink.evicted_names(), vec!["small"]);
    }

    #[tokio::test]
    async fn open_stream_reads_whole_artifact() {
        use tokio::io::AsyncReadExt;

        let fx = Fixture::new(2);
        fx.cache.put(&name("x"), b"stream me").await.unwrap();
        let mut stream = fx.cache.open_stream(&name("x")).await.unwrap();
        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "stream me");
        assert!(fx.cache.open_stream(&name("nope")).await.is_err());
    }

    #[tokio::test]
    async fn missing_eviction_target_is_not_fatal() {
        let fx = Fixture::new(1);
        fx.put("a", 1).await;
        fx.cache
            .store()
            .remove_out_of_band(&fx.cache.path_for(&name("a")));

        let outcome = fx.put("b", 2).await;
        assert_eq!(outcome.evicted().len(), 1);
        assert!(fx.sink.events().iter().any(|e| matches!(
            e,
            CacheEvent::EvictionTargetMissing { name } if name.as_str() == "a"
        )));
        assert!(fx.cache.contains(&name("b")).await);
        fx.assert_lockstep().await;
    }

    #[tokio::test]
    async fn stats_track_activity() {
        let fx = Fixture::new(1);
        fx.put("a", 3).await;
        fx.put("a", 3).await;
        fx.put("b", 4).await;
        fx.cache.get(&name("b")).await.unwrap();
        let _ = fx.cache.get(&name("a")).await;

        let stats = fx.cache.stats().await;
        assert_eq!(stats.resident, 1);
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.resident_bytes, 4);
        assert_eq!(stats.puts, 3);
        assert_eq!(stats.already_cached, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn reconcile_rebuilds_index_and_enforces_capacity() {
        let fx = Fixture::new(2);
        let store = fx.cache.store();
        store.insert_out_of_band(&name("a"), &[0; 30]);
        store.insert_out_of_band(&name("b"), &[0; 10]);
        store.insert_out_of_band(&name("c"), &[0; 20]);

        assert_eq!(fx.cache.reconcile().await.unwrap(), 2);
        assert!(!fx.cache.contains(&name("b")).await);
        assert_eq!(fx.sink.evicted_names(), vec!["b"]);
        fx.assert_lockstep().await;

        // もう一度走査しても重複登録にならない
        assert_eq!(fx.cache.reconcile().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn prune_missing_drops_entries_deleted_out_of_band() {
        let fx = Fixture::new(3);
        fx.put("a", 1).await;
        fx.put("b", 2).await;
        fx.cache
            .store()
            .remove_out_of_band(&fx.cache.path_for(&name("a")));

        let pruned = fx.cache.prune_missing().await.unwrap();
        assert_eq!(pruned, vec![name("a")]);
        assert!(!fx.cache.contains(&name("a")).await);
        fx.assert_lockstep().await;

        // 外したあとは普通に put し直せる
        let again = fx.put("a", 1).await;
        assert!(!again.is_already_cached());
    }

    /// `bad*` は write に、`locked*` は delete に失敗するストア
    struct FlakyStore {
        inner: InMemoryArtifactStore,
    }

    #[async_trait]
    impl ArtifactStore for FlakyStore {
        fn path_for(&self, name: &ArtifactName) -> PathBuf {
            self.inner.path_for(name)
        }

        async fn write(&self, name: &ArtifactName, bytes: &[u8]) -> Result<ArtifactRef> {
            if name.as_str().starts_with("bad") {
                return Err(CacheError::Io {
                    path: self.path_for(name),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.write(name, bytes).await
        }

        async fn stat(&self, path: &Path) -> Result<crate::domain::ArtifactMeta> {
            self.inner.stat(path).await
        }

        async fn read(&self, path: &Path) -> Result<Bytes> {
            self.inner.read(path).await
        }

        async fn open(&self, path: &Path) -> Result<ArtifactStream> {
            self.inner.open(path).await
        }

        async fn delete(&self, path: &Path) -> Result<()> {
            let locked = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("locked"));
            if locked {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.inner.delete(path).await
        }

        async fn list(&self) -> Result<Vec<ArtifactRef>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn write_failure_leaves_index_untouched() {
        let store = FlakyStore {
            inner: InMemoryArtifactStore::new("mp3"),
        };
        let cache = CacheBuilder::new(store).capacity(1).build().unwrap();
        cache.put(&name("good"), b"1").await.unwrap();

        let err = cache.put(&name("bad"), b"2").await.unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));

        // 失敗した put は追い出しも起こさない
        assert!(cache.contains(&name("good")).await);
        assert!(!cache.contains(&name("bad")).await);
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn undeletable_victim_stays_resident_and_put_fails() {
        let store = FlakyStore {
            inner: InMemoryArtifactStore::new("mp3"),
        };
        let sink = Arc::new(RecordingEventSink::new());
        let cache = CacheBuilder::new(store)
            .capacity(1)
            .event_sink(sink.clone())
            .build()
            .unwrap();
        cache.put(&name("locked"), b"1").await.unwrap();

        let err = cache.put(&name("b"), b"22").await.unwrap_err();
        assert!(matches!(
            &err,
            CacheError::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        ));

        // 消せなかったものは resident のまま、書いた側は巻き戻される
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains(&name("locked")).await);
        assert!(!cache.contains(&name("b")).await);
        assert_eq!(cache.store().inner.len(), 1);
        assert_eq!(&cache.get(&name("locked")).await.unwrap()[..], b"1");
        assert!(cache.get(&name("b")).await.unwrap_err().is_not_found());
        assert!(sink.evicted_names().is_empty());
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_respect_capacity() {
        const N: usize = 32;
        const K: usize = 5;

        let sink = Arc::new(RecordingEventSink::new());
        let cache = Arc::new(
            CacheBuilder::new(InMemoryArtifactStore::new("mp3"))
                .capacity(K)
                .event_sink(sink.clone())
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let bytes = vec![0u8; 1 + i % 7];
                    cache.put(&name(&format!("clip{i}")), &bytes).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.len().await, K);
        assert_eq!(cache.store().len(), K);
        assert_eq!(sink.evicted_names().len(), N - K);
        for entry in cache.resident().await {
            assert!(cache.store().contains_path(&entry.path));
        }

        let mut evicted = sink.evicted_names();
        evicted.sort();
        evicted.dedup();
        assert_eq!(evicted.len(), N - K);
    }

    #[tokio::test]
    async fn fs_backed_cache_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            max_cache_size: 1,
            store_root: dir.path().join("uploads"),
            ..CacheConfig::default()
        };
        let cache = AudioCache::open(&config, Arc::new(RecordingEventSink::new()))
            .await
            .unwrap();

        cache.put(&name("x"), &[1; 10]).await.unwrap();
        let y = cache.put(&name("y"), &[2; 5]).await.unwrap();
        assert_eq!(y.path(), dir.path().join("uploads").join("y.mp3"));

        assert!(cache.get(&name("x")).await.unwrap_err().is_not_found());
        assert!(!dir.path().join("uploads").join("x.mp3").exists());
        assert_eq!(&cache.get(&name("y")).await.unwrap()[..], &[2u8; 5]);
    }

    #[tokio::test]
    async fn fs_backed_cache_reconciles_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            max_cache_size: 2,
            store_root: dir.path().to_path_buf(),
            reconcile_on_start: true,
            ..CacheConfig::default()
        };

        {
            let cache = AudioCache::open(&config, Arc::new(RecordingEventSink::new()))
                .await
                .unwrap();
            cache.put(&name("a"), &[0; 8]).await.unwrap();
            cache.put(&name("b"), &[0; 9]).await.unwrap();
        }

        let reopened = AudioCache::open(&config, Arc::new(RecordingEventSink::new()))
            .await
            .unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.put(&name("a"), &[0; 8]).await.unwrap().is_already_cached());
    }
}
