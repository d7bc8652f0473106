//! InMemoryArtifactStore - 開発・テスト用のストア
//!
//! # 学習ポイント
//! - Clock を差し込むことで created_at を決定的にできる
//! - `remove_out_of_band` で「ストア外での削除」を再現できる

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::{ArtifactMeta, ArtifactName, ArtifactRef, CacheError, Result};
use crate::ports::{ArtifactStore, ArtifactStream, Clock, SystemClock};

#[derive(Debug, Clone)]
struct StoredBlob {
    name: ArtifactName,
    bytes: Bytes,
    created_at: DateTime<Utc>,
}

/// InMemoryArtifactStore は HashMap<PathBuf, StoredBlob> をストアとして扱う
///
/// 仮想ルート `root` 配下に `{name}.{ext}` というパスを割り当てる。
pub struct InMemoryArtifactStore<C = SystemClock> {
    root: PathBuf,
    extension: String,
    clock: C,
    blobs: Mutex<HashMap<PathBuf, StoredBlob>>,
}

impl InMemoryArtifactStore<SystemClock> {
    pub fn new(extension: impl Into<String>) -> Self {
        Self::with_clock(extension, SystemClock)
    }
}

impl<C: Clock> InMemoryArtifactStore<C> {
    pub fn with_clock(extension: impl Into<String>, clock: C) -> Self {
        Self {
            root: PathBuf::from("mem"),
            extension: extension.into(),
            clock,
            blobs: Mutex::new(HashMap::new()),
        }
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// キャッシュを経由せずに削除する（index とストアの食い違いを作るため）
    pub fn remove_out_of_band(&self, path: &Path) -> bool {
        self.blobs().remove(path).is_some()
    }

    /// キャッシュを経由せずに置く（再起動前から残っているファイルの再現）
    pub fn insert_out_of_band(&self, name: &ArtifactName, bytes: &[u8]) -> PathBuf {
        let path = self.path_for(name);
        let blob = StoredBlob {
            name: name.clone(),
            bytes: Bytes::copy_from_slice(bytes),
            created_at: self.clock.now(),
        };
        self.blobs().insert(path.clone(), blob);
        path
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.blobs().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.blobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, path: &Path) -> Result<StoredBlob> {
        self.blobs()
            .get(path)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(path.display().to_string()))
    }
}

#[async_trait]
impl<C: Clock> ArtifactStore for InMemoryArtifactStore<C> {
    fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }

    async fn write(&self, name: &ArtifactName, bytes: &[u8]) -> Result<ArtifactRef> {
        let path = self.insert_out_of_band(name, bytes);
        let blob = self.lookup(&path)?;
        let meta = ArtifactMeta {
            size_bytes: blob.bytes.len() as u64,
            created_at: blob.created_at,
        };
        Ok(ArtifactRef::new(name.clone(), path, meta))
    }

    async fn stat(&self, path: &Path) -> Result<ArtifactMeta> {
        let blob = self.lookup(path)?;
        Ok(ArtifactMeta {
            size_bytes: blob.bytes.len() as u64,
            created_at: blob.created_at,
        })
    }

    async fn read(&self, path: &Path) -> Result<Bytes> {
        Ok(self.lookup(path)?.bytes)
    }

    async fn open(&self, path: &Path) -> Result<ArtifactStream> {
        let bytes = self.lookup(path)?.bytes;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        if self.remove_out_of_band(path) {
            Ok(())
        } else {
            Err(CacheError::NotFound(path.display().to_string()))
        }
    }

    async fn list(&self) -> Result<Vec<ArtifactRef>> {
        let blobs = self.blobs();
        Ok(blobs
            .iter()
            .map(|(path, blob)| {
                let meta = ArtifactMeta {
                    size_bytes: blob.bytes.len() as u64,
                    created_at: blob.created_at,
                };
                ArtifactRef::new(blob.name.clone(), path.clone(), meta)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    #[tokio::test]
    async fn created_at_comes_from_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let store = InMemoryArtifactStore::with_clock("mp3", clock.clone());

        let a = store.write(&ArtifactName::new("a").unwrap(), b"1").await.unwrap();
        clock.advance(Duration::seconds(1));
        let b = store.write(&ArtifactName::new("b").unwrap(), b"22").await.unwrap();

        assert_eq!(a.created_at, start);
        assert_eq!(b.created_at, start + Duration::seconds(1));
        assert_eq!(b.size_bytes, 2);
        assert_eq!(a.path, PathBuf::from("mem/a.mp3"));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let store = InMemoryArtifactStore::new("mp3");
        let a = store.write(&ArtifactName::new("a").unwrap(), b"1").await.unwrap();
        store.delete(&a.path).await.unwrap();
        assert!(store.delete(&a.path).await.unwrap_err().is_not_found());
        assert!(store.read(&a.path).await.unwrap_err().is_not_found());
        assert!(store.is_empty());
    }
}
