//! FsArtifactStore - ローカル／ネットワーク FS 上のアーティファクトストア
//!
//! # 実装詳細
//! - パスは `{root}/{name}.{ext}`
//! - 書き込みは `.{name}.{ext}.part` に書いてから rename する。
//!   reader が書きかけのファイルを読むことはない
//! - created_at はファイルの birth time。取れない FS では mtime で代用
//! - 大文字小文字を区別しない FS（macOS の APFS 既定、Windows の NTFS）では
//!   `A` と `a` が同じファイルになる。index は別物として扱うので、片方を
//!   追い出すともう片方のバイト列も消える。そうした FS を root にしないこと

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{ArtifactMeta, ArtifactName, ArtifactRef, CacheError, Result};
use crate::ports::{ArtifactStore, ArtifactStream};

/// 1 要素あたりのファイル名の上限（ext4 / APFS / NTFS 共通）
const MAX_FILE_NAME_LEN: usize = 255;

/// FsArtifactStore はディレクトリ 1 つをストアとして扱う
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    extension: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn part_file_name(&self, name: &ArtifactName) -> String {
        format!(".{}.{}.part", name, self.extension)
    }

    /// 一時ファイル名まで含めて FS の上限に収まるか
    fn check_file_name(&self, name: &ArtifactName) -> Result<()> {
        if self.part_file_name(name).len() > MAX_FILE_NAME_LEN {
            return Err(CacheError::InvalidName {
                name: name.to_string(),
                reason: "name is too long for the store's file names",
            });
        }
        Ok(())
    }

    /// read_dir のエントリがこのストアのアーティファクトならその名前を返す
    fn name_of(&self, path: &Path) -> Option<ArtifactName> {
        if path.extension()?.to_str()? != self.extension {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        match ArtifactName::new(stem) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file with unusable name");
                None
            }
        }
    }
}

fn io_failure(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn meta_from(path: &Path, metadata: &std::fs::Metadata) -> Result<ArtifactMeta> {
    let created: SystemTime = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|e| io_failure(path, e))?;
    Ok(ArtifactMeta {
        size_bytes: metadata.len(),
        created_at: DateTime::<Utc>::from(created),
    })
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.root.join(format!("{}.{}", name, self.extension))
    }

    async fn write(&self, name: &ArtifactName, bytes: &[u8]) -> Result<ArtifactRef> {
        self.check_file_name(name)?;
        let path = self.path_for(name);
        let part = self.root.join(self.part_file_name(name));

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_failure(&self.root, e))?;

        let written = async {
            let mut file = fs::File::create(&part).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&part, &path).await
        }
        .await;

        if let Err(e) = written {
            // 書きかけは残さない
            let _ = fs::remove_file(&part).await;
            return Err(io_failure(&path, e));
        }

        let metadata = fs::metadata(&path).await.map_err(|e| io_failure(&path, e))?;
        let meta = meta_from(&path, &metadata)?;
        Ok(ArtifactRef::new(name.clone(), path, meta))
    }

    async fn stat(&self, path: &Path) -> Result<ArtifactMeta> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(CacheError::NotFound(path.display().to_string()));
        }
        meta_from(path, &metadata)
    }

    async fn read(&self, path: &Path) -> Result<Bytes> {
        let content = fs::read(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))?;
        Ok(Bytes::from(content))
    }

    async fn open(&self, path: &Path) -> Result<ArtifactStream> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))?;
        Ok(Box::new(file))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| CacheError::from_io(path, e))
    }

    async fn list(&self) -> Result<Vec<ArtifactRef>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_failure(&self.root, e)),
        };

        let mut found = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| io_failure(&self.root, e))? {
            let path = entry.path();
            let Some(name) = self.name_of(&path) else {
                continue;
            };
            let metadata = entry.metadata().await.map_err(|e| io_failure(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            let meta = meta_from(&path, &metadata)?;
            found.push(ArtifactRef::new(name, path, meta));
        }
        Ok(found)
    }
}
