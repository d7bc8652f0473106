//! ArtifactStore port - 音声アーティファクトの永続化（Local FS / InMemory）
//!
//! ArtifactStore は名前から決定的に導いたパスにバイト列を保存します。
//! index（どれが resident か）は持たず、それは AudioCache の責務です。
//!
//! # 実装
//! - **FsArtifactStore**: ローカル／ネットワーク FS（本番用）
//! - **InMemoryArtifactStore**: テスト・デモ用

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::domain::{ArtifactMeta, ArtifactName, ArtifactRef, Result};

/// ダウンロード用のストリーム
pub type ArtifactStream = Box<dyn AsyncRead + Send + Unpin>;

/// ArtifactStore は名前付きアーティファクトのバイト列を保存
///
/// # 設計原則
/// - パスは `path_for` で名前から純粋に導出する（index 参照不要）
/// - 書き込みはファイル全体、削除もファイル全体。途中で切り詰めない
/// - 既存パスへの write は黙って上書きする（重複防止は呼び出し側の責務）
/// - 存在しないパスへの stat/read/open/delete は `CacheError::NotFound`
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 名前から保存先パスを導出
    fn path_for(&self, name: &ArtifactName) -> PathBuf;

    /// バイト列を保存し、ストアが付与したサイズと作成時刻を返す
    async fn write(&self, name: &ArtifactName, bytes: &[u8]) -> Result<ArtifactRef>;

    async fn stat(&self, path: &Path) -> Result<ArtifactMeta>;

    async fn read(&self, path: &Path) -> Result<Bytes>;

    async fn open(&self, path: &Path) -> Result<ArtifactStream>;

    async fn delete(&self, path: &Path) -> Result<()>;

    /// ストア内の全アーティファクト（起動時の index 再構築用）
    async fn list(&self) -> Result<Vec<ArtifactRef>>;
}
