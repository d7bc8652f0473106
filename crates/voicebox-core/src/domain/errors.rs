//! Errors - エラー型と分類
//!
//! ストア・インデックス・トランスポートが共通で返すエラー型です。
//! 呼び出し側（トランスポート層）は `kind()` で分類を見て応答を決めます。

use std::path::PathBuf;

use thiserror::Error;

/// ErrorKind はエラーの運用分類
///
/// - NotFound: アーティファクトが存在しない（get の通常の結果）
/// - Invalid: 呼び出し側の入力が不正（名前・設定・ペイロード）
/// - Infrastructure: ストレージの障害（ディスクフル、権限など）
/// - Internal: index と store の不整合（バグ。回復不能なので操作を中断する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    Infrastructure,
    Internal,
}

/// CacheError はキャッシュ全体のドメインエラー
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("eviction requested on an empty index")]
    EmptyIndex,

    #[error("artifact {0} is already tracked by the eviction index")]
    DuplicateInsert(String),

    #[error("invalid artifact name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("codec rejected payload: {0}")]
    Codec(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// `std::io::Error` を分類しつつ変換する
    ///
    /// `ErrorKind::NotFound` は `CacheError::NotFound` に寄せ、それ以外は `Io` とする。
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CacheError::NotFound(path.display().to_string())
        } else {
            CacheError::Io { path, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::NotFound(_) => ErrorKind::NotFound,
            CacheError::InvalidName { .. } | CacheError::Codec(_) | CacheError::Config(_) => {
                ErrorKind::Invalid
            }
            CacheError::Io { .. } => ErrorKind::Infrastructure,
            CacheError::EmptyIndex | CacheError::DuplicateInsert(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
