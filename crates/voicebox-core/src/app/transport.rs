//! Transport - アップロード／ダウンロード窓口
//!
//! HTTP フレームワークには依存せず、JSON 形のリクエスト／レスポンスと
//! ステータスコードだけを扱います。サーバやCLIはこの層を呼ぶだけです。
//!
//! # 学習ポイント
//! - ドメインエラー（CacheError）を `kind()` でステータスコードに写す
//! - リクエストごとに RequestId を払い出し、tracing の span に載せる

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::app::cache::{AudioCache, PutOutcome};
use crate::domain::{ArtifactName, CacheError, ErrorKind};
use crate::ports::{ArtifactStore, ArtifactStream, AudioCodec, IdGenerator};

pub const MSG_UPLOADED: &str = "Audio file uploaded successfully";
pub const MSG_ALREADY_CACHED: &str = "File already cached";

/// アップロード要求。`bytes` は base64 文字列
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    pub bytes: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

pub struct DownloadStream {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: ArtifactStream,
}

/// TransportError はステータスコード付きのエラー応答
///
/// JSON では `{"error": "..."}` になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{status} {message}")]
pub struct TransportError {
    #[serde(skip)]
    pub status: u16,
    #[serde(rename = "error")]
    pub message: String,
}

impl TransportError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found() -> Self {
        Self::new(404, "File not found")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// 入力不正は 400、存在しないものは 404、それ以外は `fallback` 付きの 500
    fn from_cache(err: &CacheError, fallback: &str) -> Self {
        match err.kind() {
            ErrorKind::Invalid => Self::bad_request(err.to_string()),
            ErrorKind::NotFound => Self::not_found(),
            ErrorKind::Infrastructure | ErrorKind::Internal => Self::internal(fallback),
        }
    }
}

/// AudioEndpoints は AudioCache の前段
pub struct AudioEndpoints<S> {
    cache: Arc<AudioCache<S>>,
    codec: Arc<dyn AudioCodec>,
    ids: Arc<dyn IdGenerator>,
}

impl<S> Clone for AudioEndpoints<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            codec: self.codec.clone(),
            ids: self.ids.clone(),
        }
    }
}

impl<S: ArtifactStore> AudioEndpoints<S> {
    pub fn new(
        cache: Arc<AudioCache<S>>,
        codec: Arc<dyn AudioCodec>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { cache, codec, ids }
    }

    pub fn cache(&self) -> &Arc<AudioCache<S>> {
        &self.cache
    }

    /// # 処理フロー
    /// 1. bytes / filename の有無と名前を検証（400）
    /// 2. resident なら "File already cached"（ペイロードはデコードしない）
    /// 3. base64 デコード（400）→ コーデック（500）→ put（500）
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, TransportError> {
        let request_id = self.ids.generate_request_id();
        let span = tracing::info_span!("upload", %request_id);
        self.handle_upload(request).instrument(span).await
    }

    async fn handle_upload(&self, request: UploadRequest) -> Result<UploadResponse, TransportError> {
        let Some(encoded) = request.bytes else {
            return Err(TransportError::bad_request("No audio file provided"));
        };
        let Some(filename) = request.filename else {
            return Err(TransportError::bad_request("No filename provided"));
        };
        let name = ArtifactName::new(filename)
            .map_err(|e| TransportError::from_cache(&e, "Failed to save audio file"))?;

        if self.cache.contains(&name).await {
            tracing::debug!(name = %name, "upload skipped, already cached");
            return Ok(self.already_cached(&name));
        }

        let raw = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            tracing::warn!(name = %name, error = %e, "upload payload is not valid base64");
            TransportError::bad_request(format!("Invalid audio payload encoding: {e}"))
        })?;

        let audio = self.codec.encode(&raw).map_err(|e| {
            tracing::warn!(name = %name, error = %e, "codec rejected upload");
            TransportError::internal("Failed to process audio file")
        })?;

        let outcome = self.cache.put(&name, &audio).await.map_err(|e| {
            tracing::error!(name = %name, error = %e, "failed to store upload");
            TransportError::from_cache(&e, "Failed to save audio file")
        })?;

        match outcome {
            // contains と put の間に他のアップロードが入った場合
            PutOutcome::AlreadyCached { .. } => Ok(self.already_cached(&name)),
            PutOutcome::Stored { artifact, .. } => Ok(UploadResponse {
                message: MSG_UPLOADED.to_string(),
                file_path: artifact.path.display().to_string(),
            }),
        }
    }

    fn already_cached(&self, name: &ArtifactName) -> UploadResponse {
        UploadResponse {
            message: MSG_ALREADY_CACHED.to_string(),
            file_path: self.cache.path_for(name).display().to_string(),
        }
    }

    /// アーティファクト全体をメモリに読んで返す
    pub async fn download(&self, name: Option<&str>) -> Result<DownloadResponse, TransportError> {
        let request_id = self.ids.generate_request_id();
        let span = tracing::info_span!("download", %request_id);
        async {
            let name = self.parse_name(name)?;
            let body = self
                .cache
                .get(&name)
                .await
                .map_err(|e| self.download_failure(&name, e))?;
            Ok::<_, TransportError>(DownloadResponse {
                file_name: self.file_name(&name),
                content_type: self.codec.content_type(),
                body,
            })
        }
        .instrument(span)
        .await
    }

    /// ストリームとして返す（大きいファイル向け）
    pub async fn download_stream(&self, name: Option<&str>) -> Result<DownloadStream, TransportError> {
        let request_id = self.ids.generate_request_id();
        let span = tracing::info_span!("download_stream", %request_id);
        async {
            let name = self.parse_name(name)?;
            let body = self
                .cache
                .open_stream(&name)
                .await
                .map_err(|e| self.download_failure(&name, e))?;
            Ok::<_, TransportError>(DownloadStream {
                file_name: self.file_name(&name),
                content_type: self.codec.content_type(),
                body,
            })
        }
        .instrument(span)
        .await
    }

    fn parse_name(&self, name: Option<&str>) -> Result<ArtifactName, TransportError> {
        let raw = name.ok_or_else(|| TransportError::bad_request("No filename provided"))?;
        ArtifactName::new(raw).map_err(|e| TransportError::from_cache(&e, "Failed to read audio file"))
    }

    fn download_failure(&self, name: &ArtifactName, err: CacheError) -> TransportError {
        if !err.is_not_found() {
            tracing::error!(name = %name, error = %err, "failed to read artifact");
        }
        TransportError::from_cache(&err, "Failed to read audio file")
    }

    fn file_name(&self, name: &ArtifactName) -> String {
        format!("{}.{}", name, self.codec.extension())
    }
}
