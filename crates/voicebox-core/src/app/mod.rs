//! App - アプリケーション層
//!
//! ports を組み合わせてキャッシュの振る舞いを実装します。
//!
//! # 主要コンポーネント
//! - **CacheBuilder**: AudioCache の構築とワイヤリング
//! - **AudioCache**: put / get / 追い出し / 再構築
//! - **AudioEndpoints**: アップロード／ダウンロード窓口
//! - **CacheConfig**: 環境変数からの設定
//! - **CacheStats**: 統計のスナップショット

pub mod builder;
pub mod cache;
pub mod config;
pub mod status;
pub mod transport;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, CacheBuilder};
pub use self::cache::{AudioCache, PutOutcome};
pub use self::config::CacheConfig;
pub use self::status::CacheStats;
pub use self::transport::{
    AudioEndpoints, DownloadResponse, DownloadStream, TransportError, UploadRequest,
    UploadResponse,
};
