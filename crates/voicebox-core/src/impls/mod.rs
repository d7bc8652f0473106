//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FsArtifactStore**: ローカル／ネットワーク FS（本番用）
//! - **InMemoryArtifactStore**: 開発・テスト用のストア
//! - **Mp3Codec**: MP3 ペイロードの受け入れ判定
//! - **RecordingEventSink**: イベントをメモリに記録

pub mod fs_store;
pub mod inmem_store;
pub mod mp3_codec;
pub mod recording_sink;

// 主要な型を再エクスポート
pub use self::fs_store::FsArtifactStore;
pub use self::inmem_store::InMemoryArtifactStore;
pub use self::mp3_codec::Mp3Codec;
pub use self::recording_sink::RecordingEventSink;
