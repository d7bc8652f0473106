//! Ports - 抽象化レイヤー
//!
//! AudioCache が外部（ファイルシステム、時計、コーデック、イベント出力）に
//! 触れる箇所を trait として定義します。実装は `impls` にあります。

pub mod artifact_store;
pub mod clock;
pub mod codec;
pub mod event_sink;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::artifact_store::{ArtifactStore, ArtifactStream};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::codec::AudioCodec;
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
