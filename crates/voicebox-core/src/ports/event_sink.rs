//! EventSink port - キャッシュイベントの記録
//!
//! # 実装
//! - NoopEventSink: 何もしない（デフォルト）
//! - RecordingEventSink（impls）: メモリに溜める（テスト・CLI 用）

use crate::domain::CacheEvent;

/// EventSink は CacheEvent を受け取る
///
/// put のロック中に呼ばれるので、ブロックする処理を入れないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CacheEvent);
}

/// NoopEventSink は何もしない
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: CacheEvent) {}
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: CacheEvent) {
        (**self).emit(event)
    }
}
