//! RecordingEventSink - イベントをメモリに溜める EventSink

use std::sync::Mutex;

use crate::domain::CacheEvent;
use crate::ports::EventSink;

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Evicted イベントの名前だけを発生順に返す
    pub fn evicted_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CacheEvent::Evicted { name, .. } => Some(name.into()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: CacheEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
