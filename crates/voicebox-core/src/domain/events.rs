//! Events - キャッシュで発生したドメインイベント
//!
//! EventSink ポートに渡されます。ログとは別に、テストや CLI が
//! 「何が追い出されたか」を後から確認できるようにするためのものです。

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::artifact::ArtifactName;

/// CacheEvent はキャッシュ操作の結果として発生するイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    /// 新しいアーティファクトが書き込まれ、index に登録された
    Stored { name: ArtifactName, size_bytes: u64 },

    /// 既に resident だったため何もしなかった（冪等 put）
    AlreadyCached { name: ArtifactName },

    /// 容量制限のために追い出された
    Evicted {
        name: ArtifactName,
        size_bytes: u64,
        created_at: DateTime<Utc>,
    },

    /// 追い出し対象のファイルが既に存在しなかった（非致命）
    EvictionTargetMissing { name: ArtifactName },

    /// ストア外で削除されたため index から外した
    Pruned { name: ArtifactName },
}

impl CacheEvent {
    pub fn name(&self) -> &ArtifactName {
        match self {
            CacheEvent::Stored { name, .. }
            | CacheEvent::AlreadyCached { name }
            | CacheEvent::Evicted { name, .. }
            | CacheEvent::EvictionTargetMissing { name }
            | CacheEvent::Pruned { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let event = CacheEvent::Stored {
            name: ArtifactName::new("x").unwrap(),
            size_bytes: 10,
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event"], "stored");
        assert_eq!(v["name"], "x");
        assert_eq!(v["size_bytes"], 10);
        assert_eq!(event.name().as_str(), "x");
    }
}
