//! Recent activity feed kept in the shared store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use super::{KvStore, StoreError};

/// Store key of the activity feed
pub const ACTIVITY_KEY: &str = "activities";

/// Number of entries kept
pub const ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    System,
    Defense,
    Wave,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn now(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Newest-first list of the last few activities
#[derive(Clone)]
pub struct ActivityLog<S> {
    store: S,
}

impl<S: KvStore> ActivityLog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current entries, newest first. A corrupt feed reads as empty.
    pub async fn entries(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        let Some(raw) = self.store.get(ACTIVITY_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable activity feed");
                Ok(Vec::new())
            }
        }
    }

    /// Prepend an entry and keep only the newest ones
    pub async fn record(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        let mut entries = self.entries().await?;
        entries.insert(0, entry);
        entries.truncate(ACTIVITY_LIMIT);

        let raw = serde_json::to_string(&entries)
            .map_err(|e| StoreError::Unavailable(format!("encode activities: {e}")))?;
        self.store.set(ACTIVITY_KEY, raw).await
    }

    /// Record entries on a background task, one at a time and in send order.
    ///
    /// Sending never blocks. The task ends once every sender is dropped and
    /// the queue is drained.
    pub fn spawn_writer(self) -> mpsc::UnboundedSender<ActivityEntry> {
        let (tx, mut rx) = mpsc::unbounded_channel::<ActivityEntry>();

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = self.record(entry).await {
                    warn!(error = %e, "Failed to record activity");
                }
            }
        });

        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn keeps_newest_ten() {
        let log = ActivityLog::new(MemoryStore::new());

        for wave in 1..=12 {
            log.record(ActivityEntry::now(ActivityKind::Wave, format!("Wave {wave} completed")))
                .await
                .unwrap();
        }

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), ACTIVITY_LIMIT);
        assert_eq!(entries[0].message, "Wave 12 completed");
        assert_eq!(entries[9].message, "Wave 3 completed");
    }

    #[tokio::test]
    async fn corrupt_feed_reads_as_empty() {
        let store = MemoryStore::new();
        store.set(ACTIVITY_KEY, "not json".to_string()).await.unwrap();
        let log = ActivityLog::new(store);

        assert!(log.entries().await.unwrap().is_empty());
        log.record(ActivityEntry::now(ActivityKind::System, "Defense system activated"))
            .await
            .unwrap();
        assert_eq!(log.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn writer_keeps_send_order() {
        let store = MemoryStore::new();
        let writer = ActivityLog::new(store.clone()).spawn_writer();

        for wave in 1..=3 {
            writer
                .send(ActivityEntry::now(ActivityKind::Wave, format!("Wave {wave} completed")))
                .unwrap();
        }
        drop(writer);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let messages: Vec<_> = ActivityLog::new(store)
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, ["Wave 3 completed", "Wave 2 completed", "Wave 1 completed"]);
    }

    #[test]
    fn entry_json_layout() {
        let entry = ActivityEntry::now(ActivityKind::Alert, "Nexus compromised - Score: 40");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["type"], "alert");
        assert!(json["timestamp"].is_i64());
    }
}
