//! Bounded in-memory log of fallback transitions
//!
//! Advisory side channel only: the dashboard shows it, nothing depends on it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A single fallback transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackEvent {
    pub source: String,
    pub reason: String,
    pub timestamp_epoch_ms: u64,
}

/// Shared bounded event log; oldest entries are evicted past the cap
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: Arc<RwLock<VecDeque<FallbackEvent>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record a fallback transition
    pub async fn record(&self, source: &str, reason: &str) {
        let event = FallbackEvent {
            source: source.to_string(),
            reason: reason.to_string(),
            timestamp_epoch_ms: current_epoch_ms(),
        };
        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(event);
    }

    /// Copy of all entries, oldest first
    pub async fn snapshot(&self) -> Vec<FallbackEvent> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
