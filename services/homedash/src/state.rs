//! Shared state: latest snapshot per source plus sparkline histories

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::fetch::FetchResult;
use crate::github::{EventItem, GitHubUser, Repo};
use crate::n8n::Workflow;
use crate::ring::RingBuffer;
use crate::system::SystemStats;
use crate::tasks::Task;
use crate::weather::{ForecastDay, WeatherReport};

/// Sparkline history length, enough for one widget width
pub const HISTORY_CAPACITY: usize = 40;

/// Latest payload of one source, stamped with provenance and fetch time
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<T> {
    pub data: T,
    pub mock: bool,
    pub fetched_at_epoch_ms: u64,
}

impl<T> Snapshot<T> {
    pub fn new(result: FetchResult<T>, fetched_at_epoch_ms: u64) -> Self {
        Self {
            data: result.value,
            mock: result.mock,
            fetched_at_epoch_ms,
        }
    }

    /// Stamp a fetch result with the current wall clock
    pub fn stamped(result: FetchResult<T>) -> Self {
        Self::new(result, current_epoch_ms())
    }
}

/// State shared between pollers and the dashboard
///
/// Each poller writes disjoint fields, so concurrent ticks only contend on
/// the lock itself; the last writer wins.
#[derive(Debug)]
pub struct SharedState {
    pub system: Option<Snapshot<SystemStats>>,
    pub weather: Option<Snapshot<WeatherReport>>,
    pub forecast: Option<Snapshot<Vec<ForecastDay>>>,
    pub github_user: Option<Snapshot<GitHubUser>>,
    pub github_repos: Option<Snapshot<Vec<Repo>>>,
    pub github_events: Option<Snapshot<Vec<EventItem>>>,
    pub workflows: Option<Snapshot<Vec<Workflow>>>,
    pub tasks: Option<Snapshot<Vec<Task>>>,
    pub cpu_history: RingBuffer,
    pub temperature_history: RingBuffer,
    pub net_down_history: RingBuffer,
    pub net_up_history: RingBuffer,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            system: None,
            weather: None,
            forecast: None,
            github_user: None,
            github_repos: None,
            github_events: None,
            workflows: None,
            tasks: None,
            cpu_history: RingBuffer::new(HISTORY_CAPACITY),
            temperature_history: RingBuffer::new(HISTORY_CAPACITY),
            net_down_history: RingBuffer::new(HISTORY_CAPACITY),
            net_up_history: RingBuffer::new(HISTORY_CAPACITY),
        }
    }

    /// Store a system snapshot and extend the sparkline histories
    pub fn record_system(&mut self, result: FetchResult<SystemStats>, now_ms: u64) {
        self.cpu_history.push(result.value.cpu.percent as f64);
        self.temperature_history.push(result.value.temperature_c);
        self.net_down_history.push(result.value.network.download_mbps);
        self.net_up_history.push(result.value.network.upload_mbps);
        self.system = Some(Snapshot::new(result, now_ms));
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(SharedState::new()))
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{CpuStats, DiskStats, NetworkStats, RamStats};

    fn stats(cpu: u8, temp: f64) -> SystemStats {
        SystemStats {
            cpu: CpuStats {
                percent: cpu,
                cores: 4,
                freq_mhz: 1800,
            },
            ram: RamStats {
                used_gb: 4.0,
                total_gb: 8.0,
                percent: 50,
            },
            temperature_c: temp,
            disk: DiskStats {
                used_gb: 45,
                total_gb: 128,
                percent: 35,
            },
            network: NetworkStats {
                download_mbps: 1.5,
                upload_mbps: 0.5,
                ip: "192.168.1.2".to_string(),
            },
            uptime_seconds: 3600,
            hostname: "pi".to_string(),
        }
    }

    #[test]
    fn record_system_updates_snapshot_and_histories() {
        let mut state = SharedState::new();
        state.record_system(FetchResult::live(stats(20, 41.0)), 1000);
        state.record_system(FetchResult::fallback(stats(25, 42.5)), 2000);

        let snapshot = state.system.as_ref().unwrap();
        assert!(snapshot.mock);
        assert_eq!(snapshot.data.cpu.percent, 25);
        assert_eq!(snapshot.fetched_at_epoch_ms, 2000);

        assert_eq!(state.cpu_history.values(), vec![20.0, 25.0]);
        assert_eq!(state.temperature_history.values(), vec![41.0, 42.5]);
        assert_eq!(state.net_down_history.len(), 2);
    }

    #[test]
    fn histories_are_bounded() {
        let mut state = SharedState::new();
        for i in 0..HISTORY_CAPACITY + 5 {
            state.record_system(FetchResult::live(stats((i % 90) as u8, 40.0)), i as u64);
        }
        assert_eq!(state.cpu_history.len(), HISTORY_CAPACITY);
        assert_eq!(state.temperature_history.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn snapshot_serializes_with_provenance() {
        let snapshot = Snapshot::new(FetchResult::fallback(7u32), 1234);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": 7, "mock": true, "fetched_at_epoch_ms": 1234})
        );
    }
}
