//! Local host metrics: CPU, memory, disk, temperature, network, uptime
//!
//! CPU utilization and network throughput are computed from two time-spaced
//! samples of the kernel's cumulative counters. When the host does not look
//! like a Linux box at all (no readable /proc/stat), the whole snapshot
//! degrades to the mock walk; a missing thermal sensor alone only degrades
//! the temperature reading.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::eventlog::EventLog;
use crate::fetch::{or_mock, FetchResult};
use crate::mock::SystemWalk;

const SAMPLE_GAP: Duration = Duration::from_millis(400);
const CPUFREQ_PATH: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq";
const HOSTNAME_PATH: &str = "/proc/sys/kernel/hostname";

/// CPU load and shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    pub percent: u8,
    pub cores: u32,
    pub freq_mhz: u32,
}

/// Memory usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamStats {
    pub used_gb: f64,
    pub total_gb: f64,
    pub percent: u8,
}

/// Root filesystem usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub used_gb: u64,
    pub total_gb: u64,
    pub percent: u8,
}

/// Network throughput over the sampling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ip: String,
}

/// Full host snapshot, shape shared by live and mock payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub ram: RamStats,
    pub temperature_c: f64,
    pub disk: DiskStats,
    pub network: NetworkStats,
    pub uptime_seconds: u64,
    pub hostname: String,
}

/// Local metrics source with mock fallback
pub struct SystemSource {
    config: SystemConfig,
    events: EventLog,
    walk: Mutex<SystemWalk>,
}

impl std::fmt::Debug for SystemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSource")
            .field("proc_stat_path", &self.config.proc_stat_path)
            .finish()
    }
}

impl SystemSource {
    pub fn new(config: SystemConfig, events: EventLog) -> Self {
        Self {
            config,
            events,
            walk: Mutex::new(SystemWalk::new()),
        }
    }

    #[cfg(test)]
    pub fn with_seed(config: SystemConfig, events: EventLog, seed: u64) -> Self {
        Self {
            config,
            events,
            walk: Mutex::new(SystemWalk::with_seed(seed)),
        }
    }

    /// Take a host snapshot; never fails
    pub async fn snapshot(&self) -> FetchResult<SystemStats> {
        let outcome = self.collect().await;
        or_mock("system", &self.events, outcome, || self.mock_stats()).await
    }

    async fn collect(&self) -> crate::Result<SystemStats> {
        let ticks_1 = self.read_cpu_ticks().await?;
        let net_1 = self.read_net_totals().await;

        tokio::time::sleep(SAMPLE_GAP).await;

        let ticks_2 = self.read_cpu_ticks().await?;
        let net_2 = self.read_net_totals().await;

        let percent = cpu_percent(&ticks_1, &ticks_2).ok_or_else(|| {
            crate::HomedashError::System("unusable /proc/stat samples".to_string())
        })?;

        let meminfo = tokio::fs::read_to_string(&self.config.meminfo_path).await?;
        let ram = parse_meminfo(&meminfo).ok_or_else(|| {
            crate::HomedashError::System("unusable /proc/meminfo".to_string())
        })?;

        let disk = self.disk_usage().await.unwrap_or(DiskStats {
            used_gb: 0,
            total_gb: 0,
            percent: 0,
        });

        let temperature_c = match self.read_temperature().await {
            Some(value) => value,
            None => {
                // Sensor file missing on non-Pi hosts; drift a plausible value
                let mut walk = self.walk.lock().unwrap_or_else(|e| e.into_inner());
                walk.next_temperature()
            }
        };

        let network = match (net_1, net_2) {
            (Some((rx_1, tx_1)), Some((rx_2, tx_2))) => {
                let secs = SAMPLE_GAP.as_secs_f64();
                NetworkStats {
                    download_mbps: bytes_to_mb(rx_2.saturating_sub(rx_1)) / secs,
                    upload_mbps: bytes_to_mb(tx_2.saturating_sub(tx_1)) / secs,
                    ip: local_ip(),
                }
            }
            _ => NetworkStats {
                download_mbps: 0.0,
                upload_mbps: 0.0,
                ip: local_ip(),
            },
        };

        let uptime_seconds = tokio::fs::read_to_string(&self.config.uptime_path)
            .await
            .ok()
            .and_then(|content| parse_uptime(&content))
            .unwrap_or(0);

        Ok(SystemStats {
            cpu: CpuStats {
                percent,
                cores: cpu_cores(),
                freq_mhz: read_cpu_freq().await,
            },
            ram,
            temperature_c,
            disk,
            network,
            uptime_seconds,
            hostname: hostname().await,
        })
    }

    async fn read_cpu_ticks(&self) -> crate::Result<Vec<u64>> {
        let content = tokio::fs::read_to_string(&self.config.proc_stat_path).await?;
        parse_cpu_ticks(&content)
            .ok_or_else(|| crate::HomedashError::System("malformed /proc/stat".to_string()))
    }

    async fn read_net_totals(&self) -> Option<(u64, u64)> {
        let content = tokio::fs::read_to_string(&self.config.net_dev_path)
            .await
            .ok()?;
        parse_net_totals(&content)
    }

    async fn read_temperature(&self) -> Option<f64> {
        let content = tokio::fs::read_to_string(&self.config.thermal_path)
            .await
            .ok()?;
        parse_thermal(&content)
    }

    async fn disk_usage(&self) -> Option<DiskStats> {
        let output = tokio::process::Command::new("df")
            .arg(&self.config.disk_mount)
            .arg("--output=used,size")
            .arg("--block-size=1G")
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_df(&String::from_utf8_lossy(&output.stdout))
    }

    fn mock_stats(&self) -> SystemStats {
        let mut walk = self.walk.lock().unwrap_or_else(|e| e.into_inner());
        walk.next_stats()
    }
}

/// Cumulative tick counters from the aggregate cpu line
pub(crate) fn parse_cpu_ticks(content: &str) -> Option<Vec<u64>> {
    let line = content.lines().next()?;
    let rest = line.strip_prefix("cpu ")?;
    let ticks: Vec<u64> = rest
        .split_whitespace()
        .filter_map(|field| field.parse().ok())
        .collect();
    if ticks.len() >= 4 {
        Some(ticks)
    } else {
        None
    }
}

/// Utilization between two tick samples; the 4th field is idle time
pub(crate) fn cpu_percent(first: &[u64], second: &[u64]) -> Option<u8> {
    if first.len() < 4 || second.len() < 4 {
        return None;
    }
    let total_1: u64 = first.iter().sum();
    let total_2: u64 = second.iter().sum();
    let d_total = total_2.saturating_sub(total_1);
    if d_total == 0 {
        return Some(0);
    }
    let d_idle = second[3].saturating_sub(first[3]);
    let percent = 100.0 * (1.0 - d_idle as f64 / d_total as f64);
    Some(percent.clamp(0.0, 100.0).round() as u8)
}

pub(crate) fn parse_meminfo(content: &str) -> Option<RamStats> {
    let field = |key: &str| -> Option<u64> {
        content
            .lines()
            .find(|line| line.starts_with(key))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total_kb = field("MemTotal:")?;
    let available_kb = field("MemAvailable:")?;
    if total_kb == 0 {
        return None;
    }
    let used_kb = total_kb.saturating_sub(available_kb);
    Some(RamStats {
        used_gb: round1(used_kb as f64 / 1_048_576.0),
        total_gb: round1(total_kb as f64 / 1_048_576.0),
        percent: (100.0 * used_kb as f64 / total_kb as f64).round() as u8,
    })
}

/// Sum rx/tx byte counters over all non-loopback interfaces
pub(crate) fn parse_net_totals(content: &str) -> Option<(u64, u64)> {
    let mut rx_total = 0u64;
    let mut tx_total = 0u64;
    let mut seen = false;
    for line in content.lines().skip(2) {
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        rx_total += fields[0].parse::<u64>().ok()?;
        tx_total += fields[8].parse::<u64>().ok()?;
        seen = true;
    }
    if seen {
        Some((rx_total, tx_total))
    } else {
        None
    }
}

/// Last line of `df --output=used,size --block-size=1G`
pub(crate) fn parse_df(stdout: &str) -> Option<DiskStats> {
    let line = stdout.lines().filter(|l| !l.trim().is_empty()).last()?;
    let mut fields = line.split_whitespace();
    let used_gb: u64 = fields.next()?.trim_end_matches(|c: char| c.is_alphabetic()).parse().ok()?;
    let total_gb: u64 = fields.next()?.trim_end_matches(|c: char| c.is_alphabetic()).parse().ok()?;
    if total_gb == 0 {
        return None;
    }
    Some(DiskStats {
        used_gb,
        total_gb,
        percent: (100.0 * used_gb as f64 / total_gb as f64).round() as u8,
    })
}

/// Millidegrees from the thermal sysfs file
pub(crate) fn parse_thermal(content: &str) -> Option<f64> {
    let millidegrees: i64 = content.trim().parse().ok()?;
    Some(millidegrees as f64 / 1000.0)
}

pub(crate) fn parse_uptime(content: &str) -> Option<u64> {
    let seconds: f64 = content.split_whitespace().next()?.parse().ok()?;
    Some(seconds as u64)
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn cpu_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

async fn read_cpu_freq() -> u32 {
    tokio::fs::read_to_string(CPUFREQ_PATH)
        .await
        .ok()
        .and_then(|content| content.trim().parse::<u64>().ok())
        .map(|khz| (khz / 1000) as u32)
        .unwrap_or(1800)
}

async fn hostname() -> String {
    if let Ok(name) = tokio::fs::read_to_string(HOSTNAME_PATH).await {
        return name.trim().to_string();
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "raspberrypi".to_string())
}

/// Local address as seen when routing towards a public host; no packet is
/// actually sent for a UDP connect
fn local_ip() -> String {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("1.1.1.1:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}
