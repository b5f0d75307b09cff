//! Mock payload generators
//!
//! Simulated metrics are random walks over explicit state: each call nudges
//! the previous value by a bounded step and clamps to the domain range, so a
//! disconnected dashboard still shows a plausible time series instead of
//! uncorrelated noise. All randomness comes from an injected RNG; callers
//! own the state, so independent instances never interfere.

use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::github::{EventItem, GitHubUser, Repo};
use crate::n8n::Workflow;
use crate::system::{CpuStats, DiskStats, NetworkStats, RamStats, SystemStats};
use crate::tasks::Task;
use crate::weather::{ForecastDay, WeatherReport};

/// Domain bounds and per-tick step sizes for the simulated metrics
pub const CPU_RANGE: (f64, f64) = (5.0, 95.0);
pub const CPU_STEP: f64 = 2.0;
pub const RAM_RANGE_GB: (f64, f64) = (2.0, 7.5);
pub const RAM_STEP_GB: f64 = 0.2;
pub const TEMP_RANGE_C: (f64, f64) = (35.0, 80.0);
pub const TEMP_STEP_C: f64 = 1.5;
pub const DISK_RANGE_PCT: (f64, f64) = (20.0, 90.0);
pub const DISK_STEP_PCT: f64 = 0.1;
pub const NET_DOWN_RANGE: (f64, f64) = (0.0, 500.0);
pub const NET_DOWN_STEP: f64 = 5.0;
pub const NET_UP_RANGE: (f64, f64) = (0.0, 100.0);
pub const NET_UP_STEP: f64 = 2.0;

const RAM_TOTAL_GB: f64 = 8.0;
const DISK_TOTAL_GB: u64 = 128;
const MOCK_HOSTNAME: &str = "raspberrypi-node-05";
const MOCK_UPTIME_SECONDS: u64 = 1_211_000;

/// Random-walk state for the simulated host
#[derive(Debug)]
pub struct SystemWalk {
    cpu: f64,
    ram_gb: f64,
    temp_c: f64,
    disk_pct: f64,
    net_down: f64,
    net_up: f64,
    rng: StdRng,
}

impl SystemWalk {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            cpu: 24.0,
            ram_gb: 4.2,
            temp_c: 42.0,
            disk_pct: 45.0,
            net_down: 12.4,
            net_up: 4.1,
            rng,
        }
    }

    /// Advance the walk one tick and return the resulting snapshot
    pub fn next_stats(&mut self) -> SystemStats {
        self.cpu = step(&mut self.rng, self.cpu, CPU_STEP, CPU_RANGE);
        self.ram_gb = step(&mut self.rng, self.ram_gb, RAM_STEP_GB, RAM_RANGE_GB);
        self.temp_c = step(&mut self.rng, self.temp_c, TEMP_STEP_C, TEMP_RANGE_C);
        self.disk_pct = step(&mut self.rng, self.disk_pct, DISK_STEP_PCT, DISK_RANGE_PCT);
        self.net_down = step(&mut self.rng, self.net_down, NET_DOWN_STEP, NET_DOWN_RANGE);
        self.net_up = step(&mut self.rng, self.net_up, NET_UP_STEP, NET_UP_RANGE);

        SystemStats {
            cpu: CpuStats {
                percent: self.cpu.round() as u8,
                cores: 4,
                freq_mhz: 2400,
            },
            ram: RamStats {
                used_gb: round1(self.ram_gb),
                total_gb: RAM_TOTAL_GB,
                percent: (100.0 * self.ram_gb / RAM_TOTAL_GB).round() as u8,
            },
            temperature_c: round1(self.temp_c),
            disk: DiskStats {
                used_gb: (self.disk_pct / 100.0 * DISK_TOTAL_GB as f64).round() as u64,
                total_gb: DISK_TOTAL_GB,
                percent: self.disk_pct.round() as u8,
            },
            network: NetworkStats {
                download_mbps: round1(self.net_down),
                upload_mbps: round1(self.net_up),
                ip: "192.168.1.104".to_string(),
            },
            uptime_seconds: MOCK_UPTIME_SECONDS,
            hostname: MOCK_HOSTNAME.to_string(),
        }
    }

    /// Advance only the temperature component
    pub fn next_temperature(&mut self) -> f64 {
        self.temp_c = step(&mut self.rng, self.temp_c, TEMP_STEP_C, TEMP_RANGE_C);
        round1(self.temp_c)
    }
}

impl Default for SystemWalk {
    fn default() -> Self {
        Self::new()
    }
}

fn step(rng: &mut StdRng, prev: f64, step: f64, (lo, hi): (f64, f64)) -> f64 {
    (prev + rng.gen_range(-step..=step)).clamp(lo, hi)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// (id, condition, description, icon, temp, feels_like, humidity, wind km/h)
const WEATHER_TABLE: [(u16, &str, &str, &str, f64, f64, u8, f64); 4] = [
    (800, "Clear", "clear sky", "01d", 22.0, 20.0, 45, 12.0),
    (801, "Clouds", "few clouds", "02d", 18.0, 16.0, 60, 8.0),
    (500, "Rain", "light rain", "10d", 14.0, 12.0, 80, 15.0),
    (804, "Clouds", "overcast clouds", "04d", 16.0, 14.0, 70, 10.0),
];

/// One entry of the condition table, chosen by the injected RNG
pub fn weather(rng: &mut StdRng, city: &str) -> WeatherReport {
    let (id, condition, description, icon, temp, feels_like, humidity, wind_kmh) =
        WEATHER_TABLE[rng.gen_range(0..WEATHER_TABLE.len())];
    WeatherReport {
        city: city.to_string(),
        temp,
        feels_like,
        humidity,
        wind_speed: round1(wind_kmh / 3.6),
        condition: condition.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        condition_id: id,
    }
}

pub fn forecast() -> Vec<ForecastDay> {
    let temps = [22.0, 19.0, 15.0, 17.0, 24.0];
    let mins = [14.0, 12.0, 10.0, 11.0, 16.0];
    let icons = ["01d", "02d", "10d", "04d", "01d"];

    (0..5)
        .map(|i| {
            let day = Utc::now() + ChronoDuration::days(i as i64 + 1);
            ForecastDay {
                date: day.format("%Y-%m-%d 12:00:00").to_string(),
                temp: temps[i],
                temp_min: mins[i],
                temp_max: temps[i],
                condition_id: if i == 2 { 500 } else { 800 },
                icon: icons[i].to_string(),
                description: "partly cloudy".to_string(),
            }
        })
        .collect()
}

pub fn github_user() -> GitHubUser {
    GitHubUser {
        login: "pi-developer".to_string(),
        name: Some("Pi Developer".to_string()),
        bio: Some("Raspberry Pi enthusiast | Full-Stack Dev | Open Source".to_string()),
        public_repos: 42,
        followers: 892,
        following: 156,
        public_gists: 18,
    }
}

pub fn github_repos() -> Vec<Repo> {
    let rows = [
        ("pi5-dashboard", 234, "JavaScript", 2),
        ("home-automation", 891, "Python", 5),
        ("dotfiles", 156, "Shell", 24),
        ("nextjs-portfolio", 445, "TypeScript", 48),
    ];
    rows.iter()
        .map(|(name, stars, language, hours_ago)| Repo {
            name: name.to_string(),
            stars: *stars,
            language: Some(language.to_string()),
            pushed_at: Some(iso_hours_ago(*hours_ago)),
        })
        .collect()
}

const EVENT_REPOS: [&str; 5] = [
    "pi5-dashboard",
    "home-automation",
    "dotfiles",
    "nextjs-portfolio",
    "n8n-workflows",
];

const EVENT_MESSAGES: [&str; 10] = [
    "feat: implement glassmorphism bento grid",
    "fix: handle WebSocket reconnection timeout",
    "chore: update dependencies and clean up types",
    "feat: add n8n workflow integration panel",
    "docs: update Pi 5 setup and install guide",
    "refactor: extract API layer from components",
    "fix: correct temperature gauge calculation",
    "feat: add dark/light mode toggle",
    "perf: optimize SVG gauge rendering",
    "style: improve mobile responsive layout",
];

/// Ten push events walking back in time with 0.5-4h gaps
pub fn github_events(rng: &mut StdRng) -> Vec<EventItem> {
    let mut offset_minutes: i64 = 0;
    EVENT_MESSAGES
        .iter()
        .map(|message| {
            offset_minutes += rng.gen_range(30..=240);
            let repo = EVENT_REPOS[rng.gen_range(0..EVENT_REPOS.len())];
            EventItem {
                kind: "PushEvent".to_string(),
                repo: format!("user/{}", repo),
                message: message.to_string(),
                sha: Some(format!("{:07x}", rng.gen_range(0..0x1000_0000u32))),
                created_at: (Utc::now() - ChronoDuration::minutes(offset_minutes))
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
            }
        })
        .collect()
}

pub fn workflows() -> Vec<Workflow> {
    let rows: [(&str, &str, bool, usize, u64, i64); 6] = [
        ("1", "Daily GitHub Backup", true, 6, 142, 48),
        ("2", "Home Assistant Alerts", true, 4, 891, 24),
        ("3", "Weekly Report Generator", false, 8, 24, 120),
        ("4", "Pi Health Monitor", true, 5, 1204, 6),
        ("5", "Notion Tasks Sync", false, 7, 168, 72),
        ("6", "Docker Auto-Update", true, 10, 56, 12),
    ];
    rows.iter()
        .map(|(id, name, active, nodes, executions, hours_ago)| Workflow {
            id: id.to_string(),
            name: name.to_string(),
            active: *active,
            nodes: *nodes,
            executions: *executions,
            updated_at: Some(iso_hours_ago(*hours_ago)),
        })
        .collect()
}

pub fn tasks() -> Vec<Task> {
    let rows = [
        ("Check backup job logs", true, "high"),
        ("Update Pi-hole blocklists", false, "med"),
        ("Water the plants", false, "low"),
        ("Review n8n error notifications", false, "high"),
    ];
    rows.iter()
        .enumerate()
        .map(|(i, (title, done, priority))| Task {
            id: i as u32 + 1,
            title: title.to_string(),
            done: *done,
            priority: priority.to_string(),
        })
        .collect()
}

fn iso_hours_ago(hours: i64) -> String {
    (Utc::now() - ChronoDuration::hours(hours))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_walk_stays_in_bounds_with_bounded_steps() {
        let mut walk = SystemWalk::with_seed(7);
        let mut previous = 24.0;
        for _ in 0..200 {
            let stats = walk.next_stats();
            let cpu = stats.cpu.percent as f64;
            assert!((CPU_RANGE.0..=CPU_RANGE.1).contains(&cpu), "{}", cpu);
            // Rounding to whole percent adds at most 1 on top of the step,
            // keeping consecutive readings within 4 points of each other
            assert!((cpu - previous).abs() <= CPU_STEP + 1.0);
            previous = cpu;
        }
    }

    #[test]
    fn all_walk_metrics_stay_in_bounds() {
        let mut walk = SystemWalk::with_seed(99);
        for _ in 0..200 {
            let stats = walk.next_stats();
            assert!((RAM_RANGE_GB.0..=RAM_RANGE_GB.1).contains(&stats.ram.used_gb));
            assert!((TEMP_RANGE_C.0..=TEMP_RANGE_C.1).contains(&stats.temperature_c));
            assert!((DISK_RANGE_PCT.0..=DISK_RANGE_PCT.1).contains(&(stats.disk.percent as f64)));
            assert!(stats.network.download_mbps >= NET_DOWN_RANGE.0);
            assert!(stats.network.download_mbps <= NET_DOWN_RANGE.1);
            assert!(stats.network.upload_mbps <= NET_UP_RANGE.1);
        }
    }

    #[test]
    fn temperature_walk_moves_by_bounded_steps() {
        let mut walk = SystemWalk::with_seed(3);
        let mut previous = 42.0;
        for _ in 0..100 {
            let temp = walk.next_temperature();
            assert!((TEMP_RANGE_C.0..=TEMP_RANGE_C.1).contains(&temp));
            assert!((temp - previous).abs() <= TEMP_STEP_C + 0.1);
            previous = temp;
        }
    }

    #[test]
    fn same_seed_produces_same_series() {
        let mut first = SystemWalk::with_seed(11);
        let mut second = SystemWalk::with_seed(11);
        for _ in 0..20 {
            assert_eq!(first.next_stats(), second.next_stats());
        }
    }

    #[test]
    fn independent_walks_do_not_interfere() {
        let mut lone = SystemWalk::with_seed(11);
        let expected: Vec<_> = (0..5).map(|_| lone.next_stats()).collect();

        let mut first = SystemWalk::with_seed(11);
        let mut other = SystemWalk::with_seed(12);
        for snapshot in &expected {
            let _ = other.next_stats();
            assert_eq!(&first.next_stats(), snapshot);
        }
    }

    #[test]
    fn weather_values_come_from_the_table() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let report = weather(&mut rng, "London");
            assert_eq!(report.city, "London");
            assert!((10.0..=25.0).contains(&report.temp));
            assert!(WEATHER_TABLE.iter().any(|row| row.0 == report.condition_id));
        }
    }

    #[test]
    fn forecast_has_five_days() {
        let days = forecast();
        assert_eq!(days.len(), 5);
        assert_eq!(days[2].condition_id, 500);
        assert!(days.iter().all(|d| d.temp_min <= d.temp));
    }

    #[test]
    fn github_events_walk_back_in_time() {
        let mut rng = StdRng::seed_from_u64(8);
        let events = github_events(&mut rng);
        assert_eq!(events.len(), 10);
        for pair in events.windows(2) {
            assert!(pair[0].created_at > pair[1].created_at);
        }
        assert!(events.iter().all(|e| e.sha.as_ref().unwrap().len() == 7));
    }

    #[test]
    fn workflow_table_matches_dashboard_expectations() {
        let list = workflows();
        assert_eq!(list.len(), 6);
        assert_eq!(list.iter().filter(|w| w.active).count(), 4);
    }

    #[test]
    fn task_table_is_small_and_prioritized() {
        let list = tasks();
        assert_eq!(list.len(), 4);
        assert!(list.iter().any(|t| t.priority == "high"));
        assert!(list.iter().any(|t| t.done));
    }
}
