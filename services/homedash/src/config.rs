//! Configuration types for the homedash service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// GitHub username value that marks an unconfigured source
pub const USERNAME_PLACEHOLDER: &str = "your-username";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub n8n: N8nConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            github: GitHubConfig::default(),
            n8n: N8nConfig::default(),
            notion: NotionConfig::default(),
            system: SystemConfig::default(),
            poll: PollConfig::default(),
            dashboard: DashboardConfig::default(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// OpenWeatherMap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_units")]
    pub units: String,
    /// API base, overridable for self-hosted proxies
    #[serde(default = "default_weather_api_url")]
    pub api_url: String,
}

impl WeatherConfig {
    /// A weather source without an API key or city never goes to the network
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.city.is_empty()
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            city: default_city(),
            units: default_units(),
            api_url: default_weather_api_url(),
        }
    }
}

/// GitHub settings; the token is optional and only raises rate limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

impl GitHubConfig {
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && self.username != USERNAME_PLACEHOLDER
    }
}

/// n8n workflow automation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct N8nConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

impl N8nConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }
}

/// Notion task database settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub database_id: String,
}

impl NotionConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.database_id.is_empty()
    }
}

/// Paths for local host metrics, overridable for tests and non-Pi hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_proc_stat")]
    pub proc_stat_path: String,
    #[serde(default = "default_meminfo")]
    pub meminfo_path: String,
    #[serde(default = "default_net_dev")]
    pub net_dev_path: String,
    #[serde(default = "default_thermal")]
    pub thermal_path: String,
    #[serde(default = "default_uptime")]
    pub uptime_path: String,
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            proc_stat_path: default_proc_stat(),
            meminfo_path: default_meminfo(),
            net_dev_path: default_net_dev(),
            thermal_path: default_thermal(),
            uptime_path: default_uptime(),
            disk_mount: default_disk_mount(),
        }
    }
}

/// Per-source polling intervals in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_system_interval")]
    pub system_interval_seconds: u64,
    #[serde(default = "default_weather_interval")]
    pub weather_interval_seconds: u64,
    #[serde(default = "default_github_interval")]
    pub github_interval_seconds: u64,
    #[serde(default = "default_n8n_interval")]
    pub n8n_interval_seconds: u64,
    #[serde(default = "default_tasks_interval")]
    pub tasks_interval_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            system_interval_seconds: default_system_interval(),
            weather_interval_seconds: default_weather_interval(),
            github_interval_seconds: default_github_interval(),
            n8n_interval_seconds: default_n8n_interval(),
            tasks_interval_seconds: default_tasks_interval(),
        }
    }
}

/// Dashboard server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_city() -> String {
    "London".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_weather_api_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_proc_stat() -> String {
    "/proc/stat".to_string()
}

fn default_meminfo() -> String {
    "/proc/meminfo".to_string()
}

fn default_net_dev() -> String {
    "/proc/net/dev".to_string()
}

fn default_thermal() -> String {
    "/sys/class/thermal/thermal_zone0/temp".to_string()
}

fn default_uptime() -> String {
    "/proc/uptime".to_string()
}

fn default_disk_mount() -> String {
    "/".to_string()
}

fn default_system_interval() -> u64 {
    30
}

fn default_weather_interval() -> u64 {
    300
}

fn default_github_interval() -> u64 {
    600
}

fn default_n8n_interval() -> u64 {
    60
}

fn default_tasks_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    3001
}

fn default_event_capacity() -> usize {
    50
}

fn default_request_timeout() -> u64 {
    8
}

impl Config {
    /// Override secrets from the environment, matching the variables the
    /// original deployment scripts export
    pub fn resolve_secrets(&mut self) {
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            self.weather.api_key = key;
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Ok(key) = std::env::var("N8N_API_KEY") {
            self.n8n.api_key = key;
        }
        if let Ok(token) = std::env::var("NOTION_TOKEN") {
            self.notion.token = token;
        }
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HomedashError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
