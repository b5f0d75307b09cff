//! OpenWeatherMap source: current conditions and short forecast

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::WeatherConfig;
use crate::eventlog::EventLog;
use crate::fetch::{fetch_json, or_mock, FetchResult};
use crate::io::HttpClient;
use crate::mock;

/// Current conditions, shape shared by live and mock payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub condition_id: u16,
}

/// One forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition_id: u16,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    name: String,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    id: u16,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmForecast {
    list: Vec<OwmForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastEntry {
    dt_txt: String,
    main: OwmForecastMain,
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

/// Weather source with mock fallback
pub struct WeatherSource {
    config: WeatherConfig,
    http: Arc<dyn HttpClient>,
    events: EventLog,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for WeatherSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSource")
            .field("city", &self.config.city)
            .finish()
    }
}

impl WeatherSource {
    pub fn new(config: WeatherConfig, http: Arc<dyn HttpClient>, events: EventLog) -> Self {
        Self {
            config,
            http,
            events,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[cfg(test)]
    pub fn with_seed(
        config: WeatherConfig,
        http: Arc<dyn HttpClient>,
        events: EventLog,
        seed: u64,
    ) -> Self {
        Self {
            config,
            http,
            events,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Fetch current conditions; never fails
    pub async fn current(&self) -> FetchResult<WeatherReport> {
        if !self.config.is_configured() {
            return FetchResult::fallback(self.mock_report());
        }

        let outcome = self.request_current().await;
        or_mock("weather", &self.events, outcome, || self.mock_report()).await
    }

    /// Fetch the 5-entry forecast; never fails
    pub async fn forecast(&self) -> FetchResult<Vec<ForecastDay>> {
        if !self.config.is_configured() {
            return FetchResult::fallback(mock::forecast());
        }

        let outcome = self.request_forecast().await;
        or_mock("forecast", &self.events, outcome, mock::forecast).await
    }

    async fn request_current(&self) -> crate::Result<WeatherReport> {
        let url = format!(
            "{}/weather?q={}&appid={}&units={}",
            self.config.api_url.trim_end_matches('/'),
            self.config.city.replace(' ', "%20"),
            self.config.api_key,
            self.config.units,
        );
        let parsed: OwmCurrent = fetch_json(self.http.as_ref(), &url, &[]).await?;

        let condition = parsed.weather.into_iter().next().ok_or_else(|| {
            crate::HomedashError::Upstream("weather response without conditions".to_string())
        })?;

        Ok(WeatherReport {
            city: parsed.name,
            temp: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity: parsed.main.humidity.round() as u8,
            wind_speed: parsed.wind.speed,
            condition: condition.main,
            description: condition.description,
            icon: condition.icon,
            condition_id: condition.id,
        })
    }

    async fn request_forecast(&self) -> crate::Result<Vec<ForecastDay>> {
        let url = format!(
            "{}/forecast?q={}&appid={}&units={}&cnt=5",
            self.config.api_url.trim_end_matches('/'),
            self.config.city.replace(' ', "%20"),
            self.config.api_key,
            self.config.units,
        );
        let parsed: OwmForecast = fetch_json(self.http.as_ref(), &url, &[]).await?;

        let days = parsed
            .list
            .into_iter()
            .map(|entry| {
                let condition = entry.weather.into_iter().next();
                let (id, icon, description) = condition
                    .map(|c| (c.id, c.icon, c.description))
                    .unwrap_or((800, "01d".to_string(), String::new()));
                ForecastDay {
                    date: entry.dt_txt,
                    temp: entry.main.temp,
                    temp_min: entry.main.temp_min,
                    temp_max: entry.main.temp_max,
                    condition_id: id,
                    icon,
                    description,
                }
            })
            .collect();
        Ok(days)
    }

    fn mock_report(&self) -> WeatherReport {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        mock::weather(&mut rng, &self.config.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};

    fn configured() -> WeatherConfig {
        WeatherConfig {
            api_key: "test-key".to_string(),
            city: "Berlin".to_string(),
            ..WeatherConfig::default()
        }
    }

    fn current_body() -> String {
        r#"{
            "name": "Berlin",
            "main": {"temp": 19.4, "feels_like": 18.1, "humidity": 52},
            "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
            "wind": {"speed": 3.4}
        }"#
        .to_string()
    }

    #[tokio::test]
    async fn current_parses_live_response() {
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, _| {
                url.contains("/weather") && url.contains("q=Berlin") && url.contains("appid=test-key")
            })
            .returning(|_, _| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: current_body(),
                    })
                })
            });

        let source = WeatherSource::new(configured(), Arc::new(mock), EventLog::new(10));
        let result = source.current().await;
        assert!(!result.mock);
        assert_eq!(result.value.city, "Berlin");
        assert_eq!(result.value.temp, 19.4);
        assert_eq!(result.value.humidity, 52);
        assert_eq!(result.value.condition, "Clouds");
        assert_eq!(result.value.condition_id, 801);
    }

    #[tokio::test]
    async fn missing_key_skips_network_entirely() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().times(0);
        mock.expect_post_json().times(0);

        let source = WeatherSource::with_seed(
            WeatherConfig::default(),
            Arc::new(mock),
            EventLog::new(10),
            7,
        );
        let result = source.current().await;
        assert!(result.mock);
        assert_eq!(result.value.city, "London");
    }

    #[tokio::test]
    async fn missing_key_is_silent() {
        let events = EventLog::new(10);
        let source = WeatherSource::with_seed(
            WeatherConfig::default(),
            Arc::new(MockHttpClient::new()),
            events.clone(),
            7,
        );
        let _ = source.current().await;
        assert!(events.is_empty().await);
    }

    #[tokio::test]
    async fn http_error_falls_back_and_records() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async { Err(crate::HomedashError::Http("connection refused".to_string())) })
        });

        let events = EventLog::new(10);
        let source = WeatherSource::with_seed(configured(), Arc::new(mock), events.clone(), 7);
        let result = source.current().await;
        assert!(result.mock);

        let recorded = events.snapshot().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].source, "weather");
    }

    #[tokio::test]
    async fn non_200_falls_back() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 401,
                    body: r#"{"cod": 401, "message": "Invalid API key"}"#.to_string(),
                })
            })
        });

        let source = WeatherSource::with_seed(configured(), Arc::new(mock), EventLog::new(10), 7);
        let result = source.current().await;
        assert!(result.mock);
    }

    #[tokio::test]
    async fn malformed_body_falls_back() {
        let mut mock = MockHttpClient::new();
        mock.expect_get().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: "<html>not json</html>".to_string(),
                })
            })
        });

        let source = WeatherSource::with_seed(configured(), Arc::new(mock), EventLog::new(10), 7);
        let result = source.current().await;
        assert!(result.mock);
    }

    #[tokio::test]
    async fn mock_temperature_stays_in_documented_range() {
        let source = WeatherSource::with_seed(
            WeatherConfig::default(),
            Arc::new(MockHttpClient::new()),
            EventLog::new(10),
            42,
        );
        for _ in 0..20 {
            let result = source.current().await;
            assert!(result.mock);
            assert!((10.0..=25.0).contains(&result.value.temp), "{}", result.value.temp);
        }
    }

    #[tokio::test]
    async fn forecast_parses_live_response() {
        let body = r#"{
            "list": [
                {
                    "dt_txt": "2024-01-16 12:00:00",
                    "main": {"temp": 20.0, "temp_min": 14.0, "temp_max": 21.0},
                    "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}]
                },
                {
                    "dt_txt": "2024-01-17 12:00:00",
                    "main": {"temp": 17.0, "temp_min": 12.0, "temp_max": 18.0},
                    "weather": []
                }
            ]
        }"#;
        let mut mock = MockHttpClient::new();
        mock.expect_get()
            .withf(|url, _| url.contains("/forecast") && url.contains("cnt=5"))
            .returning(move |_, _| {
                let body = body.to_string();
                Box::pin(async move {
                    Ok(HttpResponse { status: 200, body })
                })
            });

        let source = WeatherSource::new(configured(), Arc::new(mock), EventLog::new(10));
        let result = source.forecast().await;
        assert!(!result.mock);
        assert_eq!(result.value.len(), 2);
        assert_eq!(result.value[0].condition_id, 800);
        // Entry without conditions falls back to a clear-sky icon
        assert_eq!(result.value[1].icon, "01d");
    }

    #[tokio::test]
    async fn forecast_without_key_uses_mock_table() {
        let source = WeatherSource::new(
            WeatherConfig::default(),
            Arc::new(MockHttpClient::new()),
            EventLog::new(10),
        );
        let result = source.forecast().await;
        assert!(result.mock);
        assert_eq!(result.value.len(), 5);
    }
}
