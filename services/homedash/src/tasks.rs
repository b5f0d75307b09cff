//! Notion task source: today's tasks from a database query

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::NotionConfig;
use crate::eventlog::EventLog;
use crate::fetch::{or_mock, FetchResult};
use crate::io::HttpClient;
use crate::mock;

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// A task, shape shared by live and mock payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub done: bool,
    pub priority: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<serde_json::Value>,
}

/// Notion source with mock fallback
pub struct TasksSource {
    config: NotionConfig,
    http: Arc<dyn HttpClient>,
    events: EventLog,
}

impl std::fmt::Debug for TasksSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TasksSource")
            .field("database_id", &self.config.database_id)
            .finish()
    }
}

impl TasksSource {
    pub fn new(config: NotionConfig, http: Arc<dyn HttpClient>, events: EventLog) -> Self {
        Self {
            config,
            http,
            events,
        }
    }

    /// Fetch today's tasks; never fails
    pub async fn today(&self) -> FetchResult<Vec<Task>> {
        if !self.config.is_configured() {
            return FetchResult::fallback(mock::tasks());
        }

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let outcome = self.query(&today).await;
        or_mock("tasks", &self.events, outcome, mock::tasks).await
    }

    async fn query(&self, date: &str) -> crate::Result<Vec<Task>> {
        let url = format!(
            "{}/databases/{}/query",
            NOTION_API_URL, self.config.database_id
        );
        let auth = format!("Bearer {}", self.config.token);
        let headers = [
            ("Authorization", auth.as_str()),
            ("Notion-Version", NOTION_VERSION),
        ];
        let body = serde_json::json!({
            "filter": {
                "property": "Date",
                "date": { "equals": date }
            }
        });

        let response = self.http.post_json(&url, &headers, &body).await?;
        if !response.is_success() {
            return Err(crate::HomedashError::Upstream(format!(
                "{} returned status {}",
                url, response.status
            )));
        }

        let parsed: QueryResponse = serde_json::from_str(&response.body)?;
        Ok(parsed
            .results
            .iter()
            .enumerate()
            .map(|(i, page)| map_page(i as u32 + 1, page))
            .collect())
    }
}

/// Pull the fields the dashboard renders out of a Notion page object;
/// anything missing degrades to a sensible default rather than an error
fn map_page(id: u32, page: &serde_json::Value) -> Task {
    let title = page
        .pointer("/properties/Name/title/0/text/content")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled")
        .to_string();
    let done = page
        .pointer("/properties/Done/checkbox")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let priority = page
        .pointer("/properties/Priority/select/name")
        .and_then(|v| v.as_str())
        .map(|p| p.to_lowercase())
        .unwrap_or_else(|| "med".to_string());
    Task {
        id,
        title,
        done,
        priority,
    }
}
