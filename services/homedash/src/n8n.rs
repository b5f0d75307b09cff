//! n8n workflow automation source: workflow list and webhook triggers

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::N8nConfig;
use crate::eventlog::EventLog;
use crate::fetch::{fetch_json, or_mock, FetchResult};
use crate::io::HttpClient;
use crate::mock;

/// Workflow summary, shape shared by live and mock payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub nodes: usize,
    pub executions: u64,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkflowDto {
    id: String,
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<String>,
}

/// The list endpoint wraps workflows in `{"data": [...]}` on current
/// versions and returned a bare array on older ones
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkflowListDto {
    Wrapped { data: Vec<WorkflowDto> },
    Bare(Vec<WorkflowDto>),
}

/// n8n source with mock fallback
pub struct N8nSource {
    config: N8nConfig,
    http: Arc<dyn HttpClient>,
    events: EventLog,
}

impl std::fmt::Debug for N8nSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("N8nSource")
            .field("url", &self.config.url)
            .finish()
    }
}

impl N8nSource {
    pub fn new(config: N8nConfig, http: Arc<dyn HttpClient>, events: EventLog) -> Self {
        Self {
            config,
            http,
            events,
        }
    }

    /// Fetch the workflow list; never fails
    pub async fn workflows(&self) -> FetchResult<Vec<Workflow>> {
        if !self.config.is_configured() {
            return FetchResult::fallback(mock::workflows());
        }

        let url = format!("{}/api/v1/workflows", self.config.url.trim_end_matches('/'));
        let headers = [("X-N8N-API-KEY", self.config.api_key.as_str())];
        let outcome = fetch_json::<WorkflowListDto>(self.http.as_ref(), &url, &headers)
            .await
            .map(|list| {
                let dtos = match list {
                    WorkflowListDto::Wrapped { data } => data,
                    WorkflowListDto::Bare(dtos) => dtos,
                };
                dtos.into_iter()
                    .map(|w| Workflow {
                        id: w.id,
                        name: w.name,
                        active: w.active,
                        nodes: w.nodes.len(),
                        executions: 0,
                        updated_at: w.updated_at,
                    })
                    .collect()
            });
        or_mock("n8n", &self.events, outcome, mock::workflows).await
    }

    /// Trigger a workflow by webhook URL, returning whether it succeeded
    ///
    /// Failures are reported as `false`, never as an error.
    pub async fn trigger(&self, webhook_url: &str) -> bool {
        match self
            .http
            .post_json(webhook_url, &[], &serde_json::json!({}))
            .await
        {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                tracing::warn!("n8n trigger returned status {}", response.status);
                false
            }
            Err(e) => {
                tracing::warn!("n8n trigger failed: {}", e);
                false
            }
        }
    }
}
