//! GitHub source: user profile, repository list, public event feed

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::eventlog::EventLog;
use crate::fetch::{fetch_json, or_mock, FetchResult};
use crate::io::HttpClient;
use crate::mock;

const GITHUB_API_URL: &str = "https://api.github.com";
// GitHub rejects requests without a User-Agent
const USER_AGENT: &str = "homedash";

/// User profile, shape shared by live and mock payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub public_gists: u32,
}

/// Repository summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub stars: u32,
    pub language: Option<String>,
    pub pushed_at: Option<String>,
}

/// One entry of the public event feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    pub kind: String,
    pub repo: String,
    pub message: String,
    pub sha: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    name: String,
    stargazers_count: u32,
    language: Option<String>,
    pushed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    #[serde(rename = "type")]
    kind: String,
    repo: RepoRef,
    created_at: String,
    #[serde(default)]
    payload: EventPayload,
}

#[derive(Debug, Deserialize)]
struct RepoRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Vec<CommitDto>,
}

#[derive(Debug, Deserialize)]
struct CommitDto {
    message: String,
    sha: String,
}

/// GitHub source with mock fallback
pub struct GitHubSource {
    config: GitHubConfig,
    http: Arc<dyn HttpClient>,
    events: EventLog,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for GitHubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSource")
            .field("username", &self.config.username)
            .finish()
    }
}

impl GitHubSource {
    pub fn new(config: GitHubConfig, http: Arc<dyn HttpClient>, events: EventLog) -> Self {
        Self {
            config,
            http,
            events,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[cfg(test)]
    pub fn with_seed(
        config: GitHubConfig,
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

    /// Fetch the user profile; never fails
    pub async fn user(&self) -> FetchResult<GitHubUser> {
        if !self.config.is_configured() {
            return FetchResult::fallback(mock::github_user());
        }

        let url = format!("{}/users/{}", GITHUB_API_URL, self.config.username);
        let outcome = self.get_json::<GitHubUser>(&url).await;
        or_mock("github-user", &self.events, outcome, mock::github_user).await
    }

    /// Fetch repositories sorted by most recent push; never fails
    pub async fn repos(&self) -> FetchResult<Vec<Repo>> {
        if !self.config.is_configured() {
            return FetchResult::fallback(mock::github_repos());
        }

        let url = format!(
            "{}/users/{}/repos?sort=pushed&per_page=30",
            GITHUB_API_URL, self.config.username
        );
        let outcome = self.get_json::<Vec<RepoDto>>(&url).await.map(|repos| {
            repos
                .into_iter()
                .map(|r| Repo {
                    name: r.name,
                    stars: r.stargazers_count,
                    language: r.language,
                    pushed_at: r.pushed_at,
                })
                .collect()
        });
        or_mock("github-repos", &self.events, outcome, mock::github_repos).await
    }

    /// Fetch the public event feed; never fails
    pub async fn event_feed(&self) -> FetchResult<Vec<EventItem>> {
        if !self.config.is_configured() {
            return FetchResult::fallback(self.mock_events());
        }

        let url = format!(
            "{}/users/{}/events?per_page=15",
            GITHUB_API_URL, self.config.username
        );
        let outcome = self.get_json::<Vec<EventDto>>(&url).await.map(|events| {
            events.into_iter().map(map_event).collect::<Vec<_>>()
        });
        or_mock("github-events", &self.events, outcome, || self.mock_events()).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> crate::Result<T> {
        let auth;
        let mut headers = vec![("User-Agent", USER_AGENT)];
        if !self.config.token.is_empty() {
            auth = format!("Bearer {}", self.config.token);
            headers.push(("Authorization", auth.as_str()));
        }
        fetch_json(self.http.as_ref(), url, &headers).await
    }

    fn mock_events(&self) -> Vec<EventItem> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        mock::github_events(&mut rng)
    }
}

fn map_event(event: EventDto) -> EventItem {
    let (message, sha) = event
        .payload
        .commits
        .into_iter()
        .next()
        .map(|c| (c.message, Some(c.sha)))
        .unwrap_or_else(|| (event.kind.clone(), None));
    EventItem {
        kind: event.kind,
        repo: event.repo.name,
        message,
        sha,
        created_at: event.created_at,
    }
}
