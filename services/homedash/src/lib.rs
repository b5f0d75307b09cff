//! Homedash - homelab dashboard backend
//!
//! Polls local host metrics and remote APIs on fixed intervals, degrades to
//! plausible mock data whenever a source is unconfigured or unreachable, and
//! serves the latest snapshots over a small web dashboard.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod eventlog;
pub mod fetch;
pub mod github;
pub mod io;
pub mod mock;
pub mod n8n;
pub mod poller;
pub mod ring;
pub mod state;
pub mod system;
pub mod tasks;
pub mod weather;

pub use config::{load_config, Config};
pub use error::{HomedashError, Result};
pub use fetch::FetchResult;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::eventlog::EventLog;
use crate::github::GitHubSource;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::n8n::N8nSource;
use crate::poller::spawn_poller;
use crate::state::Snapshot;
use crate::system::SystemSource;
use crate::tasks::TasksSource;
use crate::weather::WeatherSource;

/// Run the homedash service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.request_timeout_seconds,
    )));
    let cancel = CancellationToken::new();
    let events = EventLog::new(config.dashboard.event_capacity);
    let state = state::new_state_handle();

    let weather = Arc::new(WeatherSource::new(
        config.weather.clone(),
        Arc::clone(&http),
        events.clone(),
    ));
    let github = Arc::new(GitHubSource::new(
        config.github.clone(),
        Arc::clone(&http),
        events.clone(),
    ));
    let n8n = Arc::new(N8nSource::new(
        config.n8n.clone(),
        Arc::clone(&http),
        events.clone(),
    ));
    let tasks = Arc::new(TasksSource::new(
        config.notion.clone(),
        Arc::clone(&http),
        events.clone(),
    ));
    let system = Arc::new(SystemSource::new(config.system.clone(), events.clone()));

    let mut handles = Vec::new();

    {
        let system = Arc::clone(&system);
        let state = Arc::clone(&state);
        handles.push(spawn_poller(
            "system",
            Duration::from_secs(config.poll.system_interval_seconds),
            cancel.clone(),
            move || {
                let system = Arc::clone(&system);
                let state = Arc::clone(&state);
                async move {
                    let result = system.snapshot().await;
                    state
                        .write()
                        .await
                        .record_system(result, state::current_epoch_ms());
                }
            },
        ));
    }

    {
        let weather = Arc::clone(&weather);
        let state = Arc::clone(&state);
        handles.push(spawn_poller(
            "weather",
            Duration::from_secs(config.poll.weather_interval_seconds),
            cancel.clone(),
            move || {
                let weather = Arc::clone(&weather);
                let state = Arc::clone(&state);
                async move {
                    let current = weather.current().await;
                    let forecast = weather.forecast().await;
                    let mut locked = state.write().await;
                    locked.weather = Some(Snapshot::stamped(current));
                    locked.forecast = Some(Snapshot::stamped(forecast));
                }
            },
        ));
    }

    {
        let github = Arc::clone(&github);
        let state = Arc::clone(&state);
        handles.push(spawn_poller(
            "github",
            Duration::from_secs(config.poll.github_interval_seconds),
            cancel.clone(),
            move || {
                let github = Arc::clone(&github);
                let state = Arc::clone(&state);
                async move {
                    let user = github.user().await;
                    let repos = github.repos().await;
                    let feed = github.event_feed().await;
                    let mut locked = state.write().await;
                    locked.github_user = Some(Snapshot::stamped(user));
                    locked.github_repos = Some(Snapshot::stamped(repos));
                    locked.github_events = Some(Snapshot::stamped(feed));
                }
            },
        ));
    }

    {
        let n8n = Arc::clone(&n8n);
        let state = Arc::clone(&state);
        handles.push(spawn_poller(
            "n8n",
            Duration::from_secs(config.poll.n8n_interval_seconds),
            cancel.clone(),
            move || {
                let n8n = Arc::clone(&n8n);
                let state = Arc::clone(&state);
                async move {
                    let workflows = n8n.workflows().await;
                    state.write().await.workflows = Some(Snapshot::stamped(workflows));
                }
            },
        ));
    }

    {
        let tasks = Arc::clone(&tasks);
        let state = Arc::clone(&state);
        handles.push(spawn_poller(
            "tasks",
            Duration::from_secs(config.poll.tasks_interval_seconds),
            cancel.clone(),
            move || {
                let tasks = Arc::clone(&tasks);
                let state = Arc::clone(&state);
                async move {
                    let today = tasks.today().await;
                    state.write().await.tasks = Some(Snapshot::stamped(today));
                }
            },
        ));
    }

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = Arc::clone(&state);
        let dashboard_events = events.clone();
        let dashboard_n8n = Arc::clone(&n8n);
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router =
                dashboard::build_router(dashboard_state, dashboard_events, dashboard_n8n);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    tracing::info!("Homedash pollers started");

    // Block until cancelled, then let in-flight ticks drain
    cancel.cancelled().await;
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("Homedash stopped");

    Ok(())
}
