//! Web dashboard with JSON API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::eventlog::EventLog;
use crate::n8n::N8nSource;
use crate::state::StateHandle;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub events: EventLog,
    pub n8n: Arc<N8nSource>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerRequest {
    pub webhook_url: String,
}

/// Build the dashboard axum router
///
/// The original deployment serves browsers on other LAN hosts, so CORS is
/// left wide open.
pub fn build_router(state: StateHandle, events: EventLog, n8n: Arc<N8nSource>) -> Router {
    let dashboard_state = DashboardState { state, events, n8n };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/system", get(system_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/forecast", get(forecast_handler))
        .route("/api/github", get(github_handler))
        .route("/api/n8n/workflows", get(workflows_handler))
        .route("/api/n8n/trigger", post(trigger_handler))
        .route("/api/tasks", get(tasks_handler))
        .route("/api/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

async fn system_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::json!({
        "snapshot": state.system,
        "history": {
            "cpu": state.cpu_history.values(),
            "temperature": state.temperature_history.values(),
            "net_down": state.net_down_history.values(),
            "net_up": state.net_up_history.values(),
        },
    }))
}

async fn weather_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::to_value(&state.weather).unwrap_or_default())
}

async fn forecast_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::to_value(&state.forecast).unwrap_or_default())
}

async fn github_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::json!({
        "user": state.github_user,
        "repos": state.github_repos,
        "events": state.github_events,
    }))
}

async fn workflows_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::to_value(&state.workflows).unwrap_or_default())
}

async fn trigger_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<TriggerRequest>,
) -> impl IntoResponse {
    let success = dashboard.n8n.trigger(&request.webhook_url).await;
    Json(serde_json::json!({ "success": success }))
}

async fn tasks_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::to_value(&state.tasks).unwrap_or_default())
}

async fn events_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.events.snapshot().await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let system_row = match &state.system {
        Some(snapshot) => format!(
            "CPU {}% · RAM {:.1}/{:.0} GB · {:.1} °C · Disk {}%{}",
            snapshot.data.cpu.percent,
            snapshot.data.ram.used_gb,
            snapshot.data.ram.total_gb,
            snapshot.data.temperature_c,
            snapshot.data.disk.percent,
            if snapshot.mock { " (demo)" } else { "" },
        ),
        None => "Waiting for first sample".to_string(),
    };

    let weather_row = match &state.weather {
        Some(snapshot) => format!(
            "{}: {:.0}° {}{}",
            snapshot.data.city,
            snapshot.data.temp,
            snapshot.data.description,
            if snapshot.mock { " (demo)" } else { "" },
        ),
        None => "Waiting for first sample".to_string(),
    };

    let event_rows: String = dashboard
        .events
        .snapshot()
        .await
        .iter()
        .rev()
        .map(|e| {
            format!(
                r#"<tr><td style="padding: 0.25rem 0.5rem;">{}</td><td style="padding: 0.25rem 0.5rem;">{}</td></tr>"#,
                e.source, e.reason
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Homedash</title>
    <script>
        function refresh() {{
            fetch('/api/system').then(r => r.json()).then(data => {{
                if (!data.snapshot) return;
                const s = data.snapshot.data;
                const demo = data.snapshot.mock ? ' (demo)' : '';
                document.getElementById('system-row').textContent =
                    `CPU ${{s.cpu.percent}}% · RAM ${{s.ram.used_gb}}/${{s.ram.total_gb}} GB · ${{s.temperature_c}} °C · Disk ${{s.disk.percent}}%${{demo}}`;
            }});
            fetch('/api/weather').then(r => r.json()).then(data => {{
                if (!data) return;
                const demo = data.mock ? ' (demo)' : '';
                document.getElementById('weather-row').textContent =
                    `${{data.data.city}}: ${{Math.round(data.data.temp)}}° ${{data.data.description}}${{demo}}`;
            }});
            fetch('/api/events').then(r => r.json()).then(data => {{
                document.getElementById('event-body').innerHTML = data.reverse().map(e =>
                    `<tr><td style="padding: 0.25rem 0.5rem;">${{e.source}}</td><td style="padding: 0.25rem 0.5rem;">${{e.reason}}</td></tr>`
                ).join('');
            }});
        }}
        setInterval(refresh, 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Homedash</h1>
    <section>
        <h2>System</h2>
        <p id="system-row">{system_row}</p>
    </section>
    <section>
        <h2>Weather</h2>
        <p id="weather-row">{weather_row}</p>
    </section>
    <section>
        <h2>Fallback Events</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.25rem 0.5rem; text-align: left;">Source</th>
                    <th style="padding: 0.25rem 0.5rem; text-align: left;">Reason</th>
                </tr>
            </thead>
            <tbody id="event-body">{event_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        system_row = system_row,
        weather_row = weather_row,
        event_rows = event_rows,
    );

    Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::N8nConfig;
    use crate::fetch::FetchResult;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::mock;
    use crate::state::{new_state_handle, Snapshot};

    fn test_router(state: crate::state::StateHandle, events: EventLog) -> Router {
        let n8n = Arc::new(N8nSource::new(
            N8nConfig::default(),
            Arc::new(MockHttpClient::new()),
            events.clone(),
        ));
        build_router(state, events, n8n)
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = test_router(new_state_handle(), EventLog::new(10));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn system_returns_snapshot_and_history() {
        let state = new_state_handle();
        {
            let mut s = state.write().await;
            let stats = mock::SystemWalk::with_seed(1).next_stats();
            s.record_system(FetchResult::fallback(stats), 1000);
        }

        let app = test_router(state, EventLog::new(10));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/system")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["snapshot"]["mock"].as_bool().unwrap());
        assert_eq!(json["snapshot"]["fetched_at_epoch_ms"], 1000);
        assert_eq!(json["history"]["cpu"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn system_renders_identically_for_the_same_snapshot() {
        let state = new_state_handle();
        {
            let mut s = state.write().await;
            let stats = mock::SystemWalk::with_seed(1).next_stats();
            s.record_system(FetchResult::live(stats), 1000);
        }

        let events = EventLog::new(10);
        let first = test_router(Arc::clone(&state), events.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/system")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let second = test_router(state, events)
            .oneshot(
                Request::builder()
                    .uri("/api/system")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_bytes(first).await, body_bytes(second).await);
    }

    #[tokio::test]
    async fn weather_is_null_before_first_poll() {
        let app = test_router(new_state_handle(), EventLog::new(10));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/weather")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json.is_null());
    }

    #[tokio::test]
    async fn weather_returns_tagged_snapshot() {
        let state = new_state_handle();
        {
            let mut s = state.write().await;
            use rand::SeedableRng;
            let mut rng = rand::rngs::StdRng::seed_from_u64(4);
            s.weather = Some(Snapshot::new(
                FetchResult::fallback(mock::weather(&mut rng, "London")),
                2000,
            ));
        }

        let app = test_router(state, EventLog::new(10));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/weather")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["mock"].as_bool().unwrap());
        assert_eq!(json["data"]["city"], "London");
    }

    #[tokio::test]
    async fn events_endpoint_lists_fallbacks() {
        let events = EventLog::new(10);
        events.record("weather", "timeout").await;

        let app = test_router(new_state_handle(), events);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["source"], "weather");
    }

    #[tokio::test]
    async fn trigger_returns_success_flag() {
        let mut http = MockHttpClient::new();
        http.expect_post_json().returning(|_, _, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: String::new(),
                })
            })
        });
        let events = EventLog::new(10);
        let n8n = Arc::new(N8nSource::new(
            N8nConfig::default(),
            Arc::new(http),
            events.clone(),
        ));
        let app = build_router(new_state_handle(), events, n8n);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/n8n/trigger")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"webhook_url": "http://localhost:5678/webhook/go"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["success"].as_bool().unwrap());
    }

    #[tokio::test]
    async fn index_returns_html() {
        let app = test_router(new_state_handle(), EventLog::new(10));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("Homedash"));
        assert!(html.contains("Waiting for first sample"));
        assert!(html.contains("Fallback Events"));
    }
}
