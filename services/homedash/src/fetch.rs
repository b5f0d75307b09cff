//! Resilient fetch policy shared by every data source
//!
//! A source never surfaces an error to its caller: configuration gaps skip
//! the network entirely, and transport, status, or parse failures are logged
//! and replaced by a generated mock value of the same shape.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::eventlog::EventLog;
use crate::io::HttpClient;

/// A payload together with its provenance
///
/// Live and mock values share the same shape, so rendering code can stay
/// agnostic about where a snapshot came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult<T> {
    pub value: T,
    pub mock: bool,
}

impl<T> FetchResult<T> {
    pub fn live(value: T) -> Self {
        Self { value, mock: false }
    }

    pub fn fallback(value: T) -> Self {
        Self { value, mock: true }
    }
}

/// GET a URL and parse the body as `T`
///
/// Non-2xx statuses and unparseable bodies are both reported as errors, so
/// callers treat them identically to transport failures.
pub async fn fetch_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    url: &str,
    headers: &[(&str, &str)],
) -> crate::Result<T> {
    let response = http.get(url, headers).await?;
    if !response.is_success() {
        return Err(crate::HomedashError::Upstream(format!(
            "{} returned status {}",
            url, response.status
        )));
    }
    let parsed = serde_json::from_str(&response.body)?;
    Ok(parsed)
}

/// Apply the fallback policy to a fetch outcome
///
/// On failure, logs a warning, records a fallback event, and substitutes the
/// generated mock. Config-incomplete short circuits do not come through here;
/// they are silent by design and handled before any transport call.
pub async fn or_mock<T>(
    source: &str,
    events: &EventLog,
    outcome: crate::Result<T>,
    mock: impl FnOnce() -> T,
) -> FetchResult<T> {
    match outcome {
        Ok(value) => FetchResult::live(value),
        Err(e) => {
            tracing::warn!("{} fallback: {}", source, e);
            events.record(source, &e.to_string()).await;
            FetchResult::fallback(mock())
        }
    }
}
