//! Retrying HTTP extraction layer.
//!
//! One parametrized [`Extractor`] serves both upstream sources; everything
//! source-specific lives in the [`SourceEndpoint`] descriptor: base URL, auth
//! placement (header vs query parameter), how the resource name is attached
//! (path segment vs `action` parameter), and an optional response
//! post-processing hook.
//!
//! Retry policy: up to 3 attempts. Timeouts and connection-level failures are
//! transient and retried with a linear backoff of `5 * attempt` seconds.
//! HTTP status errors, decode failures, and anything else fail immediately.
//! Transport and sleeping sit behind traits so the policy is testable without
//! a network or wall-clock delays.

use crate::accumulate::{ErrorCategory, ErrorLog, RunMetrics};
use crate::source::SourceId;
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Total attempts per fetch, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Bound on a single blocking request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Linear backoff step: the wait before retry `n` is `BACKOFF_STEP * n`.
pub const BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Structured extraction failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("connection failed after {attempts} attempts: {reason}")]
    ConnectionFailed { attempts: u32, reason: String },

    #[error("HTTP {status} from upstream")]
    Http { status: u16 },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("unexpected transport failure: {0}")]
    Unexpected(String),
}

impl ExtractError {
    /// Whether this failure class is retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractError::TimedOut { .. } | ExtractError::ConnectionFailed { .. }
        )
    }
}

/// A completed HTTP exchange, however the transport got it.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failures, classified for the retry policy.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

/// Seam over the HTTP client so retry behavior is testable with a scripted
/// transport. The production implementation is [`HttpTransport`].
pub trait Transport {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// Blocking reqwest transport with the fixed 30-second request bound.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        query: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_connect() {
                TransportError::Connection(e.to_string())
            } else {
                TransportError::Other(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Seam over backoff waits. Production uses [`ThreadSleeper`]; tests record
/// the requested delays instead of sleeping.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Blocks the current thread for the backoff delay.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Where a source expects its API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Key sent as a request header with this name.
    Header(&'static str),
    /// Key sent as a query parameter with this name.
    QueryParam(&'static str),
}

/// How the resource name is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStyle {
    /// Appended to the base URL as a path segment (`{base}/teams`).
    Path,
    /// Sent as the `action` query parameter against a single endpoint.
    ActionParam,
}

/// Response post-processing hook, applied after decode and before save.
pub type PostProcess = fn(resource: &str, payload: &mut Value);

/// Everything source-specific about talking to one upstream provider.
#[derive(Debug, Clone)]
pub struct SourceEndpoint {
    pub source: SourceId,
    pub base_url: String,
    pub auth: AuthScheme,
    pub api_key: String,
    pub resource_style: ResourceStyle,
    pub post_process: Option<PostProcess>,
}

impl SourceEndpoint {
    /// API-Sports: header auth, resource as path segment, enveloped payloads.
    pub fn api_sports(api_key: impl Into<String>) -> Self {
        Self {
            source: SourceId::ApiSports,
            base_url: "https://v3.football.api-sports.io/".to_string(),
            auth: AuthScheme::Header("x-apisports-key"),
            api_key: api_key.into(),
            resource_style: ResourceStyle::Path,
            post_process: None,
        }
    }

    /// API-Football: query-param auth, single endpoint dispatched on the
    /// `action` parameter, flat array payloads. `get_teams` responses carry a
    /// large nested player roster that is stripped before returning.
    pub fn api_football(api_key: impl Into<String>) -> Self {
        Self {
            source: SourceId::ApiFootball,
            base_url: "https://apiv3.apifootball.com/".to_string(),
            auth: AuthScheme::QueryParam("APIkey"),
            api_key: api_key.into(),
            resource_style: ResourceStyle::ActionParam,
            post_process: Some(strip_player_rosters),
        }
    }
}

/// Drop the `players` roster from every team entry of a `get_teams` payload.
/// It is not part of the unified schema and wastes downstream bandwidth.
fn strip_player_rosters(resource: &str, payload: &mut Value) {
    if resource != "get_teams" {
        return;
    }
    if let Some(entries) = payload.as_array_mut() {
        for entry in entries {
            if let Some(team) = entry.as_object_mut() {
                team.remove("players");
            }
        }
    }
}

/// Retrying HTTP extractor for one upstream source.
pub struct Extractor {
    endpoint: SourceEndpoint,
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    max_attempts: u32,
    backoff_step: Duration,
}

impl Extractor {
    /// Production extractor: blocking reqwest transport, real sleeps.
    pub fn new(endpoint: SourceEndpoint) -> Self {
        Self::with_parts(endpoint, Box::new(HttpTransport::new()), Box::new(ThreadSleeper))
    }

    /// Extractor with injected transport and sleeper. Used by tests and by
    /// callers that need a shared client.
    pub fn with_parts(
        endpoint: SourceEndpoint,
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            endpoint,
            transport,
            sleeper,
            max_attempts: MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
        }
    }

    pub fn source(&self) -> SourceId {
        self.endpoint.source
    }

    fn request_parts(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> (String, Vec<(String, String)>, Vec<(String, String)>) {
        let mut headers = Vec::new();
        let mut full_query: Vec<(String, String)> = Vec::new();

        let url = match self.endpoint.resource_style {
            ResourceStyle::Path => format!("{}{}", self.endpoint.base_url, resource),
            ResourceStyle::ActionParam => {
                full_query.push(("action".to_string(), resource.to_string()));
                self.endpoint.base_url.clone()
            }
        };

        for (name, value) in query {
            full_query.push(((*name).to_string(), (*value).to_string()));
        }

        match self.endpoint.auth {
            AuthScheme::Header(name) => {
                headers.push((name.to_string(), self.endpoint.api_key.clone()));
            }
            AuthScheme::QueryParam(name) => {
                full_query.push((name.to_string(), self.endpoint.api_key.clone()));
            }
        }

        (url, headers, full_query)
    }

    /// Fetch one resource from the source, retrying transient failures.
    ///
    /// On success the decoded payload is returned after the endpoint's
    /// post-processing hook runs; if `save_path` is given, the payload is
    /// also dumped there as pretty JSON (best-effort — a write failure is
    /// logged, not surfaced). Every failed attempt is appended to `errors`
    /// under the source's category and counted in `metrics`.
    pub fn fetch(
        &self,
        resource: &str,
        query: &[(&str, &str)],
        save_path: Option<&Path>,
        errors: &mut ErrorLog,
        mut metrics: Option<&mut RunMetrics>,
    ) -> Result<Value, ExtractError> {
        let source = self.endpoint.source;
        let category = ErrorCategory::for_source(source);
        let (url, headers, full_query) = self.request_parts(resource, query);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tracing::info!(
                %source,
                resource,
                attempt,
                max_attempts = self.max_attempts,
                "fetching"
            );

            let started = Instant::now();
            let outcome = self.transport.get(&url, &headers, &full_query);
            let elapsed = started.elapsed();

            let transient = match outcome {
                Ok(response) if (200..300).contains(&response.status) => {
                    if let Some(m) = metrics.as_deref_mut() {
                        m.record_call(source, elapsed);
                    }
                    match serde_json::from_str::<Value>(&response.body) {
                        Ok(mut payload) => {
                            if let Some(hook) = self.endpoint.post_process {
                                hook(resource, &mut payload);
                            }
                            if let Some(path) = save_path {
                                save_payload(source, path, &payload);
                            }
                            return Ok(payload);
                        }
                        Err(e) => {
                            errors.record(category, format!("Decode error: {resource} - {e}"));
                            if let Some(m) = metrics.as_deref_mut() {
                                m.record_error(source);
                            }
                            tracing::error!(%source, resource, error = %e, "response decode failed");
                            return Err(ExtractError::Decode(e.to_string()));
                        }
                    }
                }
                Ok(response) => {
                    errors.record(category, format!("HTTP {}: {resource}", response.status));
                    if let Some(m) = metrics.as_deref_mut() {
                        m.record_error(source);
                    }
                    tracing::error!(
                        %source,
                        resource,
                        status = response.status,
                        "HTTP status error, not retrying"
                    );
                    return Err(ExtractError::Http {
                        status: response.status,
                    });
                }
                Err(TransportError::Timeout) => {
                    errors.record(category, format!("Timeout attempt {attempt}: {resource}"));
                    ExtractError::TimedOut { attempts: attempt }
                }
                Err(TransportError::Connection(reason)) => {
                    errors.record(
                        category,
                        format!("Connection error attempt {attempt}: {resource}"),
                    );
                    ExtractError::ConnectionFailed {
                        attempts: attempt,
                        reason,
                    }
                }
                Err(TransportError::Other(reason)) => {
                    errors.record(category, format!("Unexpected: {reason}"));
                    if let Some(m) = metrics.as_deref_mut() {
                        m.record_error(source);
                    }
                    tracing::error!(%source, resource, reason, "unexpected transport failure");
                    return Err(ExtractError::Unexpected(reason));
                }
            };

            if let Some(m) = metrics.as_deref_mut() {
                m.record_error(source);
            }
            tracing::warn!(%source, resource, attempt, error = %transient, "transient failure");

            if attempt >= self.max_attempts {
                tracing::error!(%source, resource, attempts = attempt, "retries exhausted");
                return Err(transient);
            }

            let delay = self.backoff_step * attempt;
            tracing::info!(
                %source,
                resource,
                delay_secs = delay.as_secs(),
                "waiting before retry"
            );
            self.sleeper.sleep(delay);
        }
    }
}

fn save_payload(source: SourceId, path: &Path, payload: &Value) {
    let pretty = match serde_json::to_string_pretty(payload) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(%source, error = %e, "could not serialize raw payload for audit");
            return;
        }
    };
    match std::fs::write(path, pretty) {
        Ok(()) => tracing::info!(%source, path = %path.display(), "raw payload saved"),
        Err(e) => {
            tracing::warn!(%source, path = %path.display(), error = %e, "raw payload save failed")
        }
    }
}
