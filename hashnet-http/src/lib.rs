//! Small JSON-over-HTTP client used by the ingestor.
//!
//! - Request options: bearer token, query params, timeout, retries
//! - Redacts sensitive query params and never logs secret values
//! - Retries network errors, 429 and 5xx with exponential backoff and
//!   `Retry-After` support
//! - Optional raw request/response logging via `HASHNET_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), hashnet_http::HttpError> {
//! let client = hashnet_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", hashnet_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: `tracing` events are emitted for request start, response
//! headers (including `x-rate-limit-*`), retries and final errors. Raw lines go
//! to the `http.raw` target.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "HASHNET_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
const BASE_BACKOFF_MS: u64 = 200;
const RATE_LIMIT_FLOOR_MS: u64 = 1100;

const SECRET_PARAMS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Whether the remote side throttled us (after retries were exhausted).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, HttpError::Api { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use hashnet_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     bearer: Some("t"),
///     query: Some(vec![("query", "#rust".into())]),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    /// Sent as `Authorization: Bearer <token>`; never logged.
    pub bearer: Option<&'a str>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```
    /// use hashnet_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let bearer = opts.bearer.map(sanitize_bearer).transpose()?;
        let query: Vec<(&str, Cow<'_, str>)> = opts.query.clone().unwrap_or_default();
        let pairs: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_ref())).collect();
        let redacted_q = redact_pairs(&pairs);

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let auth_kind = if bearer.is_some() { "bearer" } else { "none" };
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(Method::GET, url.clone())
                .timeout(timeout)
                .query(&pairs);
            if let Some(tok) = &bearer {
                rb = rb.bearer_auth(tok);
            }

            let req_id = format!(
                "r{:x}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            );
            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind,
                "http.request.start"
            );
            if raw_enabled() {
                tracing::debug!(target: "http.raw", %req_id, url=%url, query=?redacted_q, "request");
            }

            let t0 = std::time::Instant::now();
            let sent = match rb.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes().await.map(|b| (status, headers, b))
                }
                Err(err) => Err(err),
            };
            let (status, headers, bytes) = match sent {
                Ok(parts) => parts,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = exponential_backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, message=%message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let request_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            let header_str = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%request_id,
                rate_limit.limit=?header_str("x-rate-limit-limit"),
                rate_limit.remaining=?header_str("x-rate-limit-remaining"),
                rate_limit.reset=?header_str("x-rate-limit-reset"),
                "http.response.headers"
            );
            if raw_enabled() {
                let cap = bytes.len().min(RAW_MAX_BODY);
                let text = String::from_utf8_lossy(&bytes[..cap]);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    %status,
                    duration_ms=dur_ms,
                    body=%text,
                    truncated=bytes.len() > RAW_MAX_BODY
                );
            }

            let snippet = snip_body(&bytes);

            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        req_id=%req_id,
                        serde_line=e.line(),
                        serde_col=e.column(),
                        serde_err=%e,
                        body_snippet=%snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let delay = retry_delay(attempt, is_429, &headers);
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%request_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

fn exponential_backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(1u64 << shift))
}

/// `Retry-After` wins; otherwise exponential, with a floor for 429.
fn retry_delay(attempt: usize, is_429: bool, headers: &HeaderMap) -> Duration {
    if let Some(secs) = retry_after_secs(headers) {
        return Duration::from_secs(secs);
    }
    let exp = exponential_backoff(attempt);
    if is_429 {
        exp.max(Duration::from_millis(RATE_LIMIT_FLOOR_MS))
    } else {
        exp
    }
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn redact_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let secret = SECRET_PARAMS.contains(&k.to_ascii_lowercase().as_str());
            (
                (*k).to_string(),
                if secret {
                    "<redacted>".to_string()
                } else {
                    (*v).to_string()
                },
            )
        })
        .collect()
}

/// Pull a human-readable message out of common API error envelopes.
fn extract_error_message(body: &[u8]) -> String {
    // Twitter v2: {"errors":[{"message":..,"detail":..,"title":..}]}
    #[derive(Deserialize)]
    struct TwErrors {
        errors: Vec<Detail>,
    }
    // Generic: {"title":..,"detail":..} or {"message":..} or {"error":..}
    #[derive(Deserialize)]
    struct Detail {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        error: String,
    }

    fn first_nonempty(d: Detail) -> Option<String> {
        [d.message, d.detail, d.title, d.error]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    if let Ok(tw) = serde_json::from_slice::<TwErrors>(body) {
        if let Some(msg) = tw.errors.into_iter().next().and_then(first_nonempty) {
            return msg;
        }
    }
    if let Ok(d) = serde_json::from_slice::<Detail>(body) {
        if let Some(msg) = first_nonempty(d) {
            return msg;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("bearer token is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("bearer token contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "bearer token contains control characters".into(),
        ));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_error_envelope() {
        let body = br#"{"errors":[{"title":"Invalid Request","detail":"bad query"}]}"#;
        assert_eq!(extract_error_message(body), "bad query");
    }

    #[test]
    fn generic_title_envelope() {
        let body = br#"{"title":"Unauthorized","type":"about:blank","status":401}"#;
        assert_eq!(extract_error_message(body), "Unauthorized");
    }

    #[test]
    fn non_json_body_is_snipped() {
        let body = "x".repeat(SNIPPET_MAX + 20);
        let msg = extract_error_message(body.as_bytes());
        assert!(msg.ends_with("..."));
        assert_eq!(msg.len(), SNIPPET_MAX + 3);
    }

    #[test]
    fn secrets_are_redacted() {
        let r = redact_pairs(&[("query", "#rust"), ("Token", "abc")]);
        assert_eq!(r[0].1, "#rust");
        assert_eq!(r[1].1, "<redacted>");
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_delay(1, true, &h), Duration::from_secs(3));
    }

    #[test]
    fn rate_limit_has_floor() {
        let h = HeaderMap::new();
        assert_eq!(retry_delay(1, true, &h), Duration::from_millis(1100));
        assert_eq!(retry_delay(1, false, &h), Duration::from_millis(200));
        assert_eq!(retry_delay(3, false, &h), Duration::from_millis(800));
    }

    #[test]
    fn bearer_is_trimmed_and_checked() {
        assert_eq!(sanitize_bearer(" \"abc def\"\n").unwrap(), "abcdef");
        assert!(sanitize_bearer("   ").is_err());
        assert!(sanitize_bearer("tök").is_err());
    }
}
