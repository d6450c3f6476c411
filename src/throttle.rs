//! Rate-limit handling for GitHub API requests.
//!
//! A primary rate limit is retried once after the delay the server asks for.
//! Secondary (abuse detection) limits are logged and never retried.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use tracing::{info, warn};

use crate::error::ApiError;

/// Delay used for a secondary limit that carries no `retry-after` header.
const DEFAULT_SECONDARY_RETRY_AFTER: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    RateLimit { retry_after: u64 },
    Abuse { retry_after: u64 },
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::RateLimit { retry_after } => {
                write!(f, "rate limited, retry after {retry_after}s")
            }
            Signal::Abuse { retry_after } => {
                write!(f, "secondary rate limit, retry after {retry_after}s")
            }
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Classifies a failed response as a throttling signal, if it is one.
///
/// `now` is the current unix time in seconds; `x-ratelimit-reset` is compared against it.
pub fn detect(status: u16, headers: &HeaderMap, message: &str, now: i64) -> Option<Signal> {
    if status != 403 && status != 429 {
        return None;
    }

    let lowered = message.to_lowercase();
    let retry_after = header_u64(headers, "retry-after");
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.trim() == "0");

    if lowered.contains("secondary rate") || lowered.contains("abuse") {
        return Some(Signal::Abuse {
            retry_after: retry_after.unwrap_or(DEFAULT_SECONDARY_RETRY_AFTER),
        });
    }

    if exhausted {
        let retry_after = retry_after.unwrap_or_else(|| {
            header_i64(headers, "x-ratelimit-reset").map_or(0, |reset| (reset - now).max(0) as u64)
        });
        return Some(Signal::RateLimit { retry_after });
    }

    retry_after.map(|retry_after| Signal::Abuse { retry_after })
}

pub fn detect_now(status: u16, headers: &HeaderMap, message: &str) -> Option<Signal> {
    detect(status, headers, message, Utc::now().timestamp())
}

/// Called when a request hits the primary rate limit. Returns whether to retry.
pub fn on_rate_limit(retry_after: u64, method: &str, url: &str, retry_count: u32) -> bool {
    warn!("Request quota exhausted for request {method} {url}");

    if retry_count == 0 {
        // only retries once
        info!("Retrying after {retry_after} seconds!");
        return true;
    }
    false
}

/// Called when a request trips abuse detection. Never retries.
pub fn on_abuse_limit(_retry_after: u64, method: &str, url: &str) -> bool {
    warn!("Abuse detected for request {method} {url}");
    false
}

/// Drives `attempt` until it succeeds or fails with something the throttling
/// policy does not retry.
pub async fn run_throttled<T, F, Fut>(method: &str, url: &str, mut attempt: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut retry_count = 0;
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let retry = match &err {
            ApiError::Throttled {
                signal: Signal::RateLimit { retry_after },
                ..
            } => on_rate_limit(*retry_after, method, url, retry_count).then_some(*retry_after),
            ApiError::Throttled {
                signal: Signal::Abuse { retry_after },
                ..
            } => {
                on_abuse_limit(*retry_after, method, url);
                None
            }
            _ => None,
        };

        match retry {
            Some(delay) => {
                tokio::time::sleep(Duration::from_secs(delay)).await;
                retry_count += 1;
            }
            None => return Err(err),
        }
    }
}
