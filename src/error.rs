use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::throttle::{self, Signal};

/// Errors raised while resolving inputs, before any request is made.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("GITHUB_TOKEN must be supplied")]
    MissingToken,

    #[error("Input required and not supplied: {0}")]
    RequiredInput(String),

    #[error("repository must be supplied as owner/repo (set GITHUB_REPOSITORY or pass --repo)")]
    MissingRepository,

    #[error("invalid repository {0:?}, expected owner/repo")]
    InvalidRepository(String),
}

/// Errors returned by the GitHub API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("{message} (HTTP {status}, {signal})")]
    Throttled {
        signal: Signal,
        status: u16,
        message: String,
    },

    #[error("Failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL {0}")]
    Url(String),
}

impl ApiError {
    /// Builds the error for a failed response, preferring the `message` field
    /// of GitHub's JSON error body. Rate-limit responses become `Throttled`.
    pub fn from_response(status: u16, headers: &HeaderMap, body: &str) -> Self {
        let message = error_message(body);

        match throttle::detect_now(status, headers, &message) {
            Some(signal) => ApiError::Throttled {
                signal,
                status,
                message,
            },
            None => ApiError::Status { status, message },
        }
    }
}

pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}
