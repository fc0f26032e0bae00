// src/sources/mod.rs
//! Per-source adapters.
//!
//! Every adapter yields raw records as JSON maps in the source's native
//! field names; normalization into the shared entity model happens later in
//! the pipeline. Empty results are an empty vec, never an error; rate-limit
//! and HTTP-status failures surface as distinguishable [`SourceError`]
//! variants so the orchestrator can log them without crashing.

pub mod arxiv;
pub mod github;
pub mod huggingface;
pub mod news_rss;
pub mod youtube;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ContentType;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{adapter}: rate limited")]
    RateLimited { adapter: &'static str },
    #[error("{adapter}: http status {status}")]
    Http { adapter: &'static str, status: u16 },
    #[error("{adapter}: transport: {message}")]
    Transport {
        adapter: &'static str,
        message: String,
    },
    #[error("{adapter}: parse: {message}")]
    Parse {
        adapter: &'static str,
        message: String,
    },
}

impl SourceError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn content_type(&self) -> ContentType;
    /// Latest raw records, newest-ish first, in native field names.
    async fn fetch_latest(&self) -> Result<Vec<serde_json::Value>, SourceError>;
}

/// Shared HTTP client: explicit timeouts so a hung source fails instead of
/// stalling the whole collect-all run.
pub(crate) fn http_client(source: &'static str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("ai-signal-curator/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|e| panic!("building http client for {source}: {e}"))
}

pub(crate) fn transport_err(adapter: &'static str, e: reqwest::Error) -> SourceError {
    SourceError::Transport {
        adapter,
        message: e.to_string(),
    }
}

pub(crate) fn status_err(adapter: &'static str, status: reqwest::StatusCode) -> SourceError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status == reqwest::StatusCode::FORBIDDEN
    {
        SourceError::RateLimited { adapter }
    } else {
        SourceError::Http {
            adapter,
            status: status.as_u16(),
        }
    }
}

pub(crate) fn parse_err(adapter: &'static str, e: impl std::fmt::Display) -> SourceError {
    SourceError::Parse {
        adapter,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_statuses_map_to_the_rate_limit_variant() {
        assert!(status_err("x", reqwest::StatusCode::TOO_MANY_REQUESTS).is_rate_limit());
        assert!(status_err("x", reqwest::StatusCode::FORBIDDEN).is_rate_limit());
        assert!(!status_err("x", reqwest::StatusCode::INTERNAL_SERVER_ERROR).is_rate_limit());
        assert!(!parse_err("x", "bad xml").is_rate_limit());
    }
}
