// src/sources/youtube.rs
//! Video platform adapter. Search results come back as
//! `{"items": [{"id": {"videoId": ...}, "snippet": {...}}]}`; the raw item
//! objects are passed through untouched. A missing API key degrades to an
//! empty fetch rather than an error.

use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, parse_err, status_err, transport_err, SourceAdapter, SourceError};
use crate::model::ContentType;

const SOURCE: &str = "youtube";
const DEFAULT_QUERY: &str = "AI machine learning";

pub struct YoutubeAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        query: String,
        api_key: Option<String>,
        client: reqwest::Client,
    },
}

impl YoutubeAdapter {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_env() -> Self {
        let api_key = std::env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self {
            mode: Mode::Http {
                query: DEFAULT_QUERY.to_string(),
                api_key,
                client: http_client(SOURCE),
            },
        }
    }

    fn parse_body(body: &str) -> Result<Vec<Value>, SourceError> {
        let parsed: Value = serde_json::from_str(body).map_err(|e| parse_err(SOURCE, e))?;
        match parsed.get("items").and_then(Value::as_array) {
            Some(items) => Ok(items.clone()),
            None => Err(parse_err(SOURCE, "missing `items` array in search response")),
        }
    }
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn content_type(&self) -> ContentType {
        ContentType::Video
    }

    async fn fetch_latest(&self) -> Result<Vec<Value>, SourceError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_body(s),
            Mode::Http {
                query,
                api_key,
                client,
            } => {
                let Some(key) = api_key else {
                    tracing::warn!(source = SOURCE, "no API key configured; skipping fetch");
                    return Ok(Vec::new());
                };
                let url = format!(
                    "https://www.googleapis.com/youtube/v3/search?part=snippet&type=video&order=date&maxResults=50&q={}&key={}",
                    query.replace(' ', "+"),
                    key
                );
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| transport_err(SOURCE, e))?;
                if !resp.status().is_success() {
                    return Err(status_err(SOURCE, resp.status()));
                }
                let body = resp.text().await.map_err(|e| transport_err(SOURCE, e))?;
                Self::parse_body(&body)
            }
        }
    }
}
