// src/sources/huggingface.rs
//! Model registry adapter. The registry API returns a JSON array of model
//! cards (`modelId`, `pipeline_tag`, `downloads`, `likes`, `library_name`).

use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, parse_err, status_err, transport_err, SourceAdapter, SourceError};
use crate::model::ContentType;

const SOURCE: &str = "huggingface";
const DEFAULT_URL: &str =
    "https://huggingface.co/api/models?sort=downloads&direction=-1&limit=50";

pub struct HuggingFaceAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl HuggingFaceAdapter {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: &str) -> Self {
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client: http_client(SOURCE),
            },
        }
    }

    pub fn new() -> Self {
        Self::from_url(DEFAULT_URL)
    }

    fn parse_body(body: &str) -> Result<Vec<Value>, SourceError> {
        let parsed: Value = serde_json::from_str(body).map_err(|e| parse_err(SOURCE, e))?;
        match parsed {
            Value::Array(items) => Ok(items),
            _ => Err(parse_err(SOURCE, "expected a JSON array of model cards")),
        }
    }
}

impl Default for HuggingFaceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for HuggingFaceAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn content_type(&self) -> ContentType {
        ContentType::Model
    }

    async fn fetch_latest(&self) -> Result<Vec<Value>, SourceError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_body(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_parses_model_cards() {
        let fixture = r#"[
            {"modelId": "acme/llama-clone", "pipeline_tag": "text-generation", "downloads": 1200, "likes": 31},
            {"modelId": "acme/whisper-tiny", "pipeline_tag": "automatic-speech-recognition", "downloads": 400, "likes": 5}
        ]"#;
        let adapter = HuggingFaceAdapter::from_fixture_str(fixture);
        let items = adapter.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["modelId"], "acme/llama-clone");
    }

    #[tokio::test]
    async fn non_array_body_is_a_parse_error() {
        let adapter = HuggingFaceAdapter::from_fixture_str(r#"{"error": "nope"}"#);
        let err = adapter.fetch_latest().await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
