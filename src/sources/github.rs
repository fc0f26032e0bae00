// src/sources/github.rs
//! Code-hosting search adapter. Several keyword-scoped queries run against
//! the same search API; results are merged keeping the highest-starred
//! observation per repository full name, so a repo surfacing under two
//! queries is seen once.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, parse_err, status_err, transport_err, SourceAdapter, SourceError};
use crate::model::ContentType;

const SOURCE: &str = "github";
const DEFAULT_QUERIES: [&str; 4] = ["llm", "ai agent", "rag", "diffusion model"];

pub struct GithubAdapter {
    mode: Mode,
}

enum Mode {
    /// One fixture body per configured query.
    Fixture(Vec<String>),
    Http {
        queries: Vec<String>,
        token: Option<String>,
        client: reqwest::Client,
    },
}

impl GithubAdapter {
    pub fn from_fixture_bodies(bodies: Vec<String>) -> Self {
        Self {
            mode: Mode::Fixture(bodies),
        }
    }

    pub fn from_queries(queries: Vec<String>, token: Option<String>) -> Self {
        Self {
            mode: Mode::Http {
                queries,
                token,
                client: http_client(SOURCE),
            },
        }
    }

    /// Default query set; token from GITHUB_TOKEN when present.
    pub fn from_env() -> Self {
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        Self::from_queries(
            DEFAULT_QUERIES.iter().map(|s| s.to_string()).collect(),
            token,
        )
    }

    fn parse_body(body: &str) -> Result<Vec<Value>, SourceError> {
        let parsed: Value = serde_json::from_str(body).map_err(|e| parse_err(SOURCE, e))?;
        match parsed.get("items").and_then(Value::as_array) {
            Some(items) => Ok(items.clone()),
            None => Err(parse_err(SOURCE, "missing `items` array in search response")),
        }
    }

    /// Keep the best-ranked (max stars) observation per full name,
    /// preserving first-seen order.
    fn merge(batches: Vec<Vec<Value>>) -> Vec<Value> {
        let mut order: Vec<String> = Vec::new();
        let mut best: HashMap<String, Value> = HashMap::new();
        for item in batches.into_iter().flatten() {
            let Some(full_name) = item.get("full_name").and_then(Value::as_str) else {
                continue;
            };
            let stars = item
                .get("stargazers_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            match best.get(full_name) {
                Some(prev) => {
                    let prev_stars = prev
                        .get("stargazers_count")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    if stars > prev_stars {
                        best.insert(full_name.to_string(), item);
                    }
                }
                None => {
                    order.push(full_name.to_string());
                    best.insert(full_name.to_string(), item);
                }
            }
        }
        order.into_iter().filter_map(|k| best.remove(&k)).collect()
    }
}

#[async_trait]
impl SourceAdapter for GithubAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn content_type(&self) -> ContentType {
        ContentType::Repo
    }

    async fn fetch_latest(&self) -> Result<Vec<Value>, SourceError> {
        match &self.mode {
            Mode::Fixture(bodies) => {
                let mut batches = Vec::with_capacity(bodies.len());
                for body in bodies {
                    batches.push(Self::parse_body(body)?);
                }
                Ok(Self::merge(batches))
            }
            Mode::Http {
                queries,
                token,
                client,
            } => {
                let mut batches = Vec::with_capacity(queries.len());
                for q in queries {
                    let url = format!(
                        "https://api.github.com/search/repositories?q={}&sort=stars&order=desc&per_page=30",
                        urlencode(q)
                    );
                    let mut req = client
                        .get(&url)
                        .header("Accept", "application/vnd.github+json");
                    if let Some(t) = token {
                        req = req.bearer_auth(t);
                    }
                    let resp = req.send().await.map_err(|e| transport_err(SOURCE, e))?;
                    if !resp.status().is_success() {
                        return Err(status_err(SOURCE, resp.status()));
                    }
                    let body = resp.text().await.map_err(|e| transport_err(SOURCE, e))?;
                    batches.push(Self::parse_body(&body)?);
                }
                Ok(Self::merge(batches))
            }
        }
    }
}

fn urlencode(q: &str) -> String {
    q.replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overlapping_queries_keep_highest_star_observation() {
        let a = r#"{"items": [
            {"full_name": "acme/ragkit", "stargazers_count": 120, "description": "rag toolkit"},
            {"full_name": "acme/llmrunner", "stargazers_count": 80}
        ]}"#;
        let b = r#"{"items": [
            {"full_name": "acme/ragkit", "stargazers_count": 150, "description": "rag toolkit"}
        ]}"#;
        let adapter = GithubAdapter::from_fixture_bodies(vec![a.to_string(), b.to_string()]);
        let items = adapter.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["full_name"], "acme/ragkit");
        assert_eq!(items[0]["stargazers_count"], 150);
    }

    #[tokio::test]
    async fn response_without_items_is_a_parse_error() {
        let adapter = GithubAdapter::from_fixture_bodies(vec![r#"{"message": "rate"}"#.into()]);
        assert!(matches!(
            adapter.fetch_latest().await.unwrap_err(),
            SourceError::Parse { .. }
        ));
    }
}
