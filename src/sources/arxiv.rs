// src/sources/arxiv.rs
//! Preprint archive adapter. The archive speaks Atom; entries are flattened
//! into JSON maps ("id", "title", "summary", "published", "categories",
//! "authors") before they leave the adapter.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{http_client, parse_err, status_err, transport_err, SourceAdapter, SourceError};
use crate::model::ContentType;

const SOURCE: &str = "arxiv";
const DEFAULT_URL: &str = "http://export.arxiv.org/api/query?search_query=cat:cs.CL+OR+cat:cs.CV+OR+cat:cs.LG&sortBy=submittedDate&sortOrder=descending&max_results=50";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

pub struct ArxivAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl ArxivAdapter {
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
        let feed: Feed = from_str(body).map_err(|e| parse_err(SOURCE, e))?;
        Ok(feed
            .entries
            .into_iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "title": e.title,
                    "summary": e.summary,
                    "published": e.published,
                    "categories": e
                        .categories
                        .into_iter()
                        .filter_map(|c| c.term)
                        .collect::<Vec<_>>(),
                    "authors": e
                        .authors
                        .into_iter()
                        .filter_map(|a| a.name)
                        .collect::<Vec<_>>(),
                })
            })
            .collect())
    }
}

impl Default for ArxivAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn content_type(&self) -> ContentType {
        ContentType::Paper
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

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <title>Scaling Laws Revisited</title>
    <summary>We revisit scaling laws for large language models.</summary>
    <published>2024-01-01T12:00:00Z</published>
    <category term="cs.CL"/>
    <category term="cs.LG"/>
    <author><name>A. Researcher</name></author>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn fixture_entries_are_flattened() {
        let adapter = ArxivAdapter::from_fixture_str(FIXTURE);
        let items = adapter.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Scaling Laws Revisited");
        assert_eq!(items[0]["categories"][0], "cs.CL");
    }

    #[tokio::test]
    async fn empty_feed_yields_empty_vec() {
        let adapter = ArxivAdapter::from_fixture_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#,
        );
        assert!(adapter.fetch_latest().await.unwrap().is_empty());
    }
}
