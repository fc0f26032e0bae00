// src/sources/news_rss.rs
//! RSS news adapter. One adapter instance covers a configured list of
//! feeds; a broken feed is logged and skipped so the other feeds still
//! deliver in the same fetch.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{http_client, parse_err, status_err, transport_err, SourceAdapter, SourceError};
use crate::model::ContentType;

const SOURCE: &str = "news_rss";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

pub struct NewsRssAdapter {
    mode: Mode,
}

enum Mode {
    /// (feed name, xml body) pairs.
    Fixture(Vec<(String, String)>),
    Http {
        feeds: Vec<FeedSpec>,
        client: reqwest::Client,
    },
}

impl NewsRssAdapter {
    pub fn from_fixtures(fixtures: Vec<(String, String)>) -> Self {
        Self {
            mode: Mode::Fixture(fixtures),
        }
    }

    pub fn from_feeds(feeds: Vec<FeedSpec>) -> Self {
        Self {
            mode: Mode::Http {
                feeds,
                client: http_client(SOURCE),
            },
        }
    }

    fn parse_feed(feed_name: &str, xml: &str) -> Result<Vec<Value>, SourceError> {
        let cleaned = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&cleaned).map_err(|e| parse_err(SOURCE, e))?;
        Ok(rss
            .channel
            .items
            .into_iter()
            .map(|it| {
                json!({
                    "feed": feed_name,
                    "title": it.title,
                    "link": it.link,
                    "pubDate": it.pub_date,
                    "description": it.description,
                    "categories": it.categories,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for NewsRssAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn content_type(&self) -> ContentType {
        ContentType::News
    }

    async fn fetch_latest(&self) -> Result<Vec<Value>, SourceError> {
        match &self.mode {
            Mode::Fixture(fixtures) => {
                let mut out = Vec::new();
                for (name, xml) in fixtures {
                    out.extend(Self::parse_feed(name, xml)?);
                }
                Ok(out)
            }
            Mode::Http { feeds, client } => {
                let mut out = Vec::new();
                for feed in feeds {
                    match fetch_one(client, feed).await {
                        Ok(mut items) => out.append(&mut items),
                        Err(e) => {
                            tracing::warn!(error = %e, feed = %feed.name, "news feed failed; skipping");
                            metrics::counter!("curator_feed_errors_total").increment(1);
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

async fn fetch_one(client: &reqwest::Client, feed: &FeedSpec) -> Result<Vec<Value>, SourceError> {
    let resp = client
        .get(&feed.url)
        .send()
        .await
        .map_err(|e| transport_err(SOURCE, e))?;
    if !resp.status().is_success() {
        return Err(status_err(SOURCE, resp.status()));
    }
    let body = resp.text().await.map_err(|e| transport_err(SOURCE, e))?;
    NewsRssAdapter::parse_feed(&feed.name, &body)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>AI Wire</title>
  <item>
    <title>Startup unveils new language model</title>
    <link>https://example.com/a1</link>
    <pubDate>Mon, 05 Feb 2024 09:00:00 GMT</pubDate>
    <description>The model targets enterprise search.</description>
    <category>AI</category>
    <category>Product</category>
  </item>
</channel></rss>"#;

    #[tokio::test]
    async fn fixture_items_carry_feed_name_and_tags() {
        let adapter =
            NewsRssAdapter::from_fixtures(vec![("AI Wire".to_string(), FIXTURE.to_string())]);
        let items = adapter.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["feed"], "AI Wire");
        assert_eq!(items[0]["categories"][1], "Product");
    }
}
