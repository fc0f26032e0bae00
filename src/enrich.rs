// src/enrich.rs
//! Summary enrichment: collaborator abstraction + best-effort backfill.
//!
//! The summarizer is selected at construction time; when no provider or key
//! is configured the no-op implementation returns `None` deterministically,
//! so call sites never branch on "is enrichment on". The backfill pass is
//! idempotent because the selection predicate excludes already-summarized
//! entities, and it rate-limits itself between items.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{ContentType, SummaryBundle};
use crate::store::EntityStore;

/// External summarization collaborator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns `None` on failure, empty output, or when disabled; never errors.
    async fn summarize(
        &self,
        kind: ContentType,
        title: &str,
        body: &str,
    ) -> Option<SummaryBundle>;

    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Build a summarizer from the environment: a real provider when
/// SUMMARY_API_KEY is set, otherwise the no-op.
pub fn build_summarizer() -> DynSummarizer {
    match std::env::var("SUMMARY_API_KEY") {
        Ok(key) if !key.is_empty() => Arc::new(OpenAiSummarizer::new(key, None)),
        _ => Arc::new(NoopSummarizer),
    }
}

/// Always `None`; used when enrichment is not configured.
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _: ContentType, _: &str, _: &str) -> Option<SummaryBundle> {
        None
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

/// Fixed-output summarizer for tests.
#[derive(Clone)]
pub struct MockSummarizer {
    pub fixed: SummaryBundle,
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, _: ContentType, _: &str, _: &str) -> Option<SummaryBundle> {
        Some(self.fixed.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Chat-completions provider. A missing key degrades to `None` without an
/// error; malformed model output falls back to using the raw content as the
/// summary text.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ai-signal-curator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model_override.unwrap_or("gpt-4o-mini").to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        kind: ContentType,
        title: &str,
        body: &str,
    ) -> Option<SummaryBundle> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: String,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "Summarize the given AI-related item. Reply with JSON: \
                   {\"summary\": string, \"keywords\": [string], \"highlights\": [string]}. \
                   Keep the summary under 3 sentences.";
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys.to_string(),
                },
                Msg {
                    role: "user",
                    content: format!("type: {kind}\ntitle: {title}\nbody: {body}"),
                },
            ],
            temperature: 0.2,
            max_tokens: 400,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let payload: Resp = resp.json().await.ok()?;
        let content = payload.choices.first().map(|c| c.message.content.trim())?;
        if content.is_empty() {
            return None;
        }

        let bundle = serde_json::from_str::<SummaryBundle>(content).unwrap_or(SummaryBundle {
            summary: content.to_string(),
            keywords: Vec::new(),
            highlights: Vec::new(),
        });
        if bundle.is_empty() {
            None
        } else {
            Some(bundle)
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Scans for entities lacking a summary and fills them in, best-effort.
pub struct BackfillEngine {
    store: Arc<dyn EntityStore>,
    summarizer: DynSummarizer,
    delay: Duration,
}

impl BackfillEngine {
    pub fn new(store: Arc<dyn EntityStore>, summarizer: DynSummarizer, delay_ms: u64) -> Self {
        Self {
            store,
            summarizer,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Enrich up to `limit` entities of one type. Returns how many were
    /// actually updated. Per-item failures are logged and skipped.
    pub async fn backfill(&self, kind: ContentType, limit: usize) -> Result<usize> {
        let pending = self.store.missing_summary(kind, limit).await?;
        let mut updated = 0usize;

        for (i, entity) in pending.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let Some(bundle) = self
                .summarizer
                .summarize(kind, &entity.title, entity.fields.body_text())
                .await
            else {
                continue;
            };
            if bundle.is_empty() {
                continue;
            }
            match self
                .store
                .apply_summary(kind, &entity.identity_key, &bundle)
                .await
            {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = ?e, kind = %kind, item = %entity.identity_key,
                        "summary write failed; continuing");
                }
            }
        }

        if updated > 0 {
            tracing::info!(kind = %kind, updated, provider = self.summarizer.provider_name(),
                "backfill pass applied summaries");
        }
        Ok(updated)
    }
}
