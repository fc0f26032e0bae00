// src/model.rs
//! Canonical entity model shared by every source pipeline.
//!
//! Each collected signal, whatever its origin, is normalized into an
//! [`Entity`]: one immutable identity key per content type, volatile
//! popularity stats, an optional generated summary, and soft-archive flags.
//! The pipeline never hard-deletes an entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Model,
    Video,
    Paper,
    News,
    Repo,
    Conference,
    Tool,
    Job,
    Policy,
}

impl ContentType {
    pub const ALL: [ContentType; 9] = [
        ContentType::Model,
        ContentType::Video,
        ContentType::Paper,
        ContentType::News,
        ContentType::Repo,
        ContentType::Conference,
        ContentType::Tool,
        ContentType::Job,
        ContentType::Policy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Model => "model",
            ContentType::Video => "video",
            ContentType::Paper => "paper",
            ContentType::News => "news",
            ContentType::Repo => "repo",
            ContentType::Conference => "conference",
            ContentType::Tool => "tool",
            ContentType::Job => "job",
            ContentType::Policy => "policy",
        }
    }

    /// Logical table name for the schema capability probe.
    pub fn table(&self) -> &'static str {
        match self {
            ContentType::Model => "models",
            ContentType::Video => "videos",
            ContentType::Paper => "papers",
            ContentType::News => "news_articles",
            ContentType::Repo => "repositories",
            ContentType::Conference => "conferences",
            ContentType::Tool => "tools",
            ContentType::Job => "job_postings",
            ContentType::Policy => "policies",
        }
    }

    /// Types the backfill engine enriches with generated summaries.
    pub fn summarizable(&self) -> bool {
        matches!(
            self,
            ContentType::Model
                | ContentType::Video
                | ContentType::Paper
                | ContentType::News
                | ContentType::Repo
        )
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volatile popularity numbers, refreshed on every observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub downloads: Option<u64>,
    pub likes: Option<u64>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub views: Option<u64>,
    pub comments: Option<u64>,
}

/// Generated-summary bundle written back by the enrichment backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBundle {
    pub summary: String,
    pub keywords: Vec<String>,
    pub highlights: Vec<String>,
}

impl SummaryBundle {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
    }
}

/// Per-type payload. Fields marked "optional column" may be dropped on write
/// when the live schema predates the migration that adds them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeFields {
    Model {
        pipeline_tag: String,
        /// Localized task label (optional column `task_ko`).
        task_ko: Option<String>,
        library: Option<String>,
    },
    Video {
        channel: String,
        /// Optional column `channel_language`.
        channel_language: Option<String>,
        published_at: DateTime<Utc>,
        body: String,
    },
    Paper {
        abstract_text: String,
        categories: Vec<String>,
        /// Optional columns `conference_name` / `conference_year`.
        conference_name: Option<String>,
        conference_year: Option<i32>,
    },
    News {
        body: String,
        tags: Vec<String>,
    },
    Repo {
        full_name: String,
        language: Option<String>,
        description: String,
    },
    /// URL-keyed types with no extra payload (conference, tool, job, policy).
    Generic,
}

/// A normalized source record, ready for classification and upsert.
/// Produced by the per-source normalizers; never persisted directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub content_type: ContentType,
    pub identity_key: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub stats: Stats,
    pub fields: TypeFields,
}

impl Candidate {
    /// Structured category/tag hints the classification engines match
    /// against rule qualifying-categories.
    pub fn hints(&self) -> Vec<String> {
        match &self.fields {
            TypeFields::Paper { categories, .. } => categories.clone(),
            TypeFields::News { tags, .. } => tags.clone(),
            TypeFields::Model { pipeline_tag, .. } => vec![pipeline_tag.clone()],
            TypeFields::Repo { language, .. } => language.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Free-text body used by keyword scans (abstract, description, ...).
    pub fn body_text(&self) -> &str {
        self.fields.body_text()
    }
}

impl TypeFields {
    pub fn body_text(&self) -> &str {
        match self {
            TypeFields::Paper { abstract_text, .. } => abstract_text,
            TypeFields::News { body, .. } => body,
            TypeFields::Video { body, .. } => body,
            TypeFields::Repo { description, .. } => description,
            _ => "",
        }
    }
}

/// Persisted catalog entry. Identity key is unique within its content type
/// and never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub content_type: ContentType,
    pub identity_key: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub label: String,
    pub stats: Stats,
    pub summary: Option<SummaryBundle>,
    pub trending: bool,
    pub featured: bool,
    pub archived: bool,
    pub collected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub fields: TypeFields,
}

impl Entity {
    pub fn has_summary(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Result of pushing one candidate through the dedup/upsert engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    SkippedDuplicate,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    NeverRan,
    Success,
    Error,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::NeverRan => "never_ran",
            JobOutcome::Success => "success",
            JobOutcome::Error => "error",
        }
    }
}

/// Last-run record the orchestrator keeps per job id. Registered as
/// never-ran at startup, overwritten on every run, process-lifetime only.
#[derive(Debug, Clone, Serialize)]
pub struct JobRunStatus {
    pub job_id: String,
    pub name: String,
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: JobOutcome,
    pub last_error: Option<String>,
    pub next_run: Option<DateTime<Utc>>,
}

impl JobRunStatus {
    pub fn never_ran(job_id: &str, name: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            name: name.to_string(),
            last_run: None,
            last_status: JobOutcome::NeverRan,
            last_error: None,
            next_run: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_bundle_emptiness() {
        assert!(SummaryBundle::default().is_empty());
        assert!(SummaryBundle {
            summary: "   ".into(),
            ..Default::default()
        }
        .is_empty());
        assert!(!SummaryBundle {
            summary: "A short take.".into(),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn hints_come_from_type_fields() {
        let c = Candidate {
            content_type: ContentType::Paper,
            identity_key: "2401.00001".into(),
            title: "t".into(),
            source: "arxiv".into(),
            url: None,
            stats: Stats::default(),
            fields: TypeFields::Paper {
                abstract_text: String::new(),
                categories: vec!["cs.CL".into(), "cs.LG".into()],
                conference_name: None,
                conference_year: None,
            },
        };
        assert_eq!(c.hints(), vec!["cs.CL".to_string(), "cs.LG".to_string()]);
    }
}
