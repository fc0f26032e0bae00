// src/pipeline/upsert.rs
//! Identity-key upsert with per-type dedup rules.
//!
//! Identity-keyed types (models, papers, repos, URL-keyed types) look up by
//! identity key and either refresh volatile fields or classify-and-insert.
//! News additionally passes a keyword content filter and a near-duplicate
//! title check against recent same-source articles. Videos check a compound
//! key (channel + exact title + exact published timestamp) before the
//! identity-key lookup, to catch re-submissions surfaced via different
//! search entry points.
//!
//! Writes to optional columns go through the resolved [`EntitySchema`].

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::classify::{self, tables, RuleTable};
use crate::config::CuratorConfig;
use crate::model::{Candidate, ContentType, Entity, TypeFields, UpsertOutcome};
use crate::pipeline::dedup::is_near_duplicate;
use crate::store::schema::EntitySchema;
use crate::store::EntityStore;

pub struct UpsertEngine {
    store: Arc<dyn EntityStore>,
    paper_rules: RuleTable,
    news_rules: RuleTable,
    task_rules: RuleTable,
    cfg: CuratorConfig,
}

impl UpsertEngine {
    /// Rule tables come from the configured files when set, otherwise the
    /// built-ins. A table that fails to load falls back to its built-in.
    pub fn new(store: Arc<dyn EntityStore>, cfg: CuratorConfig) -> Self {
        let paper_rules = table_or_builtin(cfg.paper_rules_path.as_deref(), tables::paper_topics);
        let news_rules = table_or_builtin(cfg.news_rules_path.as_deref(), tables::news_topics);
        let task_rules =
            table_or_builtin(cfg.model_task_rules_path.as_deref(), tables::model_tasks);
        Self::with_rules(store, cfg, paper_rules, news_rules, task_rules)
    }

    pub fn with_rules(
        store: Arc<dyn EntityStore>,
        cfg: CuratorConfig,
        paper_rules: RuleTable,
        news_rules: RuleTable,
        task_rules: RuleTable,
    ) -> Self {
        Self {
            store,
            paper_rules,
            news_rules,
            task_rules,
            cfg,
        }
    }

    /// Push one normalized candidate through filter → dedup → insert/update.
    pub async fn upsert(
        &self,
        candidate: Candidate,
        schema: &EntitySchema,
    ) -> Result<UpsertOutcome> {
        if candidate.content_type == ContentType::News {
            if !self.news_passes_filter(&candidate) {
                return Ok(UpsertOutcome::Filtered);
            }
            let recent = self
                .store
                .recent_by_source(
                    ContentType::News,
                    &candidate.source,
                    self.cfg.news_dedup_window,
                )
                .await?;
            if is_near_duplicate(
                &candidate.title,
                recent.iter().map(|e| e.title.as_str()),
                self.cfg.news_similarity_threshold,
            ) {
                return Ok(UpsertOutcome::SkippedDuplicate);
            }
        }

        if let TypeFields::Video {
            channel,
            published_at,
            ..
        } = &candidate.fields
        {
            if let Some(existing) = self
                .store
                .find_video_observation(channel, &candidate.title, *published_at)
                .await?
            {
                return self.refresh(existing, candidate, schema).await;
            }
        }

        match self
            .store
            .get(candidate.content_type, &candidate.identity_key)
            .await?
        {
            Some(existing) => self.refresh(existing, candidate, schema).await,
            None => self.insert_new(candidate, schema).await,
        }
    }

    /// Keyword allow-list over title + body + tags. An empty list disables
    /// the filter. Runs before any duplicate check.
    fn news_passes_filter(&self, candidate: &Candidate) -> bool {
        if self.cfg.news_keyword_allowlist.is_empty() {
            return true;
        }
        let mut haystack = format!("{} {}", candidate.title, candidate.body_text());
        if let TypeFields::News { tags, .. } = &candidate.fields {
            for tag in tags {
                haystack.push(' ');
                haystack.push_str(tag);
            }
        }
        let haystack = haystack.to_lowercase();
        self.cfg
            .news_keyword_allowlist
            .iter()
            .any(|k| haystack.contains(k.to_lowercase().as_str()))
    }

    /// Refresh an existing row in place: volatile stats, trending flag,
    /// archive clear, latest text. Identity key, created-at, label and
    /// summary are untouched.
    async fn refresh(
        &self,
        existing: Entity,
        candidate: Candidate,
        schema: &EntitySchema,
    ) -> Result<UpsertOutcome> {
        let now = Utc::now();
        let trending = popularity(&candidate).saturating_sub(popularity_of(&existing))
            >= self.cfg.trending_delta;

        let mut updated = Entity {
            title: candidate.title,
            url: candidate.url.or(existing.url.clone()),
            stats: candidate.stats,
            trending,
            collected_at: now,
            updated_at: now,
            fields: merge_fields(&existing.fields, candidate.fields, schema),
            ..existing
        };
        if schema.archive_columns {
            updated.archived = false;
            updated.archived_at = None;
        }
        self.store.update(updated).await?;
        Ok(UpsertOutcome::Updated)
    }

    async fn insert_new(
        &self,
        mut candidate: Candidate,
        schema: &EntitySchema,
    ) -> Result<UpsertOutcome> {
        let label = match candidate.content_type {
            ContentType::Paper => {
                let l = classify::classify(&self.paper_rules, &candidate.title, &candidate.hints());
                if schema.topic {
                    l
                } else {
                    String::new()
                }
            }
            // News topic is a regular column, not migration-gated.
            ContentType::News => {
                classify::classify_news(&self.news_rules, &candidate.title, candidate.body_text())
            }
            ContentType::Model => {
                let matched =
                    classify::match_rule(&self.task_rules, &candidate.title, &candidate.hints());
                if let TypeFields::Model { task_ko, .. } = &mut candidate.fields {
                    *task_ko = matched
                        .and_then(|r| r.label_ko.clone())
                        .filter(|_| schema.task_ko);
                }
                matched
                    .map(|r| r.label.clone())
                    .unwrap_or_else(|| self.task_rules.default_label.clone())
            }
            _ => String::new(),
        };

        let now = Utc::now();
        let entity = Entity {
            content_type: candidate.content_type,
            identity_key: candidate.identity_key,
            title: candidate.title,
            source: candidate.source,
            url: candidate.url,
            label,
            stats: candidate.stats,
            summary: None,
            trending: false,
            featured: false,
            archived: false,
            collected_at: now,
            created_at: now,
            updated_at: now,
            archived_at: None,
            fields: candidate.fields,
        };
        self.store.insert(entity).await?;
        Ok(UpsertOutcome::Created)
    }
}

/// Single popularity figure used for the trending delta: stars for repos,
/// downloads for models, views for videos.
fn popularity(c: &Candidate) -> u64 {
    c.stats
        .stars
        .or(c.stats.downloads)
        .or(c.stats.views)
        .unwrap_or(0)
}

fn table_or_builtin(path: Option<&str>, builtin: fn() -> RuleTable) -> RuleTable {
    let Some(p) = path else {
        return builtin();
    };
    match tables::load_table_from(std::path::Path::new(p)) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = ?e, path = p, "rule table load failed; using built-in table");
            builtin()
        }
    }
}

fn popularity_of(e: &Entity) -> u64 {
    e.stats
        .stars
        .or(e.stats.downloads)
        .or(e.stats.views)
        .unwrap_or(0)
}

/// Carry stored optional-column values forward when the fresh observation
/// has none, dropping them where the schema lacks the column.
fn merge_fields(old: &TypeFields, new: TypeFields, schema: &EntitySchema) -> TypeFields {
    match (old, new) {
        (
            TypeFields::Model {
                task_ko: old_ko, ..
            },
            TypeFields::Model {
                pipeline_tag,
                task_ko,
                library,
            },
        ) => TypeFields::Model {
            pipeline_tag,
            task_ko: task_ko.or_else(|| old_ko.clone()).filter(|_| schema.task_ko),
            library,
        },
        (
            TypeFields::Video {
                channel_language: old_lang,
                ..
            },
            TypeFields::Video {
                channel,
                channel_language,
                published_at,
                body,
            },
        ) => TypeFields::Video {
            channel,
            channel_language: channel_language
                .or_else(|| old_lang.clone())
                .filter(|_| schema.channel_language),
            published_at,
            body,
        },
        (
            TypeFields::Paper {
                conference_name: old_name,
                conference_year: old_year,
                ..
            },
            TypeFields::Paper {
                abstract_text,
                categories,
                conference_name,
                conference_year,
            },
        ) => TypeFields::Paper {
            abstract_text,
            categories,
            conference_name: conference_name
                .or_else(|| old_name.clone())
                .filter(|_| schema.conference_columns),
            conference_year: conference_year
                .or(*old_year)
                .filter(|_| schema.conference_columns),
        },
        (_, new) => new,
    }
}
