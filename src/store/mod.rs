// src/store/mod.rs
//! Persistence collaborator surface.
//!
//! The relational engine itself is an external collaborator; the pipeline
//! only depends on [`EntityStore`]. Every `insert`/`update`/`apply_summary`
//! call is its own commit: a failure on one item must never roll back items
//! persisted before or after it.

pub mod memory;
pub mod schema;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{ContentType, Entity, SummaryBundle};

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Look up one entity by its identity key.
    async fn get(&self, kind: ContentType, identity_key: &str) -> Result<Option<Entity>>;

    /// Insert a new entity. Fails on identity-key collision (unique key).
    async fn insert(&self, entity: Entity) -> Result<()>;

    /// Overwrite an existing entity, matched by identity key.
    async fn update(&self, entity: Entity) -> Result<()>;

    /// Most recent entities of one type from one source, newest first.
    /// Backs the news near-duplicate window; queried fresh per check.
    async fn recent_by_source(
        &self,
        kind: ContentType,
        source: &str,
        limit: usize,
    ) -> Result<Vec<Entity>>;

    /// Compound-key lookup for videos re-surfaced via different search
    /// entry points: channel + exact title + exact published timestamp.
    async fn find_video_observation(
        &self,
        channel: &str,
        title: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<Entity>>;

    /// Entities of one type still lacking a generated summary, oldest first.
    async fn missing_summary(&self, kind: ContentType, limit: usize) -> Result<Vec<Entity>>;

    /// Write a summary bundle back to one entity. Returns false when the
    /// entity is gone or already summarized (nothing written).
    async fn apply_summary(
        &self,
        kind: ContentType,
        identity_key: &str,
        bundle: &SummaryBundle,
    ) -> Result<bool>;

    async fn count(&self, kind: ContentType) -> Result<usize>;
}
