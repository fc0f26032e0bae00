// src/store/schema.rs
//! Schema capability probe.
//!
//! The pipeline must run correctly both before and after a rolling migration
//! adds optional columns (archive flags, paper topic/conference columns,
//! localized model task, video channel language). Instead of branching on an
//! application version flag, it asks the live schema catalog whether a
//! column exists, once per (table, column) pair for the process lifetime.
//!
//! A failed catalog query is NOT cached: a transient hiccup must not
//! permanently disable a feature. Callers fail closed for that call.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::model::ContentType;

/// Live schema catalog, provided by the store implementation.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;
}

/// Memoized (table, column) presence map over a [`SchemaCatalog`].
pub struct SchemaCapabilities {
    catalog: Arc<dyn SchemaCatalog>,
    cache: Mutex<HashMap<(String, String), bool>>,
}

impl SchemaCapabilities {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// First call per (table, column) queries the catalog; later calls are
    /// cache hits. Catalog errors propagate without touching the cache.
    pub async fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let key = (table.to_string(), column.to_string());
        if let Some(&hit) = self.cache.lock().expect("schema cache poisoned").get(&key) {
            return Ok(hit);
        }
        let present = self.catalog.column_exists(table, column).await?;
        self.cache
            .lock()
            .expect("schema cache poisoned")
            .insert(key, present);
        Ok(present)
    }

    pub async fn has_columns(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<BTreeMap<String, bool>> {
        let mut out = BTreeMap::new();
        for col in columns {
            out.insert(col.to_string(), self.has_column(table, col).await?);
        }
        Ok(out)
    }

    /// Test-only cache reset (e.g. after a simulated migration).
    pub fn reset(&self) {
        self.cache.lock().expect("schema cache poisoned").clear();
    }
}

/// Typed per-content-type descriptor of which optional columns exist,
/// resolved once per collection run instead of per-field introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySchema {
    pub archive_columns: bool,
    pub topic: bool,
    pub conference_columns: bool,
    pub task_ko: bool,
    pub channel_language: bool,
}

impl EntitySchema {
    /// Resolve the descriptor for one content type. A probe error resolves
    /// every optional column absent for this call (fail closed) and is
    /// logged, not propagated.
    pub async fn resolve(probe: &SchemaCapabilities, kind: ContentType) -> Self {
        let table = kind.table();
        let mut schema = EntitySchema::default();

        schema.archive_columns = probe_or_absent(probe, table, "is_archived").await
            && probe_or_absent(probe, table, "archived_at").await;

        match kind {
            ContentType::Paper => {
                schema.topic = probe_or_absent(probe, table, "topic").await;
                schema.conference_columns = probe_or_absent(probe, table, "conference_name").await
                    && probe_or_absent(probe, table, "conference_year").await;
            }
            ContentType::Model => {
                schema.task_ko = probe_or_absent(probe, table, "task_ko").await;
            }
            ContentType::Video => {
                schema.channel_language = probe_or_absent(probe, table, "channel_language").await;
            }
            _ => {}
        }
        schema
    }
}

async fn probe_or_absent(probe: &SchemaCapabilities, table: &str, column: &str) -> bool {
    match probe.has_column(table, column).await {
        Ok(present) => present,
        Err(e) => {
            tracing::warn!(error = ?e, table, column, "schema probe failed; assuming column absent");
            false
        }
    }
}
