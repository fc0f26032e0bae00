// src/store/memory.rs
//! In-memory store used by tests and local runs.
//!
//! Keeps insertion order per table so `recent_by_source` can answer the
//! dedup window query. Also implements [`SchemaCatalog`] with a mutable
//! column set, so tests can simulate pre-migration schemas and catalog
//! outages.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{ContentType, Entity, SummaryBundle, TypeFields};
use crate::store::schema::SchemaCatalog;
use crate::store::EntityStore;

pub struct InMemoryStore {
    tables: Mutex<HashMap<ContentType, Vec<Entity>>>,
    /// Optional columns NOT present in the simulated schema.
    missing_columns: Mutex<HashSet<(String, String)>>,
    /// When set, `column_exists` fails, as a broken catalog would.
    catalog_down: AtomicBool,
    catalog_calls: AtomicUsize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Fully migrated schema: every optional column present.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            missing_columns: Mutex::new(HashSet::new()),
            catalog_down: AtomicBool::new(false),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    /// Pre-migration schema: none of the optional columns exist yet.
    pub fn with_legacy_schema() -> Self {
        let store = Self::new();
        {
            let mut missing = store.missing_columns.lock().expect("columns poisoned");
            for kind in ContentType::ALL {
                missing.insert((kind.table().to_string(), "is_archived".to_string()));
                missing.insert((kind.table().to_string(), "archived_at".to_string()));
            }
            for col in ["topic", "conference_name", "conference_year"] {
                missing.insert(("papers".to_string(), col.to_string()));
            }
            missing.insert(("models".to_string(), "task_ko".to_string()));
            missing.insert(("videos".to_string(), "channel_language".to_string()));
        }
        store
    }

    pub fn set_column_present(&self, table: &str, column: &str, present: bool) {
        let key = (table.to_string(), column.to_string());
        let mut missing = self.missing_columns.lock().expect("columns poisoned");
        if present {
            missing.remove(&key);
        } else {
            missing.insert(key);
        }
    }

    pub fn set_catalog_down(&self, down: bool) {
        self.catalog_down.store(down, Ordering::SeqCst);
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    /// Full table snapshot, insertion order. Test helper.
    pub fn snapshot(&self, kind: ContentType) -> Vec<Entity> {
        self.tables
            .lock()
            .expect("tables poisoned")
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get(&self, kind: ContentType, identity_key: &str) -> Result<Option<Entity>> {
        let tables = self.tables.lock().expect("tables poisoned");
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|e| e.identity_key == identity_key))
            .cloned())
    }

    async fn insert(&self, entity: Entity) -> Result<()> {
        let mut tables = self.tables.lock().expect("tables poisoned");
        let rows = tables.entry(entity.content_type).or_default();
        if rows.iter().any(|e| e.identity_key == entity.identity_key) {
            bail!(
                "unique violation: {} '{}' already exists",
                entity.content_type,
                entity.identity_key
            );
        }
        rows.push(entity);
        Ok(())
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        let mut tables = self.tables.lock().expect("tables poisoned");
        let rows = tables.entry(entity.content_type).or_default();
        match rows.iter_mut().find(|e| e.identity_key == entity.identity_key) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => bail!(
                "update of missing {} '{}'",
                entity.content_type,
                entity.identity_key
            ),
        }
    }

    async fn recent_by_source(
        &self,
        kind: ContentType,
        source: &str,
        limit: usize,
    ) -> Result<Vec<Entity>> {
        let tables = self.tables.lock().expect("tables poisoned");
        let rows = match tables.get(&kind) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        Ok(rows
            .iter()
            .rev()
            .filter(|e| e.source == source)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_video_observation(
        &self,
        channel: &str,
        title: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<Entity>> {
        let tables = self.tables.lock().expect("tables poisoned");
        let rows = match tables.get(&ContentType::Video) {
            Some(rows) => rows,
            None => return Ok(None),
        };
        Ok(rows
            .iter()
            .find(|e| {
                e.title == title
                    && matches!(
                        &e.fields,
                        TypeFields::Video { channel: c, published_at: p, .. }
                            if c == channel && *p == published_at
                    )
            })
            .cloned())
    }

    async fn missing_summary(&self, kind: ContentType, limit: usize) -> Result<Vec<Entity>> {
        let tables = self.tables.lock().expect("tables poisoned");
        let rows = match tables.get(&kind) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        Ok(rows
            .iter()
            .filter(|e| !e.has_summary() && !e.archived)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn apply_summary(
        &self,
        kind: ContentType,
        identity_key: &str,
        bundle: &SummaryBundle,
    ) -> Result<bool> {
        let mut tables = self.tables.lock().expect("tables poisoned");
        let rows = tables.entry(kind).or_default();
        match rows.iter_mut().find(|e| e.identity_key == identity_key) {
            Some(e) if !e.has_summary() => {
                e.summary = Some(bundle.clone());
                e.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count(&self, kind: ContentType) -> Result<usize> {
        let tables = self.tables.lock().expect("tables poisoned");
        Ok(tables.get(&kind).map_or(0, Vec::len))
    }
}

#[async_trait]
impl SchemaCatalog for InMemoryStore {
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if self.catalog_down.load(Ordering::SeqCst) {
            bail!("schema catalog unavailable");
        }
        let missing = self.missing_columns.lock().expect("columns poisoned");
        Ok(!missing.contains(&(table.to_string(), column.to_string())))
    }
}
