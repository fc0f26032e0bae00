// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod config;
pub mod enrich;
pub mod model;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::config::CuratorConfig;
pub use crate::enrich::{BackfillEngine, DynSummarizer, MockSummarizer, NoopSummarizer, Summarizer};
pub use crate::model::{Candidate, ContentType, Entity, JobRunStatus, UpsertOutcome};
pub use crate::pipeline::upsert::UpsertEngine;
pub use crate::scheduler::Orchestrator;
pub use crate::sources::{SourceAdapter, SourceError};
pub use crate::store::memory::InMemoryStore;
pub use crate::store::schema::{EntitySchema, SchemaCapabilities, SchemaCatalog};
pub use crate::store::EntityStore;
