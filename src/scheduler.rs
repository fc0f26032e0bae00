// src/scheduler.rs
//! Job orchestrator: one interval-triggered "collect all" job plus manual
//! triggers, both entering the same code path.
//!
//! Sources are collected in a fixed sequence with a small delay between
//! steps so one source's rate limiting does not bleed into another's. Every
//! step catches and records its own failure; a dead source never prevents
//! the remaining steps from running. After the sources, a backfill step runs
//! per summarizable type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::config::CuratorConfig;
use crate::enrich::{BackfillEngine, DynSummarizer};
use crate::model::{ContentType, JobOutcome, JobRunStatus};
use crate::pipeline::{self, upsert::UpsertEngine};
use crate::sources::SourceAdapter;
use crate::store::schema::{SchemaCapabilities, SchemaCatalog};
use crate::store::EntityStore;

pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    engine: UpsertEngine,
    probe: SchemaCapabilities,
    backfill: BackfillEngine,
    interval: Duration,
    inter_source_delay: Duration,
    backfill_limit: usize,
    statuses: Mutex<HashMap<String, JobRunStatus>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        catalog: Arc<dyn SchemaCatalog>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        summarizer: DynSummarizer,
        cfg: CuratorConfig,
    ) -> Self {
        let mut statuses = HashMap::new();
        for adapter in &adapters {
            let (id, name) = collect_job(adapter.name());
            statuses.insert(id.clone(), JobRunStatus::never_ran(&id, &name));
        }
        for kind in ContentType::ALL.iter().filter(|k| k.summarizable()) {
            let (id, name) = backfill_job(*kind);
            statuses.insert(id.clone(), JobRunStatus::never_ran(&id, &name));
        }

        Self {
            adapters,
            engine: UpsertEngine::new(store.clone(), cfg.clone()),
            probe: SchemaCapabilities::new(catalog),
            backfill: BackfillEngine::new(store, summarizer, cfg.backfill_delay_ms),
            interval: Duration::from_secs(cfg.collect_interval_secs),
            inter_source_delay: Duration::from_millis(cfg.inter_source_delay_ms),
            backfill_limit: cfg.backfill_limit,
            statuses: Mutex::new(statuses),
        }
    }

    /// One full run: every source step, then every backfill step, strictly
    /// sequential. Scheduled and manual triggers both land here.
    pub async fn run_collect_all(&self) {
        for (i, adapter) in self.adapters.iter().enumerate() {
            if i > 0 && !self.inter_source_delay.is_zero() {
                tokio::time::sleep(self.inter_source_delay).await;
            }
            let (id, name) = collect_job(adapter.name());
            let result = pipeline::collect_source(adapter.as_ref(), &self.engine, &self.probe)
                .await
                .map(|stats| {
                    format!(
                        "created {}, updated {}, skipped {}",
                        stats.created,
                        stats.updated,
                        stats.duplicates + stats.filtered
                    )
                });
            self.record(&id, &name, result);
        }

        for kind in ContentType::ALL.iter().filter(|k| k.summarizable()) {
            let (id, name) = backfill_job(*kind);
            let result = self
                .backfill
                .backfill(*kind, self.backfill_limit)
                .await
                .map(|n| format!("summarized {n}"));
            self.record(&id, &name, result);
        }
    }

    /// Manual trigger: identical semantics to the scheduled run.
    pub async fn trigger_now(&self) {
        tracing::info!("manual collect-all trigger");
        self.run_collect_all().await;
    }

    /// Long-lived scheduler task. The first run starts immediately.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.run_collect_all().await;
            }
        })
    }

    pub fn job_status(&self, job_id: &str) -> Option<JobRunStatus> {
        self.statuses
            .lock()
            .expect("status map poisoned")
            .get(job_id)
            .cloned()
    }

    /// All known jobs, sorted by id for a stable listing.
    pub fn list_jobs(&self) -> Vec<JobRunStatus> {
        let mut jobs: Vec<JobRunStatus> = self
            .statuses
            .lock()
            .expect("status map poisoned")
            .values()
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        jobs
    }

    fn record(&self, job_id: &str, name: &str, result: anyhow::Result<String>) {
        let now = Utc::now();
        let next_run =
            now + chrono::Duration::from_std(self.interval).unwrap_or_else(|_| chrono::Duration::zero());
        let status = match result {
            Ok(detail) => {
                tracing::info!(job = job_id, %detail, "job step succeeded");
                JobRunStatus {
                    job_id: job_id.to_string(),
                    name: name.to_string(),
                    last_run: Some(now),
                    last_status: JobOutcome::Success,
                    last_error: None,
                    next_run: Some(next_run),
                }
            }
            Err(e) => {
                tracing::warn!(job = job_id, error = ?e, "job step failed");
                JobRunStatus {
                    job_id: job_id.to_string(),
                    name: name.to_string(),
                    last_run: Some(now),
                    last_status: JobOutcome::Error,
                    last_error: Some(e.to_string()),
                    next_run: Some(next_run),
                }
            }
        };
        self.statuses
            .lock()
            .expect("status map poisoned")
            .insert(job_id.to_string(), status);
    }
}

fn collect_job(adapter_name: &str) -> (String, String) {
    (
        format!("collect_{adapter_name}"),
        format!("Collect {adapter_name}"),
    )
}

fn backfill_job(kind: ContentType) -> (String, String) {
    (
        format!("backfill_{kind}"),
        format!("Backfill {kind} summaries"),
    )
}
