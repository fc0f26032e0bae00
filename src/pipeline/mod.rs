// src/pipeline/mod.rs
//! Per-source collection: fetch → normalize → classify → upsert.
//!
//! Each item is persisted independently; a failure on one item is logged
//! and the loop continues with the next. Adapter-level failures propagate
//! to the orchestrator, which records them as the step's job status.

pub mod dedup;
pub mod normalize;
pub mod upsert;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::model::UpsertOutcome;
use crate::sources::SourceAdapter;
use crate::store::schema::{EntitySchema, SchemaCapabilities};
use self::upsert::UpsertEngine;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_records_total",
            "Raw records fetched from source adapters."
        );
        describe_counter!("curator_created_total", "Entities created by upsert.");
        describe_counter!("curator_updated_total", "Entities refreshed by upsert.");
        describe_counter!(
            "curator_duplicates_total",
            "News candidates skipped as near-duplicates."
        );
        describe_counter!(
            "curator_filtered_total",
            "Candidates rejected by the content filter or malformed."
        );
        describe_counter!(
            "curator_item_errors_total",
            "Per-item persistence failures (loop continued)."
        );
        describe_counter!("curator_feed_errors_total", "Broken news feeds skipped.");
        describe_counter!(
            "curator_rate_limited_total",
            "Source fetches aborted by rate limiting."
        );
        describe_histogram!("curator_collect_ms", "Wall time of one source collection.");
        describe_gauge!(
            "curator_last_collect_ts",
            "Unix ts when a source was last collected."
        );
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub malformed: usize,
    pub item_errors: usize,
}

/// Collect one source end to end. Returns per-run tallies; an adapter-level
/// fetch error aborts only this source.
pub async fn collect_source(
    adapter: &dyn SourceAdapter,
    engine: &UpsertEngine,
    probe: &SchemaCapabilities,
) -> anyhow::Result<CollectStats> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let records = match adapter.fetch_latest().await {
        Ok(records) => records,
        Err(e) => {
            if e.is_rate_limit() {
                counter!("curator_rate_limited_total", "source" => adapter.name()).increment(1);
            }
            return Err(e.into());
        }
    };
    let schema = EntitySchema::resolve(probe, adapter.content_type()).await;

    let mut stats = CollectStats {
        fetched: records.len(),
        ..Default::default()
    };
    counter!("curator_records_total", "source" => adapter.name())
        .increment(records.len() as u64);

    for raw in &records {
        let candidate = match normalize::normalize(adapter.content_type(), adapter.name(), raw) {
            Some(c) => c,
            None => {
                stats.malformed += 1;
                counter!("curator_filtered_total", "source" => adapter.name()).increment(1);
                continue;
            }
        };
        let key = candidate.identity_key.clone();
        match engine.upsert(candidate, &schema).await {
            Ok(UpsertOutcome::Created) => {
                stats.created += 1;
                counter!("curator_created_total", "source" => adapter.name()).increment(1);
            }
            Ok(UpsertOutcome::Updated) => {
                stats.updated += 1;
                counter!("curator_updated_total", "source" => adapter.name()).increment(1);
            }
            Ok(UpsertOutcome::SkippedDuplicate) => {
                stats.duplicates += 1;
                counter!("curator_duplicates_total", "source" => adapter.name()).increment(1);
            }
            Ok(UpsertOutcome::Filtered) => {
                stats.filtered += 1;
                counter!("curator_filtered_total", "source" => adapter.name()).increment(1);
            }
            Err(e) => {
                // Item-level failure: this row's write is lost, the rest of
                // the batch is not.
                stats.item_errors += 1;
                counter!("curator_item_errors_total", "source" => adapter.name()).increment(1);
                tracing::warn!(error = ?e, source = adapter.name(), item = %key, "upsert failed; continuing");
            }
        }
    }

    histogram!("curator_collect_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    gauge!("curator_last_collect_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    tracing::info!(
        source = adapter.name(),
        fetched = stats.fetched,
        created = stats.created,
        updated = stats.updated,
        duplicates = stats.duplicates,
        filtered = stats.filtered + stats.malformed,
        errors = stats.item_errors,
        "source collected"
    );
    Ok(stats)
}
