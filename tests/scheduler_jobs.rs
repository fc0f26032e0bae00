// tests/scheduler_jobs.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ai_signal_curator::enrich::MockSummarizer;
use ai_signal_curator::model::{ContentType, JobOutcome, SummaryBundle};
use ai_signal_curator::scheduler::Orchestrator;
use ai_signal_curator::sources::{arxiv::ArxivAdapter, SourceAdapter, SourceError};
use ai_signal_curator::store::memory::InMemoryStore;
use ai_signal_curator::store::EntityStore;
use ai_signal_curator::CuratorConfig;

struct FailingAdapter;

#[async_trait]
impl SourceAdapter for FailingAdapter {
    fn name(&self) -> &'static str {
        "deadsource"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Repo
    }

    async fn fetch_latest(&self) -> Result<Vec<Value>, SourceError> {
        Err(SourceError::RateLimited {
            adapter: "deadsource",
        })
    }
}

fn test_cfg() -> CuratorConfig {
    CuratorConfig {
        inter_source_delay_ms: 0,
        backfill_delay_ms: 0,
        ..Default::default()
    }
}

fn orchestrator(store: Arc<InMemoryStore>) -> Arc<Orchestrator> {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(FailingAdapter),
        Arc::new(ArxivAdapter::from_fixture_str(include_str!(
            "fixtures/arxiv_feed.xml"
        ))),
    ];
    let summarizer = Arc::new(MockSummarizer {
        fixed: SummaryBundle {
            summary: "A short generated summary.".to_string(),
            keywords: vec!["ai".to_string()],
            highlights: vec![],
        },
    });
    Arc::new(Orchestrator::new(
        store.clone(),
        store,
        adapters,
        summarizer,
        test_cfg(),
    ))
}

#[tokio::test]
async fn failing_step_records_error_and_later_steps_still_run() {
    let store = Arc::new(InMemoryStore::new());
    let orch = orchestrator(store.clone());

    orch.run_collect_all().await;

    let dead = orch.job_status("collect_deadsource").unwrap();
    assert_eq!(dead.last_status, JobOutcome::Error);
    assert!(dead.last_error.unwrap().contains("rate limited"));
    assert!(dead.last_run.is_some());
    assert!(dead.next_run.is_some());

    // The arxiv step after the failure still ran and succeeded.
    let arxiv = orch.job_status("collect_arxiv").unwrap();
    assert_eq!(arxiv.last_status, JobOutcome::Success);
    assert_eq!(store.count(ContentType::Paper).await.unwrap(), 3);
}

#[tokio::test]
async fn backfill_steps_run_after_sources() {
    let store = Arc::new(InMemoryStore::new());
    let orch = orchestrator(store.clone());

    orch.run_collect_all().await;

    let backfill = orch.job_status("backfill_paper").unwrap();
    assert_eq!(backfill.last_status, JobOutcome::Success);
    for paper in store.snapshot(ContentType::Paper) {
        assert!(paper.has_summary());
    }
}

#[tokio::test]
async fn jobs_are_listed_before_any_run() {
    let store = Arc::new(InMemoryStore::new());
    let orch = orchestrator(store);

    let jobs = orch.list_jobs();
    // 2 collect steps + 5 summarizable backfill steps.
    assert_eq!(jobs.len(), 7);
    assert!(jobs.iter().all(|j| j.last_status == JobOutcome::NeverRan));
    assert!(jobs.iter().any(|j| j.job_id == "collect_deadsource"));
    assert!(jobs.iter().any(|j| j.job_id == "backfill_video"));

    // Sorted by id for a stable listing.
    let ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn manual_trigger_reuses_the_scheduled_code_path() {
    let store = Arc::new(InMemoryStore::new());
    let orch = orchestrator(store.clone());

    orch.run_collect_all().await;
    let after_scheduled = store.count(ContentType::Paper).await.unwrap();

    orch.trigger_now().await;
    // Same semantics: the re-run updates rather than duplicates.
    assert_eq!(
        store.count(ContentType::Paper).await.unwrap(),
        after_scheduled
    );
    let arxiv = orch.job_status("collect_arxiv").unwrap();
    assert_eq!(arxiv.last_status, JobOutcome::Success);
}
