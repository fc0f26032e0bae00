// tests/news_dedup.rs
use std::sync::Arc;

use ai_signal_curator::model::{Candidate, ContentType, Stats, TypeFields, UpsertOutcome};
use ai_signal_curator::pipeline::{self, upsert::UpsertEngine};
use ai_signal_curator::sources::news_rss::NewsRssAdapter;
use ai_signal_curator::store::memory::InMemoryStore;
use ai_signal_curator::store::schema::{EntitySchema, SchemaCapabilities};
use ai_signal_curator::store::EntityStore;
use ai_signal_curator::CuratorConfig;

fn test_cfg() -> CuratorConfig {
    CuratorConfig {
        inter_source_delay_ms: 0,
        backfill_delay_ms: 0,
        ..Default::default()
    }
}

fn article(url: &str, title: &str, body: &str) -> Candidate {
    Candidate {
        content_type: ContentType::News,
        identity_key: url.to_string(),
        title: title.to_string(),
        source: "AI Wire".to_string(),
        url: Some(url.to_string()),
        stats: Stats::default(),
        fields: TypeFields::News {
            body: body.to_string(),
            tags: vec![],
        },
    }
}

#[tokio::test]
async fn feed_run_filters_dedups_and_classifies() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let probe = SchemaCapabilities::new(store.clone());
    let adapter = NewsRssAdapter::from_fixtures(vec![(
        "AI Wire".to_string(),
        include_str!("fixtures/news_feed.xml").to_string(),
    )]);

    let stats = pipeline::collect_source(&adapter, &engine, &probe)
        .await
        .unwrap();
    assert_eq!(stats.fetched, 4);
    // The "[Update]" re-run of the same story is a near-duplicate; the
    // bakery item fails the AI keyword filter.
    assert_eq!(stats.created, 2);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.filtered, 1);

    let rows = store.snapshot(ContentType::News);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].label, "Product");
    assert_eq!(rows[1].label, "Policy");
}

#[tokio::test]
async fn similar_title_from_same_source_is_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let schema = EntitySchema {
        topic: true,
        ..Default::default()
    };

    let first = article(
        "https://e.com/1",
        "Anthropic releases new AI safety framework",
        "The framework covers model evaluations.",
    );
    assert_eq!(
        engine.upsert(first, &schema).await.unwrap(),
        UpsertOutcome::Created
    );

    // Same story, bracketed tag and punctuation differences only.
    let dup = article(
        "https://e.com/2",
        "[Breaking] Anthropic releases new AI safety framework!",
        "Coverage of the same announcement.",
    );
    assert_eq!(
        engine.upsert(dup, &schema).await.unwrap(),
        UpsertOutcome::SkippedDuplicate
    );

    // A genuinely different AI story goes in.
    let other = article(
        "https://e.com/3",
        "Chipmaker doubles down on AI accelerators",
        "New datacenter line announced.",
    );
    assert_eq!(
        engine.upsert(other, &schema).await.unwrap(),
        UpsertOutcome::Created
    );
    assert_eq!(store.count(ContentType::News).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicates_from_a_different_source_are_kept() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let schema = EntitySchema::default();

    let a = article(
        "https://e.com/1",
        "OpenAI unveils new language model",
        "Announcement.",
    );
    engine.upsert(a, &schema).await.unwrap();

    // The window is scoped per source.
    let mut b = article(
        "https://other.com/1",
        "OpenAI unveils new language model",
        "Announcement.",
    );
    b.source = "Other Wire".to_string();
    assert_eq!(
        engine.upsert(b, &schema).await.unwrap(),
        UpsertOutcome::Created
    );
    assert_eq!(store.count(ContentType::News).await.unwrap(), 2);
}

#[tokio::test]
async fn non_ai_article_is_rejected_before_any_dedup() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let schema = EntitySchema::default();

    let off_topic = article(
        "https://e.com/sports",
        "Midfielder signs record transfer deal",
        "A quiet day in football otherwise.",
    );
    assert_eq!(
        engine.upsert(off_topic, &schema).await.unwrap(),
        UpsertOutcome::Filtered
    );
    assert_eq!(store.count(ContentType::News).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_allowlist_disables_the_filter() {
    let store = Arc::new(InMemoryStore::new());
    let cfg = CuratorConfig {
        news_keyword_allowlist: vec![],
        ..test_cfg()
    };
    let engine = UpsertEngine::new(store.clone(), cfg);
    let schema = EntitySchema::default();

    let off_topic = article(
        "https://e.com/sports",
        "Midfielder signs record transfer deal",
        "A quiet day in football otherwise.",
    );
    assert_eq!(
        engine.upsert(off_topic, &schema).await.unwrap(),
        UpsertOutcome::Created
    );
}
