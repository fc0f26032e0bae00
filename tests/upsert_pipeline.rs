// tests/upsert_pipeline.rs
use std::sync::Arc;

use ai_signal_curator::model::{Candidate, ContentType, Stats, TypeFields, UpsertOutcome};
use ai_signal_curator::pipeline::{self, upsert::UpsertEngine};
use ai_signal_curator::sources::arxiv::ArxivAdapter;
use ai_signal_curator::store::memory::InMemoryStore;
use ai_signal_curator::store::schema::{EntitySchema, SchemaCapabilities};
use ai_signal_curator::store::EntityStore;
use ai_signal_curator::CuratorConfig;
use chrono::{TimeZone, Utc};

fn test_cfg() -> CuratorConfig {
    CuratorConfig {
        inter_source_delay_ms: 0,
        backfill_delay_ms: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn running_the_same_feed_twice_creates_no_duplicates() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let probe = SchemaCapabilities::new(store.clone());
    let adapter = ArxivAdapter::from_fixture_str(include_str!("fixtures/arxiv_feed.xml"));

    let first = pipeline::collect_source(&adapter, &engine, &probe)
        .await
        .unwrap();
    assert_eq!(first.created, 3);
    assert_eq!(first.updated, 0);

    let second = pipeline::collect_source(&adapter, &engine, &probe)
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 3);

    assert_eq!(store.count(ContentType::Paper).await.unwrap(), 3);
    let keys: Vec<String> = store
        .snapshot(ContentType::Paper)
        .into_iter()
        .map(|e| e.identity_key)
        .collect();
    assert_eq!(keys, vec!["2402.10001", "2402.10002", "2402.10003"]);
}

#[tokio::test]
async fn papers_are_classified_on_insert() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let probe = SchemaCapabilities::new(store.clone());
    let adapter = ArxivAdapter::from_fixture_str(include_str!("fixtures/arxiv_feed.xml"));

    pipeline::collect_source(&adapter, &engine, &probe)
        .await
        .unwrap();

    let labels: Vec<(String, String)> = store
        .snapshot(ContentType::Paper)
        .into_iter()
        .map(|e| (e.identity_key, e.label))
        .collect();
    assert_eq!(labels[0], ("2402.10001".to_string(), "LLM".to_string()));
    assert_eq!(labels[1], ("2402.10002".to_string(), "CV".to_string()));
    assert_eq!(labels[2], ("2402.10003".to_string(), "Other".to_string()));
}

fn paper_candidate(key: &str, abstract_text: &str) -> Candidate {
    Candidate {
        content_type: ContentType::Paper,
        identity_key: key.to_string(),
        title: "Large Language Model Scaling Laws".to_string(),
        source: "arxiv".to_string(),
        url: None,
        stats: Stats::default(),
        fields: TypeFields::Paper {
            abstract_text: abstract_text.to_string(),
            categories: vec!["cs.CL".to_string()],
            conference_name: None,
            conference_year: None,
        },
    }
}

#[tokio::test]
async fn second_observation_of_same_key_updates_in_place() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let schema = EntitySchema {
        archive_columns: true,
        topic: true,
        conference_columns: true,
        ..Default::default()
    };

    let first = engine
        .upsert(paper_candidate("2402.99999", "First abstract."), &schema)
        .await
        .unwrap();
    assert_eq!(first, UpsertOutcome::Created);
    let created_at = store.snapshot(ContentType::Paper)[0].created_at;

    let second = engine
        .upsert(paper_candidate("2402.99999", "Second, revised abstract."), &schema)
        .await
        .unwrap();
    assert_eq!(second, UpsertOutcome::Updated);

    let rows = store.snapshot(ContentType::Paper);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.created_at, created_at);
    assert!(row.updated_at >= created_at);
    match &row.fields {
        TypeFields::Paper { abstract_text, .. } => {
            assert_eq!(abstract_text, "Second, revised abstract.")
        }
        other => panic!("unexpected fields: {other:?}"),
    }
}

#[tokio::test]
async fn configured_rule_table_file_replaces_the_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let rules = tmp.path().join("papers.toml");
    std::fs::write(
        &rules,
        r#"
default_label = "Misc"

[[rules]]
label = "Robotics"
priority = true
keywords = ["robot"]
"#,
    )
    .unwrap();

    let store = Arc::new(InMemoryStore::new());
    let cfg = CuratorConfig {
        paper_rules_path: Some(rules.display().to_string()),
        ..test_cfg()
    };
    let engine = UpsertEngine::new(store.clone(), cfg);
    let schema = EntitySchema {
        topic: true,
        ..Default::default()
    };

    let mut candidate = paper_candidate("2402.55555", "A survey.");
    candidate.title = "Robot Learning in the Wild".to_string();
    engine.upsert(candidate, &schema).await.unwrap();

    let mut other = paper_candidate("2402.55556", "Another survey.");
    other.title = "Large Language Model Scaling Laws".to_string();
    engine.upsert(other, &schema).await.unwrap();

    let labels: Vec<String> = store
        .snapshot(ContentType::Paper)
        .into_iter()
        .map(|e| e.label)
        .collect();
    // The file's table fully replaces the built-in, default label included.
    assert_eq!(labels, vec!["Robotics".to_string(), "Misc".to_string()]);
}

#[tokio::test]
async fn resubmitted_video_matches_on_compound_key() {
    let store = Arc::new(InMemoryStore::new());
    let engine = UpsertEngine::new(store.clone(), test_cfg());
    let schema = EntitySchema::default();
    let published = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();

    let video = |id: &str| Candidate {
        content_type: ContentType::Video,
        identity_key: id.to_string(),
        title: "Intro to Retrieval-Augmented Generation".to_string(),
        source: "youtube".to_string(),
        url: None,
        stats: Stats::default(),
        fields: TypeFields::Video {
            channel: "AI Channel".to_string(),
            channel_language: None,
            published_at: published,
            body: String::new(),
        },
    };

    assert_eq!(
        engine.upsert(video("vid-aaa111"), &schema).await.unwrap(),
        UpsertOutcome::Created
    );
    // Same upload surfaced under a different search entry point: compound
    // key (channel + title + published) catches it before identity lookup.
    assert_eq!(
        engine.upsert(video("vid-zzz999"), &schema).await.unwrap(),
        UpsertOutcome::Updated
    );
    assert_eq!(store.count(ContentType::Video).await.unwrap(), 1);
}
