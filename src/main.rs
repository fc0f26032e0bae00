// src/main.rs
//! Binary entrypoint: wires the store, adapters, summarizer and scheduler,
//! then serves the thin control surface.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_signal_curator::api::{self, AppState};
use ai_signal_curator::config::CuratorConfig;
use ai_signal_curator::enrich;
use ai_signal_curator::scheduler::Orchestrator;
use ai_signal_curator::sources::{
    arxiv::ArxivAdapter, github::GithubAdapter, huggingface::HuggingFaceAdapter,
    news_rss::{FeedSpec, NewsRssAdapter}, youtube::YoutubeAdapter, SourceAdapter,
};
use ai_signal_curator::store::memory::InMemoryStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_signal_curator=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn default_news_feeds() -> Vec<FeedSpec> {
    vec![
        FeedSpec {
            name: "VentureBeat AI".to_string(),
            url: "https://venturebeat.com/category/ai/feed/".to_string(),
        },
        FeedSpec {
            name: "MIT Tech Review".to_string(),
            url: "https://www.technologyreview.com/feed/".to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = CuratorConfig::load()?;
    let prometheus = PrometheusBuilder::new().install_recorder().ok();

    // The store is a collaborator; the in-memory implementation backs local
    // runs, a real deployment plugs its own EntityStore + SchemaCatalog.
    let store = Arc::new(InMemoryStore::new());
    let summarizer = enrich::build_summarizer();

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(HuggingFaceAdapter::new()),
        Arc::new(ArxivAdapter::new()),
        Arc::new(GithubAdapter::from_env()),
        Arc::new(YoutubeAdapter::from_env()),
        Arc::new(NewsRssAdapter::from_feeds(default_news_feeds())),
    ];

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        store.clone(),
        adapters,
        summarizer,
        cfg.clone(),
    ));
    orchestrator.clone().spawn();

    let state = AppState {
        orchestrator,
        store,
        prometheus,
    };
    let router = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!(addr = %cfg.listen_addr, "control surface listening");
    axum::serve(listener, router).await?;
    Ok(())
}
