// src/config.rs
//! Runtime configuration for the collection pipeline.
//!
//! Loaded from TOML with env overrides:
//! 1) $CURATOR_CONFIG_PATH (must exist if set)
//! 2) config/curator.toml
//! 3) built-in defaults
//!
//! Scalar knobs can additionally be overridden per-field via env vars
//! (CURATOR_COLLECT_INTERVAL_SECS etc.), which is what deployments tune.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "CURATOR_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/curator.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// Interval between scheduled "collect all" runs.
    pub collect_interval_secs: u64,
    /// Pause between per-source steps inside one collect-all run.
    pub inter_source_delay_ms: u64,
    /// Pause between summarization calls in a backfill batch.
    pub backfill_delay_ms: u64,
    /// Max entities per type enriched in one backfill pass.
    pub backfill_limit: usize,
    /// Normalized-title similarity at or above this marks a news duplicate.
    pub news_similarity_threshold: f64,
    /// How many recent same-source articles the dedup check scans.
    pub news_dedup_window: usize,
    /// Articles whose title+body+tags hit none of these keywords are dropped
    /// before dedup or classification. Empty list disables the filter.
    pub news_keyword_allowlist: Vec<String>,
    /// Star delta on refresh that flips the trending flag for repos/models.
    pub trending_delta: u64,
    /// Bind address for the control surface.
    pub listen_addr: String,
    /// Optional TOML/JSON rule-table files replacing the built-in tables.
    pub paper_rules_path: Option<String>,
    pub news_rules_path: Option<String>,
    pub model_task_rules_path: Option<String>,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            collect_interval_secs: 6 * 3600,
            inter_source_delay_ms: 2_000,
            backfill_delay_ms: 1_000,
            backfill_limit: 20,
            news_similarity_threshold: 0.88,
            news_dedup_window: 80,
            news_keyword_allowlist: default_news_allowlist(),
            trending_delta: 50,
            listen_addr: "0.0.0.0:8000".to_string(),
            paper_rules_path: None,
            news_rules_path: None,
            model_task_rules_path: None,
        }
    }
}

fn default_news_allowlist() -> Vec<String> {
    [
        "ai",
        "artificial intelligence",
        "machine learning",
        "deep learning",
        "llm",
        "language model",
        "neural",
        "gpt",
        "chatbot",
        "generative",
        "openai",
        "anthropic",
        "deepmind",
        "인공지능",
        "머신러닝",
        "딥러닝",
        "생성형",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl CuratorConfig {
    /// Load from an explicit TOML path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: CuratorConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks, then apply per-field env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            Self::from_path(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_PATH);
            if default.exists() {
                Self::from_path(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("CURATOR_COLLECT_INTERVAL_SECS") {
            self.collect_interval_secs = v;
        }
        if let Some(v) = env_parse("CURATOR_INTER_SOURCE_DELAY_MS") {
            self.inter_source_delay_ms = v;
        }
        if let Some(v) = env_parse("CURATOR_BACKFILL_DELAY_MS") {
            self.backfill_delay_ms = v;
        }
        if let Some(v) = env_parse("CURATOR_BACKFILL_LIMIT") {
            self.backfill_limit = v;
        }
        if let Some(v) = env_parse("CURATOR_NEWS_SIMILARITY_THRESHOLD") {
            self.news_similarity_threshold = v;
        }
        if let Some(v) = env_parse("CURATOR_NEWS_DEDUP_WINDOW") {
            self.news_dedup_window = v;
        }
        if let Ok(v) = std::env::var("CURATOR_LISTEN_ADDR") {
            if !v.trim().is_empty() {
                self.listen_addr = v;
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn defaults_are_sane() {
        let cfg = CuratorConfig::default();
        assert_eq!(cfg.news_similarity_threshold, 0.88);
        assert_eq!(cfg.news_dedup_window, 80);
        assert!(!cfg.news_keyword_allowlist.is_empty());
        assert!(cfg.paper_rules_path.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("curator.toml");
        fs::write(
            &p,
            "collect_interval_secs = 60\nbackfill_limit = 3\npaper_rules_path = \"rules/papers.toml\"\n",
        )
        .unwrap();
        let cfg = CuratorConfig::from_path(&p).unwrap();
        assert_eq!(cfg.collect_interval_secs, 60);
        assert_eq!(cfg.backfill_limit, 3);
        assert_eq!(cfg.news_dedup_window, 80);
        assert_eq!(cfg.paper_rules_path.as_deref(), Some("rules/papers.toml"));
    }

    #[serial_test::serial]
    #[test]
    fn env_path_has_priority_and_env_overrides_apply() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("c.toml");
        fs::write(&p, "collect_interval_secs = 120\n").unwrap();

        env::set_var(ENV_PATH, p.display().to_string());
        env::set_var("CURATOR_BACKFILL_DELAY_MS", "0");
        let cfg = CuratorConfig::load().unwrap();
        assert_eq!(cfg.collect_interval_secs, 120);
        assert_eq!(cfg.backfill_delay_ms, 0);
        env::remove_var(ENV_PATH);
        env::remove_var("CURATOR_BACKFILL_DELAY_MS");
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_path_is_an_error() {
        env::set_var(ENV_PATH, "/definitely/not/here.toml");
        assert!(CuratorConfig::load().is_err());
        env::remove_var(ENV_PATH);
    }
}
