// src/classify/tables.rs
//! Built-in rule tables plus optional file loaders.
//!
//! The defaults below are what ships; deployments can replace any table with
//! a TOML or JSON file of the same shape (see [`load_table_from`]).

use std::path::Path;

use anyhow::{anyhow, Context, Result};

use super::{ClassificationRule, RuleTable};

fn rule(label: &str, priority: bool, categories: &[&str], keywords: &[&str]) -> ClassificationRule {
    ClassificationRule {
        label: label.to_string(),
        label_ko: None,
        categories: categories.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        priority,
    }
}

fn rule_ko(
    label: &str,
    label_ko: &str,
    categories: &[&str],
    keywords: &[&str],
) -> ClassificationRule {
    ClassificationRule {
        label_ko: Some(label_ko.to_string()),
        ..rule(label, false, categories, keywords)
    }
}

/// Paper topics. Priority rules first: their keyword sets are specific
/// enough to pre-empt the broad arXiv-category match.
pub fn paper_topics() -> RuleTable {
    RuleTable {
        default_label: "Other".to_string(),
        rules: vec![
            rule(
                "LLM",
                true,
                &[],
                &[
                    "language model",
                    "llm",
                    "gpt",
                    "instruction tuning",
                    "in-context learning",
                    "chain-of-thought",
                ],
            ),
            rule(
                "Multimodal",
                true,
                &[],
                &[
                    "multimodal",
                    "vision-language",
                    "text-to-image",
                    "text-to-video",
                    "image captioning",
                ],
            ),
            rule(
                "CV",
                false,
                &["cs.CV"],
                &["image", "segmentation", "object detection", "video understanding"],
            ),
            rule(
                "NLP",
                false,
                &["cs.CL"],
                &["translation", "question answering", "summarization", "parsing"],
            ),
            rule(
                "RL",
                false,
                &["cs.RO"],
                &["reinforcement learning", "policy gradient", "reward", "agent"],
            ),
            rule(
                "Speech",
                false,
                &["eess.AS", "cs.SD"],
                &["speech", "audio", "text-to-speech", "voice"],
            ),
            rule(
                "Efficiency",
                false,
                &[],
                &["quantization", "pruning", "distillation", "efficient inference"],
            ),
            rule(
                "ML Theory",
                false,
                &["cs.LG", "stat.ML"],
                &["generalization", "optimization", "convergence"],
            ),
        ],
    }
}

/// News topics, scored by keyword hits over title+body.
pub fn news_topics() -> RuleTable {
    RuleTable {
        default_label: "General".to_string(),
        rules: vec![
            rule(
                "Policy",
                false,
                &["policy", "regulation"],
                &[
                    "regulation",
                    "regulator",
                    "legislation",
                    "bill",
                    "ai act",
                    "executive order",
                    "compliance",
                    "governance",
                    "규제",
                    "법안",
                ],
            ),
            rule(
                "Funding",
                false,
                &["business"],
                &[
                    "funding",
                    "raises",
                    "series a",
                    "series b",
                    "valuation",
                    "investment",
                    "투자",
                ],
            ),
            rule(
                "Product",
                false,
                &["product"],
                &["launch", "launches", "release", "unveils", "rolls out", "출시"],
            ),
            rule(
                "Research",
                false,
                &["research"],
                &["paper", "study", "benchmark", "researchers", "breakthrough", "연구"],
            ),
            rule(
                "Industry",
                false,
                &["industry"],
                &["partnership", "acquisition", "hires", "lays off", "data center", "chip"],
            ),
        ],
    }
}

/// Model tasks, keyed primarily by the registry pipeline tag. Localized
/// labels feed the optional `task_ko` column when it exists.
pub fn model_tasks() -> RuleTable {
    RuleTable {
        default_label: "Other".to_string(),
        rules: vec![
            rule_ko(
                "Text Generation",
                "텍스트 생성",
                &["text-generation", "text2text-generation"],
                &["chat", "instruct", "gpt", "llama"],
            ),
            rule_ko(
                "Image Generation",
                "이미지 생성",
                &["text-to-image", "image-to-image", "unconditional-image-generation"],
                &["diffusion", "stable-diffusion", "flux"],
            ),
            rule_ko(
                "Speech Recognition",
                "음성 인식",
                &["automatic-speech-recognition"],
                &["whisper", "asr"],
            ),
            rule_ko(
                "Speech Synthesis",
                "음성 합성",
                &["text-to-speech"],
                &["tts", "voice"],
            ),
            rule_ko(
                "Embeddings",
                "임베딩",
                &["sentence-similarity", "feature-extraction"],
                &["embedding", "retrieval"],
            ),
            rule_ko(
                "Vision",
                "비전",
                &["image-classification", "object-detection", "image-segmentation"],
                &["detection", "segmentation", "yolo"],
            ),
            rule_ko(
                "Multimodal",
                "멀티모달",
                &["image-text-to-text", "visual-question-answering", "video-text-to-text"],
                &["vision-language", "vlm"],
            ),
            rule_ko(
                "Translation",
                "번역",
                &["translation"],
                &["translate", "nmt"],
            ),
        ],
    }
}

/// Load a rule table from a TOML or JSON file of the same shape as the
/// built-ins. Format is sniffed from the extension, with a cross-try
/// fallback.
pub fn load_table_from(path: &Path) -> Result<RuleTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading rule table from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if ext == "toml" {
        if let Ok(t) = toml::from_str::<RuleTable>(&content) {
            return Ok(t);
        }
    }
    if let Ok(t) = serde_json::from_str::<RuleTable>(&content) {
        return Ok(t);
    }
    if ext != "toml" {
        if let Ok(t) = toml::from_str::<RuleTable>(&content) {
            return Ok(t);
        }
    }
    Err(anyhow!("unsupported rule table format: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, classify_news, match_rule};

    #[test]
    fn builtin_paper_table_satisfies_required_examples() {
        let t = paper_topics();
        assert_eq!(
            classify(&t, "Large Language Model Scaling Laws", &["cs.CL".into()]),
            "LLM"
        );
        assert_eq!(
            classify(
                &t,
                "Image Segmentation with Vision Transformers",
                &["cs.CV".into()]
            ),
            "CV"
        );
    }

    #[test]
    fn regulation_heavy_news_classifies_as_policy() {
        let t = news_topics();
        let label = classify_news(
            &t,
            "Parliament passes sweeping AI regulation",
            "The legislation mirrors the AI Act and adds compliance deadlines for providers.",
        );
        assert_eq!(label, "Policy");
    }

    #[test]
    fn model_task_carries_localized_label() {
        let t = model_tasks();
        let rule = match_rule(&t, "Llama-3-8B-Instruct", &["text-generation".into()]).unwrap();
        assert_eq!(rule.label, "Text Generation");
        assert_eq!(rule.label_ko.as_deref(), Some("텍스트 생성"));
    }

    #[test]
    fn table_round_trips_through_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("rules.json");
        let json = r#"{
            "default_label": "Other",
            "rules": [
                {"label": "LLM", "priority": true, "keywords": ["language model"]}
            ]
        }"#;
        std::fs::write(&p, json).unwrap();
        let t = load_table_from(&p).unwrap();
        assert_eq!(t.rules.len(), 1);
        assert_eq!(classify(&t, "A Language Model Survey", &[]), "LLM");
    }
}
