// src/pipeline/normalize.rs
//! Per-source normalization: raw JSON records in native field names become
//! [`Candidate`] entities. Malformed records (no identity key, empty title)
//! normalize to `None` and are counted, not errored.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::model::{Candidate, ContentType, Stats, TypeFields};

/// Clean free text: decode HTML entities, strip tags, normalize curly
/// quotes, collapse whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

    let mut out = html_escape::decode_html_entities(s).to_string();
    out = RE_TAGS.replace_all(&out, "").to_string();
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    out = RE_WS.replace_all(&out, " ").trim().to_string();
    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }
    out
}

/// Dispatch to the per-type normalizer.
pub fn normalize(kind: ContentType, adapter_name: &str, raw: &Value) -> Option<Candidate> {
    match kind {
        ContentType::Model => normalize_model(adapter_name, raw),
        ContentType::Video => normalize_video(adapter_name, raw),
        ContentType::Paper => normalize_paper(adapter_name, raw),
        ContentType::News => normalize_news(raw),
        ContentType::Repo => normalize_repo(adapter_name, raw),
        // URL-keyed types have no registry adapter; they arrive pre-shaped.
        _ => normalize_generic(kind, adapter_name, raw),
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

fn u64_field(raw: &Value, key: &str) -> Option<u64> {
    raw.get(key).and_then(Value::as_u64)
}

fn str_list(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_model(adapter_name: &str, raw: &Value) -> Option<Candidate> {
    let id = str_field(raw, "modelId").or_else(|| str_field(raw, "id"))?;
    if id.trim().is_empty() {
        return None;
    }
    Some(Candidate {
        content_type: ContentType::Model,
        identity_key: id.to_string(),
        title: id.to_string(),
        source: adapter_name.to_string(),
        url: Some(format!("https://huggingface.co/{id}")),
        stats: Stats {
            downloads: u64_field(raw, "downloads"),
            likes: u64_field(raw, "likes"),
            ..Default::default()
        },
        fields: TypeFields::Model {
            pipeline_tag: str_field(raw, "pipeline_tag").unwrap_or_default().to_string(),
            task_ko: None,
            library: str_field(raw, "library_name").map(str::to_string),
        },
    })
}

fn normalize_video(adapter_name: &str, raw: &Value) -> Option<Candidate> {
    let id = raw
        .get("id")
        .and_then(|id| id.get("videoId"))
        .and_then(Value::as_str)
        .or_else(|| str_field(raw, "id"))?;
    let snippet = raw.get("snippet")?;
    let title = clean_text(snippet.get("title").and_then(Value::as_str)?);
    if title.is_empty() {
        return None;
    }
    let published_at = snippet
        .get("publishedAt")
        .and_then(Value::as_str)
        .and_then(parse_rfc3339)?;
    Some(Candidate {
        content_type: ContentType::Video,
        identity_key: id.to_string(),
        title,
        source: adapter_name.to_string(),
        url: Some(format!("https://www.youtube.com/watch?v={id}")),
        stats: Stats {
            views: raw
                .get("statistics")
                .and_then(|s| s.get("viewCount"))
                .and_then(Value::as_str)
                .and_then(|v| v.parse().ok()),
            ..Default::default()
        },
        fields: TypeFields::Video {
            channel: snippet
                .get("channelTitle")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            channel_language: None,
            published_at,
            body: clean_text(
                snippet
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            ),
        },
    })
}

fn normalize_paper(adapter_name: &str, raw: &Value) -> Option<Candidate> {
    let id_url = str_field(raw, "id")?;
    let identity_key = arxiv_id_from_url(id_url);
    if identity_key.is_empty() {
        return None;
    }
    let title = clean_text(str_field(raw, "title")?);
    if title.is_empty() {
        return None;
    }
    Some(Candidate {
        content_type: ContentType::Paper,
        identity_key,
        title,
        source: adapter_name.to_string(),
        url: Some(id_url.to_string()),
        stats: Stats::default(),
        fields: TypeFields::Paper {
            abstract_text: clean_text(str_field(raw, "summary").unwrap_or_default()),
            categories: str_list(raw, "categories"),
            conference_name: None,
            conference_year: None,
        },
    })
}

fn normalize_news(raw: &Value) -> Option<Candidate> {
    let url = str_field(raw, "link")?;
    if url.trim().is_empty() {
        return None;
    }
    let title = clean_text(str_field(raw, "title")?);
    if title.is_empty() {
        return None;
    }
    Some(Candidate {
        content_type: ContentType::News,
        identity_key: url.to_string(),
        title,
        source: str_field(raw, "feed").unwrap_or("unknown").to_string(),
        url: Some(url.to_string()),
        stats: Stats::default(),
        fields: TypeFields::News {
            body: clean_text(str_field(raw, "description").unwrap_or_default()),
            tags: str_list(raw, "categories"),
        },
    })
}

fn normalize_repo(adapter_name: &str, raw: &Value) -> Option<Candidate> {
    let full_name = str_field(raw, "full_name")?;
    if full_name.trim().is_empty() {
        return None;
    }
    Some(Candidate {
        content_type: ContentType::Repo,
        identity_key: full_name.to_string(),
        title: full_name.to_string(),
        source: adapter_name.to_string(),
        url: str_field(raw, "html_url")
            .map(str::to_string)
            .or_else(|| Some(format!("https://github.com/{full_name}"))),
        stats: Stats {
            stars: u64_field(raw, "stargazers_count"),
            forks: u64_field(raw, "forks_count"),
            ..Default::default()
        },
        fields: TypeFields::Repo {
            full_name: full_name.to_string(),
            language: str_field(raw, "language").map(str::to_string),
            description: clean_text(str_field(raw, "description").unwrap_or_default()),
        },
    })
}

fn normalize_generic(kind: ContentType, adapter_name: &str, raw: &Value) -> Option<Candidate> {
    let url = str_field(raw, "url").or_else(|| str_field(raw, "link"))?;
    let title = clean_text(str_field(raw, "title")?);
    if title.is_empty() {
        return None;
    }
    Some(Candidate {
        content_type: kind,
        identity_key: url.to_string(),
        title,
        source: adapter_name.to_string(),
        url: Some(url.to_string()),
        stats: Stats::default(),
        fields: TypeFields::Generic,
    })
}

/// "http://arxiv.org/abs/2401.00001v2" -> "2401.00001"
fn arxiv_id_from_url(url: &str) -> String {
    static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"v\d+$").expect("version regex"));
    let tail = url.rsplit('/').next().unwrap_or(url);
    RE_VERSION.replace(tail.trim(), "").to_string()
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
