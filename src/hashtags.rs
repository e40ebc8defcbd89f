//! Hashtag suggestions with a file-backed cache.
//!
//! Lookup order for `get_hashtags(category, keyword)`:
//!
//! 1. A cache entry for `(category, keyword)` younger than `refresh_days`.
//! 2. When a keyword is given and scraping is enabled, the tag box on
//!    `best-hashtags.com/hashtag/<keyword>/`.
//! 3. The offline data file, matched with fuzzy category/keyword lookup.
//!
//! Whatever is found is written back to the cache. Both files are JSON:
//!
//! ```text
//! data:  { "<category>": { "<keyword>": ["#tag", ...] } }
//! cache: { "<category>": { "<keyword>": { "last_updated": "...", "hashtags": [...] } } }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::analyzers::HashtagProvider;
use crate::config::HashtagsConfig;

const DEFAULT_CATEGORY_KEY: &str = "default_category";
const DEFAULT_KEYWORD_KEY: &str = "default_keyword";
/// Minimum normalised similarity for a fuzzy category/keyword match.
const MATCH_CUTOFF: f64 = 0.6;
const SCRAPE_BASE_URL: &str = "https://best-hashtags.com/hashtag";
const TAG_BOX_SELECTOR: &str = "div.tag-box.tag-box-v3.margin-bottom-40";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Keyword aliases folded into a broader topic before lookup.
const KEYWORD_ALIASES: &[(&str, &str)] = &[
    ("ai", "technology"),
    ("machine learning", "technology"),
    ("ml", "technology"),
    ("fitness", "health"),
    ("gym", "health"),
    ("yoga", "health"),
    ("travel", "lifestyle"),
    ("food", "lifestyle"),
    ("fashion", "lifestyle"),
    ("startup", "business"),
    ("marketing", "business"),
    ("crypto", "finance"),
    ("stocks", "finance"),
];

type HashtagData = BTreeMap<String, BTreeMap<String, Vec<String>>>;
type HashtagCache = BTreeMap<String, BTreeMap<String, CacheEntry>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    last_updated: DateTime<Utc>,
    hashtags: Vec<String>,
}

pub struct HashtagService {
    cache_path: PathBuf,
    data_path: PathBuf,
    refresh: chrono::Duration,
    scrape: bool,
    http: reqwest::Client,
    tag_pattern: Regex,
    /// Serialises read-modify-write cycles on the cache file.
    cache_lock: Mutex<()>,
}

impl HashtagService {
    pub fn new(config: &HashtagsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.scrape_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            cache_path: config.cache_path.clone(),
            data_path: config.data_path.clone(),
            refresh: chrono::Duration::days(config.refresh_days),
            scrape: config.scrape,
            http,
            tag_pattern: Regex::new(r"#\w+")?,
            cache_lock: Mutex::new(()),
        })
    }

    /// Suggest hashtags for a category and/or keyword.
    ///
    /// Returns an empty list when neither is given. Cache and data file
    /// errors propagate; a failed scrape falls back to offline data.
    pub async fn get_hashtags(&self, category: &str, keyword: &str) -> Result<Vec<String>> {
        let category = category.trim().to_lowercase();
        let keyword = normalize_keyword(keyword);
        if category.is_empty() && keyword.is_empty() {
            return Ok(Vec::new());
        }

        let cat_key = non_empty_or(&category, DEFAULT_CATEGORY_KEY);
        let kw_key = non_empty_or(&keyword, DEFAULT_KEYWORD_KEY);

        let _guard = self.cache_lock.lock().await;
        let mut cache: HashtagCache = read_json_or_default(&self.cache_path).await?;
        let now = Utc::now();

        if let Some(entry) = cache.get(cat_key).and_then(|c| c.get(kw_key)) {
            if now - entry.last_updated < self.refresh {
                tracing::debug!(category = cat_key, keyword = kw_key, "hashtag cache hit");
                return Ok(entry.hashtags.clone());
            }
        }

        let mut hashtags = Vec::new();
        if !keyword.is_empty() && self.scrape {
            match self.scrape_hashtags(&keyword).await {
                Ok(tags) => hashtags = tags,
                Err(e) => tracing::warn!(keyword = %keyword, error = %e, "hashtag scrape failed"),
            }
        }
        if hashtags.is_empty() {
            let data: HashtagData = read_json_or_default(&self.data_path).await?;
            hashtags = lookup_offline(&data, &category, &keyword);
        }

        cache.entry(cat_key.to_string()).or_default().insert(
            kw_key.to_string(),
            CacheEntry {
                last_updated: now,
                hashtags: hashtags.clone(),
            },
        );
        write_json(&self.cache_path, &cache).await?;

        Ok(hashtags)
    }

    async fn scrape_hashtags(&self, keyword: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}/", SCRAPE_BASE_URL, keyword.replace(' ', ""));
        let response = self
            .http
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("GET {} returned {}", url, status));
        }
        let html = response.text().await?;
        let tags = parse_tag_box(&html, &self.tag_pattern)?;
        tracing::debug!(keyword, count = tags.len(), "scraped hashtags");
        Ok(tags)
    }
}

#[async_trait]
impl HashtagProvider for HashtagService {
    async fn get_hashtags(&self, category: &str, keyword: &str) -> Result<Vec<String>> {
        HashtagService::get_hashtags(self, category, keyword).await
    }
}

fn normalize_keyword(keyword: &str) -> String {
    let kw = keyword.trim().to_lowercase();
    KEYWORD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == kw)
        .map(|(_, topic)| topic.to_string())
        .unwrap_or(kw)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Pull hashtags out of the tag box. If the box holds bare words, each word
/// becomes a tag.
fn parse_tag_box(html: &str, tag_pattern: &Regex) -> Result<Vec<String>> {
    let selector = scraper::Selector::parse(TAG_BOX_SELECTOR)
        .map_err(|e| anyhow!("invalid selector: {:?}", e))?;
    let document = scraper::Html::parse_document(html);
    let Some(tag_box) = document.select(&selector).next() else {
        return Ok(Vec::new());
    };

    let text = tag_box
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let tags: Vec<String> = tag_pattern
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    if !tags.is_empty() {
        return Ok(tags);
    }
    Ok(text
        .split_whitespace()
        .map(|w| {
            if w.starts_with('#') {
                w.to_string()
            } else {
                format!("#{}", w)
            }
        })
        .collect())
}

/// Closest option by normalised Levenshtein similarity, if any reaches the
/// cutoff. Ties go to the earlier option.
fn closest_match<'a>(target: &str, options: impl IntoIterator<Item = &'a String>) -> Option<&'a String> {
    let mut best: Option<(&String, f64)> = None;
    for option in options {
        let similarity = strsim::normalized_levenshtein(target, option);
        if similarity < MATCH_CUTOFF {
            continue;
        }
        match best {
            Some((_, s)) if similarity <= s => {}
            _ => best = Some((option, similarity)),
        }
    }
    best.map(|(option, _)| option)
}

fn find_key<'a, V>(map: &'a BTreeMap<String, V>, target: &str) -> Option<&'a String> {
    map.get_key_value(target)
        .map(|(k, _)| k)
        .or_else(|| closest_match(target, map.keys()))
}

/// Offline lookup.
///
/// - A matched category with no keyword yields every unique tag in it.
/// - A matched category with a keyword yields that keyword's tags, or
///   nothing if the keyword has no match in the category.
/// - A keyword alone is searched across categories in order.
fn lookup_offline(data: &HashtagData, category: &str, keyword: &str) -> Vec<String> {
    let matched_category = if category.is_empty() {
        None
    } else {
        find_key(data, category)
    };

    if let Some(cat) = matched_category {
        let keywords = &data[cat];
        if keyword.is_empty() {
            let mut seen = HashSet::new();
            return keywords
                .values()
                .flatten()
                .filter(|tag| seen.insert(tag.as_str()))
                .cloned()
                .collect();
        }
        return find_key(keywords, keyword)
            .map(|kw| keywords[kw].clone())
            .unwrap_or_default();
    }

    if !keyword.is_empty() {
        for keywords in data.values() {
            if let Some(kw) = find_key(keywords, keyword) {
                return keywords[kw].clone();
            }
        }
    }

    tracing::debug!(category, keyword, "no offline hashtag match");
    Vec::new()
}

async fn read_json_or_default<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> HashtagData {
        serde_json::from_value(serde_json::json!({
            "technology": {
                "software": ["#code", "#dev"],
                "gadgets": ["#tech", "#code"]
            },
            "health": {
                "workout": ["#fit", "#gains"]
            }
        }))
        .unwrap()
    }

    fn service(dir: &Path) -> HashtagService {
        let config = HashtagsConfig {
            cache_path: dir.join("cache/hashtags_cache.json"),
            data_path: dir.join("hashtags_data.json"),
            scrape: false,
            ..Default::default()
        };
        HashtagService::new(&config).unwrap()
    }

    #[test]
    fn aliases_fold_into_topics() {
        assert_eq!(normalize_keyword("  Gym "), "health");
        assert_eq!(normalize_keyword("Machine Learning"), "technology");
        assert_eq!(normalize_keyword("rust"), "rust");
    }

    #[test]
    fn category_only_returns_unique_tags() {
        let tags = lookup_offline(&sample_data(), "technology", "");
        assert_eq!(tags, vec!["#tech", "#code", "#dev"]);
    }

    #[test]
    fn fuzzy_category_and_keyword() {
        let tags = lookup_offline(&sample_data(), "tecnology", "softwares");
        assert_eq!(tags, vec!["#code", "#dev"]);
    }

    #[test]
    fn unmatched_keyword_in_matched_category_is_empty() {
        assert!(lookup_offline(&sample_data(), "health", "astronomy").is_empty());
    }

    #[test]
    fn keyword_only_searches_all_categories() {
        let tags = lookup_offline(&sample_data(), "", "workout");
        assert_eq!(tags, vec!["#fit", "#gains"]);
    }

    #[test]
    fn unknown_category_is_empty() {
        assert!(lookup_offline(&sample_data(), "astronomy", "").is_empty());
    }

    #[test]
    fn parses_tag_box() {
        let pattern = Regex::new(r"#\w+").unwrap();
        let html = r#"<html><body>
            <div class="tag-box tag-box-v3 margin-bottom-40"><p>#rust #rustlang #programming</p></div>
        </body></html>"#;
        assert_eq!(
            parse_tag_box(html, &pattern).unwrap(),
            vec!["#rust", "#rustlang", "#programming"]
        );
        assert!(parse_tag_box("<html></html>", &pattern).unwrap().is_empty());
    }

    #[tokio::test]
    async fn neither_category_nor_keyword_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        assert!(svc.get_hashtags("  ", "").await.unwrap().is_empty());
        assert!(!dir.path().join("cache/hashtags_cache.json").exists());
    }

    #[tokio::test]
    async fn results_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("hashtags_data.json");
        std::fs::write(&data_path, serde_json::to_vec(&sample_data()).unwrap()).unwrap();
        let svc = service(dir.path());

        let first = svc.get_hashtags("Health", "").await.unwrap();
        assert_eq!(first, vec!["#fit", "#gains"]);

        std::fs::remove_file(&data_path).unwrap();
        let second = svc.get_hashtags("health", "").await.unwrap();
        assert_eq!(second, first);

        let cache: HashtagCache = serde_json::from_slice(
            &std::fs::read(dir.path().join("cache/hashtags_cache.json")).unwrap(),
        )
        .unwrap();
        assert!(cache["health"].contains_key(DEFAULT_KEYWORD_KEY));
    }

    #[tokio::test]
    async fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache/hashtags_cache.json"), "{not json").unwrap();
        let svc = service(dir.path());
        assert!(svc.get_hashtags("health", "").await.is_err());
    }
}
