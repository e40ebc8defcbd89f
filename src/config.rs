use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analyzers: AnalyzersConfig,
    #[serde(default)]
    pub hashtags: HashtagsConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Seconds an upload may wait for its stream before it is deleted;
    /// `0` keeps unclaimed uploads until shutdown.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_file_size_mb: default_max_file_size_mb(),
            pending_ttl_secs: default_pending_ttl_secs(),
        }
    }
}

impl UploadsConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_max_file_size_mb() -> u64 {
    10
}
fn default_pending_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,
    /// Per-stage deadline in seconds; `0` disables it.
    #[serde(default)]
    pub stage_timeout_secs: u64,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keyword_limit: default_keyword_limit(),
            stage_timeout_secs: 0,
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_keyword_limit() -> usize {
    10
}
fn default_event_buffer() -> usize {
    32
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyzersConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_sentiment_model")]
    pub sentiment_model: String,
    #[serde(default = "default_emotion_model")]
    pub emotion_model: String,
    #[serde(default = "default_category_model")]
    pub category_model: String,
    #[serde(default = "default_ai_detector_model")]
    pub ai_detector_model: String,
    #[serde(default = "default_category_labels")]
    pub category_labels: Vec<String>,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: default_endpoint(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            sentiment_model: default_sentiment_model(),
            emotion_model: default_emotion_model(),
            category_model: default_category_model(),
            ai_detector_model: default_ai_detector_model(),
            category_labels: default_category_labels(),
        }
    }
}

fn default_backend() -> String {
    "builtin".to_string()
}
fn default_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}
fn default_token_env() -> String {
    "HF_API_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_sentiment_model() -> String {
    "distilbert-base-uncased-finetuned-sst-2-english".to_string()
}
fn default_emotion_model() -> String {
    "nateraw/bert-base-uncased-emotion".to_string()
}
fn default_category_model() -> String {
    "facebook/bart-large-mnli".to_string()
}
fn default_ai_detector_model() -> String {
    "roberta-base-openai-detector".to_string()
}
fn default_category_labels() -> Vec<String> {
    [
        "Technology",
        "Education",
        "Marketing",
        "Health",
        "Finance",
        "Entertainment",
        "Sports",
        "Politics",
        "Environment",
        "Travel",
        "Food",
        "Business",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashtagsConfig {
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_refresh_days")]
    pub refresh_days: i64,
    #[serde(default = "default_scrape")]
    pub scrape: bool,
    #[serde(default = "default_scrape_timeout_secs")]
    pub scrape_timeout_secs: u64,
}

impl Default for HashtagsConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            data_path: default_data_path(),
            refresh_days: default_refresh_days(),
            scrape: default_scrape(),
            scrape_timeout_secs: default_scrape_timeout_secs(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/hashtags_cache.json")
}
fn default_data_path() -> PathBuf {
    PathBuf::from("./data/hashtags_data.json")
}
fn default_refresh_days() -> i64 {
    7
}
fn default_scrape() -> bool {
    true
}
fn default_scrape_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,
    #[serde(default = "default_languages")]
    pub languages: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_bin: default_tesseract_bin(),
            languages: default_languages(),
        }
    }
}

fn default_tesseract_bin() -> String {
    "tesseract".to_string()
}
fn default_languages() -> String {
    "eng".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.uploads.max_file_size_mb == 0 {
        anyhow::bail!("uploads.max_file_size_mb must be > 0");
    }

    if config.pipeline.keyword_limit == 0 {
        anyhow::bail!("pipeline.keyword_limit must be >= 1");
    }
    if config.pipeline.event_buffer == 0 {
        anyhow::bail!("pipeline.event_buffer must be >= 1");
    }

    if config.hashtags.refresh_days < 1 {
        anyhow::bail!("hashtags.refresh_days must be >= 1");
    }

    if config.analyzers.category_labels.is_empty() {
        anyhow::bail!("analyzers.category_labels must not be empty");
    }

    match config.analyzers.backend.as_str() {
        "builtin" | "huggingface" => {}
        other => anyhow::bail!(
            "Unknown analyzer backend: '{}'. Must be builtin or huggingface.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.pipeline.keyword_limit, 10);
        assert_eq!(config.uploads.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.uploads.pending_ttl_secs, 3600);
        assert_eq!(config.hashtags.refresh_days, 7);
    }

    #[test]
    fn rejects_unknown_backend() {
        let config: Config = toml::from_str("[analyzers]\nbackend = \"gpt\"").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown analyzer backend"));
    }

    #[test]
    fn rejects_zero_keyword_limit() {
        let config: Config = toml::from_str("[pipeline]\nkeyword_limit = 0").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn huge_upload_limit_saturates() {
        let config: Config =
            toml::from_str(&format!("[uploads]\nmax_file_size_mb = {}", u64::MAX)).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.uploads.max_file_size_bytes(), u64::MAX);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_or_default(Path::new("/nonexistent/smca.toml")).unwrap();
        assert_eq!(config.uploads.max_file_size_mb, 10);
    }
}
