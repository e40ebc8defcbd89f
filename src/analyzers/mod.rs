//! Analyzer abstraction and backend selection.
//!
//! Each pipeline stage after extraction delegates to one analyzer trait.
//! Analyzers are independent black boxes: they may be slow, they may fail,
//! and the pipeline isolates both. Two backends exist:
//!
//! - **builtin** ([`builtin`]): offline heuristics from `smca-core`; no
//!   network, deterministic.
//! - **huggingface** ([`huggingface`]): hosted inference for sentiment,
//!   emotion, zero-shot category, and AI-text detection. The remaining
//!   stages stay builtin.
//!
//! Hashtag suggestions always come from [`HashtagService`], which keeps its
//! own cache and offline data.
//!
//! # Example
//!
//! ```rust
//! use smca::analyzers::create_analyzers;
//! use smca::config::Config;
//!
//! let analyzers = create_analyzers(&Config::default()).unwrap();
//! # let _ = analyzers;
//! ```

pub mod builtin;
pub mod huggingface;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::hashtags::HashtagService;
use crate::models::{AiDetection, CategoryResult, Keyword, ScoreMap, SentimentResult};

/// Assigns the text a topical category label with a confidence score.
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<CategoryResult>;
}

/// Computes readability metrics keyed by metric name.
#[async_trait]
pub trait ReadabilityAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<ScoreMap>;
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SentimentResult>;
}

/// Scores the text against a set of emotions.
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<ScoreMap>;
}

/// Extracts up to `max_keywords` key phrases, best first.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, text: &str, max_keywords: usize) -> Result<Vec<Keyword>>;
}

#[async_trait]
pub trait AiTextDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<AiDetection>;
}

/// Scores how well consecutive paragraphs relate, in `[0, 1]`.
#[async_trait]
pub trait CoherenceScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<f64>;
}

/// Suggests hashtags for a category and/or keyword. Either may be empty.
#[async_trait]
pub trait HashtagProvider: Send + Sync {
    async fn get_hashtags(&self, category: &str, keyword: &str) -> Result<Vec<String>>;
}

/// Predicts an engagement score in `[0, 100]` from earlier stage outputs.
#[async_trait]
pub trait EngagementPredictor: Send + Sync {
    async fn predict(
        &self,
        sentiment_confidence: f64,
        word_count: usize,
        emotions: &ScoreMap,
    ) -> Result<f64>;
}

/// The full set of analyzers a pipeline run uses, one per stage.
///
/// Cheap to clone; every analyzer is shared behind an `Arc`.
#[derive(Clone)]
pub struct Analyzers {
    pub category: Arc<dyn CategoryClassifier>,
    pub readability: Arc<dyn ReadabilityAnalyzer>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub emotion: Arc<dyn EmotionDetector>,
    pub keywords: Arc<dyn KeywordExtractor>,
    pub ai_detector: Arc<dyn AiTextDetector>,
    pub coherence: Arc<dyn CoherenceScorer>,
    pub hashtags: Arc<dyn HashtagProvider>,
    pub engagement: Arc<dyn EngagementPredictor>,
}

impl Analyzers {
    /// All-builtin analyzers with the given hashtag provider.
    pub fn builtin(category_labels: Vec<String>, hashtags: Arc<dyn HashtagProvider>) -> Self {
        Self {
            category: Arc::new(builtin::LexiconCategoryClassifier::new(category_labels)),
            readability: Arc::new(builtin::Readability),
            sentiment: Arc::new(builtin::LexiconSentiment),
            emotion: Arc::new(builtin::LexiconEmotion),
            keywords: Arc::new(builtin::RakeKeywords),
            ai_detector: Arc::new(builtin::StylometricAiDetector),
            coherence: Arc::new(builtin::ParagraphCoherence),
            hashtags,
            engagement: Arc::new(builtin::WeightedEngagement),
        }
    }
}

/// Build the analyzer bundle for the configured backend.
///
/// # Errors
///
/// Returns an error for unknown backends or if the hosted backend cannot
/// be initialised (e.g. missing API token).
pub fn create_analyzers(config: &Config) -> Result<Analyzers> {
    let hashtags: Arc<dyn HashtagProvider> = Arc::new(HashtagService::new(&config.hashtags)?);
    let mut analyzers = Analyzers::builtin(config.analyzers.category_labels.clone(), hashtags);

    match config.analyzers.backend.as_str() {
        "builtin" => {}
        "huggingface" => {
            let client = Arc::new(huggingface::InferenceClient::new(&config.analyzers)?);
            analyzers.category = Arc::new(huggingface::ZeroShotCategory::new(
                client.clone(),
                &config.analyzers,
            ));
            analyzers.sentiment = Arc::new(huggingface::HfSentiment::new(
                client.clone(),
                &config.analyzers.sentiment_model,
            ));
            analyzers.emotion = Arc::new(huggingface::HfEmotion::new(
                client.clone(),
                &config.analyzers.emotion_model,
            ));
            analyzers.ai_detector = Arc::new(huggingface::HfAiDetector::new(
                client,
                &config.analyzers.ai_detector_model,
            ));
        }
        other => bail!("Unknown analyzer backend: {}", other),
    }

    tracing::info!(backend = %config.analyzers.backend, "analyzers ready");
    Ok(analyzers)
}
