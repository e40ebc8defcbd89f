//! Core data models for an analysis run.
//!
//! Every stage result type implements [`Default`], and the default value is
//! the stage's safe default: the value substituted when the stage fails.
//! Serialization follows the report schema consumed by the dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version tag written into every report's metadata.
pub const PIPELINE_VERSION: &str = "1.0";

/// Label used when category classification is unavailable.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// A progress notification: `{"step": "...", "progress": N}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: String,
    pub progress: u8,
}

impl ProgressEvent {
    pub fn new(step: impl Into<String>, progress: u8) -> Self {
        Self {
            step: step.into(),
            progress: progress.min(100),
        }
    }
}

/// Top category label and its score, serialized as `[label, score]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult(pub String, pub f64);

impl CategoryResult {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self(label.into(), score)
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    pub fn score(&self) -> f64 {
        self.1
    }
}

impl Default for CategoryResult {
    fn default() -> Self {
        Self(UNKNOWN_CATEGORY.to_string(), 0.0)
    }
}

/// Metric name → score (readability) or emotion name → score.
pub type ScoreMap = BTreeMap<String, f64>;

/// Sentiment label and confidence. The default serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SentimentResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            sentiment: Some(label.into()),
            confidence: Some(confidence),
        }
    }

    /// Confidence, or `0.0` when sentiment analysis produced nothing.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.sentiment.is_none() && self.confidence.is_none()
    }
}

/// One ranked keyword phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub score: f64,
}

impl Keyword {
    pub fn new(keyword: impl Into<String>, score: f64) -> Self {
        Self {
            keyword: keyword.into(),
            score,
        }
    }
}

/// AI-generated text probability. The default serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiDetection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_generated_probability: Option<f64>,
}

impl AiDetection {
    pub fn new(probability: f64) -> Self {
        Self {
            ai_generated_probability: Some(probability),
        }
    }
}

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub timestamp: DateTime<Utc>,
    pub pipeline_version: String,
}

/// The final report of one run. Every stage field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub metadata: ResultMetadata,
    pub extracted_text: String,
    pub category: CategoryResult,
    pub readability_analysis: ScoreMap,
    pub sentiment_analysis: SentimentResult,
    pub emotion_detection: ScoreMap,
    pub extracted_keywords: Vec<Keyword>,
    /// `null` when no keywords were extracted.
    pub best_keyword: Option<Keyword>,
    pub ai_text_detection: AiDetection,
    pub coherence_score: f64,
    pub hashtag_suggestions: Vec<String>,
    pub engagement_score: f64,
}
