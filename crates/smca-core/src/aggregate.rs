//! Result aggregation.
//!
//! [`aggregate`] packs the outputs of all analysis stages into one
//! [`AggregateResult`]. It never fails: each missing output is replaced by
//! its stage-specific safe default, and non-finite floats (which JSON cannot
//! carry) are replaced by `0.0`. The function is pure; the caller supplies
//! the timestamp.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use smca_core::aggregate::{aggregate, StageOutputs};
//!
//! let result = aggregate("hello", StageOutputs::default(), Utc::now());
//! assert_eq!(result.category.label(), "unknown");
//! assert!(result.best_keyword.is_none());
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{
    AggregateResult, AiDetection, CategoryResult, Keyword, ResultMetadata, ScoreMap,
    SentimentResult, PIPELINE_VERSION,
};

/// Outputs collected from the analysis stages. `None` means the stage
/// produced nothing (failed or was skipped).
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    pub category: Option<CategoryResult>,
    pub readability: Option<ScoreMap>,
    pub sentiment: Option<SentimentResult>,
    pub emotion: Option<ScoreMap>,
    pub keywords: Option<Vec<Keyword>>,
    pub ai_detection: Option<AiDetection>,
    pub coherence: Option<f64>,
    pub hashtags: Option<Vec<String>>,
    pub engagement: Option<f64>,
}

/// Build the final report from the extracted text and stage outputs.
pub fn aggregate(text: &str, outputs: StageOutputs, timestamp: DateTime<Utc>) -> AggregateResult {
    let mut category = outputs.category.unwrap_or_default();
    category.1 = finite_or_zero(category.1);

    let keywords: Vec<Keyword> = outputs
        .keywords
        .unwrap_or_default()
        .into_iter()
        .map(|k| Keyword::new(k.keyword, finite_or_zero(k.score)))
        .collect();
    let best = best_keyword(&keywords).cloned();

    let mut sentiment = outputs.sentiment.unwrap_or_default();
    sentiment.confidence = sentiment.confidence.map(finite_or_zero);

    let mut ai_detection = outputs.ai_detection.unwrap_or_default();
    ai_detection.ai_generated_probability =
        ai_detection.ai_generated_probability.map(finite_or_zero);

    AggregateResult {
        metadata: ResultMetadata {
            timestamp,
            pipeline_version: PIPELINE_VERSION.to_string(),
        },
        extracted_text: text.to_string(),
        category,
        readability_analysis: sanitize_scores(outputs.readability.unwrap_or_default()),
        sentiment_analysis: sentiment,
        emotion_detection: sanitize_scores(outputs.emotion.unwrap_or_default()),
        extracted_keywords: keywords,
        best_keyword: best,
        ai_text_detection: ai_detection,
        coherence_score: finite_or_zero(outputs.coherence.unwrap_or(0.0)),
        hashtag_suggestions: outputs.hashtags.unwrap_or_default(),
        engagement_score: finite_or_zero(outputs.engagement.unwrap_or(0.0)),
    }
}

/// The keyword with the highest score, or `None` for an empty list.
///
/// Scores are compared with [`f64::total_cmp`]; on ties the earliest entry
/// wins.
pub fn best_keyword(keywords: &[Keyword]) -> Option<&Keyword> {
    keywords.iter().fold(None, |best, k| match best {
        Some(b) if k.score.total_cmp(&b.score) != Ordering::Greater => Some(b),
        _ => Some(k),
    })
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn sanitize_scores(mut scores: ScoreMap) -> ScoreMap {
    for v in scores.values_mut() {
        *v = finite_or_zero(*v);
    }
    scores
}
