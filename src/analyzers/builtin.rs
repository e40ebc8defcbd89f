//! Offline analyzers backed by the `smca-core` heuristics.
//!
//! All of these are pure CPU work over the input text and never fail on
//! their own; the `Result` return is only there to satisfy the traits.

use anyhow::Result;
use async_trait::async_trait;

use smca_core::{coherence, engagement, keywords, lexicon, readability, stylometry};

use super::{
    AiTextDetector, CategoryClassifier, CoherenceScorer, EmotionDetector, EngagementPredictor,
    KeywordExtractor, ReadabilityAnalyzer, SentimentAnalyzer,
};
use crate::models::{AiDetection, CategoryResult, Keyword, ScoreMap, SentimentResult};

/// Keyword-lexicon classifier over a fixed set of candidate labels.
pub struct LexiconCategoryClassifier {
    labels: Vec<String>,
}

impl LexiconCategoryClassifier {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl CategoryClassifier for LexiconCategoryClassifier {
    async fn classify(&self, text: &str) -> Result<CategoryResult> {
        Ok(lexicon::classify_category(text, &self.labels))
    }
}

pub struct Readability;

#[async_trait]
impl ReadabilityAnalyzer for Readability {
    async fn analyze(&self, text: &str) -> Result<ScoreMap> {
        Ok(readability::readability_scores(text))
    }
}

pub struct LexiconSentiment;

#[async_trait]
impl SentimentAnalyzer for LexiconSentiment {
    async fn analyze(&self, text: &str) -> Result<SentimentResult> {
        Ok(lexicon::score_sentiment(text))
    }
}

pub struct LexiconEmotion;

#[async_trait]
impl EmotionDetector for LexiconEmotion {
    async fn detect(&self, text: &str) -> Result<ScoreMap> {
        Ok(lexicon::score_emotions(text))
    }
}

/// RAKE key-phrase extraction.
pub struct RakeKeywords;

#[async_trait]
impl KeywordExtractor for RakeKeywords {
    async fn extract(&self, text: &str, max_keywords: usize) -> Result<Vec<Keyword>> {
        Ok(keywords::extract_keywords(text, max_keywords))
    }
}

pub struct StylometricAiDetector;

#[async_trait]
impl AiTextDetector for StylometricAiDetector {
    async fn detect(&self, text: &str) -> Result<AiDetection> {
        Ok(AiDetection::new(stylometry::ai_probability(text)))
    }
}

pub struct ParagraphCoherence;

#[async_trait]
impl CoherenceScorer for ParagraphCoherence {
    async fn score(&self, text: &str) -> Result<f64> {
        Ok(coherence::coherence_score(text))
    }
}

pub struct WeightedEngagement;

#[async_trait]
impl EngagementPredictor for WeightedEngagement {
    async fn predict(
        &self,
        sentiment_confidence: f64,
        word_count: usize,
        emotions: &ScoreMap,
    ) -> Result<f64> {
        Ok(engagement::predict_engagement(
            sentiment_confidence,
            word_count,
            emotions,
        ))
    }
}
