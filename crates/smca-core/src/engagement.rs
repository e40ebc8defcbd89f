//! Engagement prediction.
//!
//! ```text
//! score = 100 · (0.4·confidence + 0.4·min(words/500, 1) + 0.2·weight(e)·value(e))
//! ```
//!
//! where `e` is the dominant (highest-scoring) emotion. The result is
//! clamped to `[0, 100]` and rounded to two decimals.

use crate::models::ScoreMap;

/// Word count at which the length factor saturates.
const LENGTH_SATURATION: f64 = 500.0;

/// Engagement weight of an emotion. Unlisted emotions weigh like `neutral`.
pub fn emotion_weight(emotion: &str) -> f64 {
    match emotion {
        "joy" => 1.0,
        "surprise" => 0.9,
        "anger" => 0.3,
        "sadness" => 0.4,
        "fear" => 0.5,
        _ => 0.6,
    }
}

/// The highest-scoring emotion and its value. `ScoreMap` iterates in key
/// order, so ties go to the alphabetically first emotion. An empty map
/// yields `("neutral", 0.0)`.
pub fn dominant_emotion(emotions: &ScoreMap) -> (&str, f64) {
    let mut best: Option<(&str, f64)> = None;
    for (name, &value) in emotions {
        match best {
            Some((_, v)) if value <= v => {}
            _ => best = Some((name.as_str(), value)),
        }
    }
    best.unwrap_or(("neutral", 0.0))
}

/// Predict an engagement score in `[0, 100]`.
pub fn predict_engagement(sentiment_confidence: f64, word_count: usize, emotions: &ScoreMap) -> f64 {
    let length_norm = (word_count as f64 / LENGTH_SATURATION).min(1.0);
    let (emotion, value) = dominant_emotion(emotions);
    let emotion_factor = emotion_weight(emotion) * value;

    let score = 100.0 * (0.4 * sentiment_confidence + 0.4 * length_norm + 0.2 * emotion_factor);
    let score = if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 };
    (score * 100.0).round() / 100.0
}
