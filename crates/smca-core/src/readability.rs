//! Readability metrics.
//!
//! Computes the classic surface-statistics formulas over word, sentence,
//! syllable, and character counts. All scores are rounded to two decimals.
//!
//! | Key | Formula |
//! |-----|---------|
//! | `flesch_reading_ease` | 206.835 − 1.015·(W/S) − 84.6·(Syl/W) |
//! | `flesch_kincaid_grade` | 0.39·(W/S) + 11.8·(Syl/W) − 15.59 |
//! | `gunning_fog` | 0.4·(W/S + 100·Complex/W) |
//! | `smog_index` | 1.043·√(Poly·30/S) + 3.1291 (0 under 3 sentences) |
//! | `automated_readability_index` | 4.71·(Chars/W) + 0.5·(W/S) − 21.43 |

use crate::models::ScoreMap;
use crate::text::{sentences, syllables, words};

/// Compute all readability metrics for `text`.
pub fn readability_scores(text: &str) -> ScoreMap {
    let words = words(text);
    let sentence_count = sentences(text).len().max(1) as f64;
    let word_count = words.len() as f64;

    let mut scores = ScoreMap::new();
    if words.is_empty() {
        for key in METRICS {
            scores.insert(key.to_string(), 0.0);
        }
        return scores;
    }

    let syllable_counts: Vec<usize> = words.iter().map(|w| syllables(w)).collect();
    let total_syllables = syllable_counts.iter().sum::<usize>() as f64;
    let polysyllables = syllable_counts.iter().filter(|&&s| s >= 3).count() as f64;
    let letters = words
        .iter()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).count())
        .sum::<usize>() as f64;

    let wps = word_count / sentence_count;
    let spw = total_syllables / word_count;

    let smog = if sentence_count < 3.0 {
        0.0
    } else {
        1.043 * (polysyllables * (30.0 / sentence_count)).sqrt() + 3.1291
    };

    scores.insert(
        "flesch_reading_ease".to_string(),
        round2(206.835 - 1.015 * wps - 84.6 * spw),
    );
    scores.insert(
        "flesch_kincaid_grade".to_string(),
        round2(0.39 * wps + 11.8 * spw - 15.59),
    );
    scores.insert(
        "gunning_fog".to_string(),
        round2(0.4 * (wps + 100.0 * polysyllables / word_count)),
    );
    scores.insert("smog_index".to_string(), round2(smog));
    scores.insert(
        "automated_readability_index".to_string(),
        round2(4.71 * (letters / word_count) + 0.5 * wps - 21.43),
    );
    scores
}

const METRICS: [&str; 5] = [
    "flesch_reading_ease",
    "flesch_kincaid_grade",
    "gunning_fog",
    "smog_index",
    "automated_readability_index",
];

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
