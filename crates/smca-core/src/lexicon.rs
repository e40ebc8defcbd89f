//! Lexicon-based sentiment, emotion, and category scoring.
//!
//! These are the offline fallbacks for the transformer models: small
//! hand-curated word lists with simple modifiers. They trade accuracy for
//! zero setup and deterministic output.

use std::collections::HashMap;

use crate::models::{CategoryResult, ScoreMap, SentimentResult};
use crate::text::words;

/// Label returned when no category term matches.
pub const GENERAL_CATEGORY: &str = "General";

/// Emotion labels, in the order the emotion model reports them.
pub const EMOTIONS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

const POSITIVE: &[(&str, f64)] = &[
    ("great", 2.0), ("excellent", 2.5), ("amazing", 2.5), ("awesome", 2.5),
    ("fantastic", 2.5), ("wonderful", 2.5), ("love", 2.0), ("loved", 2.0), ("best", 2.0),
    ("brilliant", 2.5), ("perfect", 2.5), ("outstanding", 2.5), ("incredible", 2.0),
    ("good", 1.0), ("nice", 1.0), ("happy", 1.5), ("glad", 1.0), ("thanks", 1.0),
    ("thank", 1.0), ("congrats", 2.0), ("congratulations", 2.0), ("proud", 1.5),
    ("enjoy", 1.5), ("enjoyed", 1.5), ("exciting", 1.5), ("excited", 1.5), ("win", 1.5),
    ("success", 1.5), ("successful", 1.5), ("beautiful", 2.0), ("helpful", 1.0),
    ("recommend", 1.0), ("impressive", 2.0), ("well", 0.5), ("like", 0.5), ("fun", 1.5),
    ("improved", 1.0), ("easy", 1.0), ("delighted", 2.0), ("superb", 2.5),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", 1.5), ("terrible", 2.5), ("awful", 2.5), ("horrible", 2.5), ("worst", 2.5),
    ("hate", 2.5), ("hated", 2.5), ("poor", 1.5), ("sad", 1.5), ("angry", 2.0),
    ("disappointing", 2.0), ("disappointed", 2.0), ("fail", 1.5), ("failed", 1.5),
    ("failure", 2.0), ("broken", 1.5), ("wrong", 1.0), ("problem", 1.0), ("problems", 1.0),
    ("issue", 0.5), ("bug", 1.0), ("slow", 1.0), ("ugly", 2.0), ("boring", 1.5),
    ("useless", 2.0), ("annoying", 1.5), ("difficult", 1.0), ("hard", 0.5), ("never", 0.5),
    ("sorry", 1.0), ("unfortunately", 1.0), ("worse", 2.0), ("scary", 1.5), ("pain", 1.5),
    ("waste", 2.0), ("lost", 1.0), ("crash", 1.5), ("mess", 1.5),
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "extremely", "so", "super", "incredibly", "totally", "absolutely",
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "can't",
    "won't", "cannot", "hardly",
];

const EMOTION_TERMS: &[(&str, &[&str])] = &[
    ("joy", &[
        "happy", "great", "joy", "excited", "exciting", "glad", "fun", "awesome", "amazing",
        "delighted", "celebrate", "win", "yay", "fantastic", "wonderful", "enjoy", "smile",
        "laugh", "proud", "job",
    ]),
    ("sadness", &[
        "sad", "unhappy", "cry", "tears", "miss", "lonely", "loss", "lost", "grief", "sorry",
        "depressed", "disappointed", "regret", "hurt", "alone",
    ]),
    ("anger", &[
        "angry", "furious", "hate", "annoyed", "annoying", "rage", "mad", "outraged",
        "frustrated", "irritated", "terrible", "worst", "unacceptable",
    ]),
    ("fear", &[
        "afraid", "scared", "fear", "worried", "anxious", "nervous", "panic", "terrified",
        "scary", "risk", "threat", "danger",
    ]),
    ("surprise", &[
        "surprise", "surprised", "wow", "unexpected", "shocked", "suddenly", "incredible",
        "unbelievable", "astonishing", "omg",
    ]),
    ("love", &[
        "love", "loved", "lovely", "adore", "caring", "darling", "sweet", "heart", "romantic",
        "affection", "cherish", "team",
    ]),
];

const CATEGORY_TERMS: &[(&str, &[&str])] = &[
    ("technology", &[
        "software", "app", "computer", "tech", "technology", "code", "coding", "ai",
        "digital", "internet", "device", "data", "cloud", "algorithm", "startup", "robot",
    ]),
    ("education", &[
        "school", "student", "students", "teacher", "learn", "learning", "course", "class",
        "university", "education", "study", "exam", "lesson", "college",
    ]),
    ("marketing", &[
        "brand", "marketing", "campaign", "audience", "customers", "promotion", "sales",
        "advertising", "engagement", "followers", "content", "launch",
    ]),
    ("health", &[
        "health", "doctor", "medical", "patient", "hospital", "disease", "treatment",
        "fitness", "exercise", "diet", "wellness", "cancer", "therapy", "medicine",
    ]),
    ("finance", &[
        "money", "finance", "bank", "investment", "invest", "stock", "stocks", "market",
        "crypto", "budget", "profit", "revenue", "loan", "savings",
    ]),
    ("entertainment", &[
        "movie", "film", "music", "show", "series", "celebrity", "concert", "game", "fun",
        "netflix", "song", "actor",
    ]),
    ("sports", &[
        "team", "match", "goal", "score", "player", "league", "championship", "coach",
        "football", "soccer", "basketball", "cricket", "tournament", "win",
    ]),
    ("politics", &[
        "government", "election", "vote", "policy", "president", "minister", "parliament",
        "law", "senate", "campaign", "democracy",
    ]),
    ("food", &[
        "food", "recipe", "cook", "cooking", "restaurant", "delicious", "dinner", "lunch",
        "breakfast", "chef", "taste", "meal",
    ]),
    ("travel", &[
        "travel", "trip", "flight", "hotel", "vacation", "beach", "tour", "journey",
        "destination", "explore", "passport",
    ]),
    ("business", &[
        "business", "company", "job", "career", "work", "office", "meeting", "client",
        "management", "strategy", "growth", "leadership",
    ]),
    ("environment", &[
        "climate", "environment", "green", "sustainability", "pollution", "recycle",
        "nature", "carbon", "energy", "planet",
    ]),
];

fn lookup(table: &[(&str, f64)], word: &str) -> Option<f64> {
    table.iter().find(|(w, _)| *w == word).map(|(_, s)| *s)
}

/// Lexicon sentiment with negation, intensifiers, and exclamation emphasis.
///
/// The label is `positive`, `negative`, or `neutral` (no signal); confidence
/// is in `[0.5, 1.0)`.
pub fn score_sentiment(text: &str) -> SentimentResult {
    let tokens = words(text);
    let mut total = 0.0;
    for (i, word) in tokens.iter().enumerate() {
        let polarity = match (lookup(POSITIVE, word), lookup(NEGATIVE, word)) {
            (Some(p), _) => p,
            (None, Some(n)) => -n,
            (None, None) => continue,
        };
        let window = &tokens[i.saturating_sub(3)..i];
        let mut value = polarity;
        if window
            .last()
            .is_some_and(|w| INTENSIFIERS.contains(&w.as_str()))
        {
            value *= 1.5;
        }
        if window.iter().any(|w| NEGATORS.contains(&w.as_str())) {
            value *= -0.75;
        }
        total += value;
    }

    let bangs = text.chars().filter(|&c| c == '!').count().min(3) as f64;
    total *= 1.0 + 0.15 * bangs;

    if total == 0.0 {
        return SentimentResult::new("neutral", 0.5);
    }
    let label = if total > 0.0 { "positive" } else { "negative" };
    let confidence = 0.5 + 0.5 * (total.abs() / 2.0).tanh();
    SentimentResult::new(label, round4(confidence.min(0.9999)))
}

/// Emotion distribution over [`EMOTIONS`], summing to 1.
///
/// Lexicon hits are smoothed so that text without any emotional terms
/// yields a uniform distribution.
pub fn score_emotions(text: &str) -> ScoreMap {
    const SMOOTHING: f64 = 0.1;
    let tokens = words(text);
    let mut hits: HashMap<&str, f64> = EMOTIONS.iter().map(|e| (*e, 0.0)).collect();
    for word in &tokens {
        for (emotion, terms) in EMOTION_TERMS {
            if terms.contains(&word.as_str()) {
                *hits.entry(*emotion).or_insert(0.0) += 1.0;
            }
        }
    }
    let total: f64 = hits.values().sum::<f64>() + SMOOTHING * EMOTIONS.len() as f64;
    EMOTIONS
        .iter()
        .map(|e| (e.to_string(), round4((hits[e] + SMOOTHING) / total)))
        .collect()
}

/// Pick the best-matching label from `labels` by term hits.
///
/// Labels are matched case-insensitively against the built-in term lists;
/// labels without a term list can never win. The score is the winner's
/// share of all hits. Ties resolve to the earlier label.
pub fn classify_category(text: &str, labels: &[String]) -> CategoryResult {
    let tokens = words(text);
    let mut best: Option<(&str, f64)> = None;
    let mut total = 0.0;
    for label in labels {
        let key = label.to_lowercase();
        let Some((_, terms)) = CATEGORY_TERMS.iter().find(|(name, _)| *name == key) else {
            continue;
        };
        let count = tokens
            .iter()
            .filter(|w| terms.contains(&w.as_str()))
            .count() as f64;
        total += count;
        if count > best.map_or(0.0, |(_, c)| c) {
            best = Some((label.as_str(), count));
        }
    }
    match best {
        Some((label, count)) if total > 0.0 => CategoryResult::new(label, round4(count / total)),
        _ => CategoryResult::new(GENERAL_CATEGORY, 0.0),
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn great_job_team_is_positive() {
        let s = score_sentiment("Great job team!!!");
        assert_eq!(s.sentiment.as_deref(), Some("positive"));
        assert!(s.confidence.unwrap() > 0.5);
    }

    #[test]
    fn negation_flips_polarity() {
        let s = score_sentiment("This is not good at all.");
        assert_eq!(s.sentiment.as_deref(), Some("negative"));
    }

    #[test]
    fn no_signal_is_neutral() {
        let s = score_sentiment("The meeting is on Tuesday.");
        assert_eq!(s.sentiment.as_deref(), Some("neutral"));
        assert_eq!(s.confidence, Some(0.5));
    }

    #[test]
    fn emotions_form_a_distribution() {
        let e = score_emotions("I am so happy and excited, what a fun day!");
        assert_eq!(e.len(), EMOTIONS.len());
        let sum: f64 = e.values().sum();
        assert!((sum - 1.0).abs() < 0.001);
        let top = e
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k.as_str());
        assert_eq!(top, Some("joy"));
    }

    #[test]
    fn category_picks_most_hits() {
        let labels: Vec<String> = ["Technology", "Health", "Sports"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let c = classify_category("The doctor said the treatment for the patient worked.", &labels);
        assert_eq!(c.label(), "Health");
        assert_eq!(c.score(), 1.0);
    }

    #[test]
    fn category_without_hits_is_general() {
        let labels = vec!["Technology".to_string()];
        let c = classify_category("Lorem ipsum dolor sit amet.", &labels);
        assert_eq!(c.label(), GENERAL_CATEGORY);
        assert_eq!(c.score(), 0.0);
    }
}
