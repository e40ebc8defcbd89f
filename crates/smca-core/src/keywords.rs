//! RAKE (Rapid Automatic Keyword Extraction).
//!
//! # Algorithm
//!
//! 1. Split the text into candidate phrases at punctuation and stopwords.
//! 2. For each word, compute `degree` (sum of the lengths of the phrases it
//!    appears in) and `frequency` (number of occurrences).
//! 3. Word score = `degree / frequency`; phrase score = sum of word scores.
//! 4. Deduplicate phrases, sort by score descending (stable), keep the top K.
//!
//! # Example
//!
//! ```rust
//! use smca_core::keywords::extract_keywords;
//!
//! let kws = extract_keywords("Natural language processing is a field of artificial intelligence.", 3);
//! assert_eq!(kws[0].keyword, "natural language processing");
//! ```

use std::collections::{HashMap, HashSet};

use crate::models::Keyword;

/// Extract at most `max_keywords` ranked key phrases from `text`.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<Keyword> {
    let phrases = candidate_phrases(text);

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &phrases {
        let len = phrase.len() as f64;
        for word in phrase {
            *frequency.entry(word.as_str()).or_insert(0.0) += 1.0;
            *degree.entry(word.as_str()).or_insert(0.0) += len;
        }
    }

    let mut seen = HashSet::new();
    let mut ranked: Vec<Keyword> = Vec::new();
    for phrase in &phrases {
        let joined = phrase.join(" ");
        if !seen.insert(joined.clone()) {
            continue;
        }
        let score: f64 = phrase
            .iter()
            .map(|w| degree[w.as_str()] / frequency[w.as_str()])
            .sum();
        ranked.push(Keyword::new(joined, score));
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(max_keywords);
    ranked
}

/// Candidate phrases as lowercased word sequences.
fn candidate_phrases(text: &str) -> Vec<Vec<String>> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    let mut flush = |current: &mut Vec<String>| {
        if !current.is_empty() {
            phrases.push(std::mem::take(current));
        }
    };

    let mut token = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_alphanumeric() || c == '\'' || c == '-' {
            token.push(c);
            continue;
        }
        if !token.is_empty() {
            let word = token.trim_matches(|c| c == '\'' || c == '-').to_lowercase();
            token.clear();
            if word.is_empty() || stopwords.contains(word.as_str()) {
                flush(&mut current);
            } else if word.chars().any(|c| c.is_alphabetic()) {
                current.push(word);
            } else {
                flush(&mut current);
            }
        }
        if !c.is_whitespace() {
            // Punctuation ends a phrase.
            flush(&mut current);
        }
    }
    flush(&mut current);
    phrases
}

const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't", "also", "would", "could", "may", "might", "must", "shall",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_stopwords_and_punctuation() {
        let phrases = candidate_phrases("Deep learning, and the future of AI.");
        assert_eq!(
            phrases,
            vec![
                vec!["deep".to_string(), "learning".to_string()],
                vec!["future".to_string()],
                vec!["ai".to_string()],
            ]
        );
    }

    #[test]
    fn longer_phrases_rank_higher() {
        let kws = extract_keywords(
            "Natural language processing is an exciting field of artificial intelligence.",
            10,
        );
        assert_eq!(kws[0].keyword, "natural language processing");
        assert_eq!(kws[0].score, 9.0);
        assert!(kws.iter().any(|k| k.keyword == "artificial intelligence"));
    }

    #[test]
    fn respects_limit_and_dedups() {
        let kws = extract_keywords("rust rocks. rust rocks. python is fine. go is fast.", 2);
        assert_eq!(kws.len(), 2);
        let names: Vec<&str> = kws.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == "rust rocks").count(), 1);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_keywords("", 10).is_empty());
        assert!(extract_keywords("the and of", 10).is_empty());
    }
}
