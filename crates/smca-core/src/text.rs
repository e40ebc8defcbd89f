//! Tokenisation helpers shared by the analysis algorithms.

/// Number of whitespace-separated tokens, the word count used for
/// engagement prediction.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercased alphabetic words (apostrophes kept inside words).
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .map(|w| w.to_lowercase())
        .collect()
}

/// Sentences split on `.`, `!`, `?` and line breaks. Empty pieces are
/// dropped.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| s.chars().any(|c| c.is_alphanumeric()))
        .collect()
}

/// Non-empty trimmed lines, used as paragraphs.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Estimated syllable count of a single word.
///
/// Counts vowel groups, drops a silent trailing `e`, and never returns
/// less than one for a non-empty word.
pub fn syllables(word: &str) -> usize {
    let w: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if w.is_empty() {
        return 0;
    }
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &w {
        let v = is_vowel(c);
        if v && !prev_vowel {
            count += 1;
        }
        prev_vowel = v;
    }
    let n = w.len();
    if n > 2 && w[n - 1] == 'e' && w[n - 2] != 'l' && !is_vowel(w[n - 2]) && count > 1 {
        count -= 1;
    }
    count.max(1)
}
