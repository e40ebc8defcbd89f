//! Stylometric AI-text heuristic.
//!
//! Machine-generated prose tends to have uniform sentence lengths (low
//! burstiness) and a narrower vocabulary than human writing. Both signals
//! are mapped onto `[0, 1]` and blended into a probability in
//! `[0.15, 0.85]`; the heuristic never claims certainty.

use std::collections::HashSet;

use crate::text::{sentences, words};

/// Number of leading words used for the type-token ratio, so that long
/// texts are not penalised for natural repetition.
const TTR_WINDOW: usize = 200;

/// Estimated probability that `text` was machine-generated.
pub fn ai_probability(text: &str) -> f64 {
    let lengths: Vec<f64> = sentences(text)
        .iter()
        .map(|s| words(s).len() as f64)
        .filter(|n| *n > 0.0)
        .collect();

    let burstiness_signal = if lengths.len() < 2 {
        0.5
    } else {
        let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
        let variance =
            lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
        let cv = variance.sqrt() / mean;
        ((0.6 - cv) / 0.6).clamp(0.0, 1.0)
    };

    let tokens = words(text);
    let window = &tokens[..tokens.len().min(TTR_WINDOW)];
    let diversity_signal = if window.is_empty() {
        0.5
    } else {
        let distinct: HashSet<&String> = window.iter().collect();
        let ttr = distinct.len() as f64 / window.len() as f64;
        ((0.75 - ttr) / 0.35).clamp(0.0, 1.0)
    };

    let p = 0.15 + 0.7 * (0.6 * burstiness_signal + 0.4 * diversity_signal);
    (p * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds() {
        for text in ["", "Hi.", "a a a a a a. a a a a a a. a a a a a a."] {
            let p = ai_probability(text);
            assert!((0.15..=0.85).contains(&p), "{} -> {}", text, p);
        }
    }

    #[test]
    fn uniform_repetitive_text_scores_higher_than_varied_text() {
        let uniform = "The system is very good. The system is very fast. \
                       The system is very safe. The system is very nice.";
        let varied = "Wow. I never expected the parade to wind through our tiny street, \
                      past the bakery and the old church, at dawn! Odd. Lovely, though.";
        assert!(ai_probability(uniform) > ai_probability(varied));
    }
}
