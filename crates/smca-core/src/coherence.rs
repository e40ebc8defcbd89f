//! Paragraph coherence.
//!
//! Coherence is the mean cosine similarity between consecutive paragraphs,
//! clamped to `[0, 1]`. Paragraphs are embedded as term-frequency vectors
//! over a shared vocabulary. Text with fewer than two paragraphs is fully
//! coherent by definition.

use std::collections::HashMap;

use crate::text::{paragraphs, words};

/// Score how well consecutive paragraphs of `text` relate to each other.
pub fn coherence_score(text: &str) -> f64 {
    let paras = paragraphs(text);
    if paras.len() < 2 {
        return 1.0;
    }

    let mut vocab: HashMap<String, usize> = HashMap::new();
    let bags: Vec<Vec<(usize, f64)>> = paras
        .iter()
        .map(|p| {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for w in words(p) {
                let next = vocab.len();
                let idx = *vocab.entry(w).or_insert(next);
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
            counts.into_iter().collect()
        })
        .collect();

    let dense: Vec<Vec<f64>> = bags
        .iter()
        .map(|bag| {
            let mut v = vec![0.0; vocab.len()];
            for &(i, c) in bag {
                v[i] = c;
            }
            v
        })
        .collect();

    let sims: Vec<f64> = dense
        .windows(2)
        .map(|pair| cosine_similarity(&pair[0], &pair[1]))
        .collect();
    let mean = sims.iter().sum::<f64>() / sims.len() as f64;
    mean.clamp(0.0, 1.0)
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// zero-magnitude vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}
