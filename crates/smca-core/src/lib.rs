//! # SMCA Core
//!
//! Shared, I/O-free logic for the content analyzer: stage result models,
//! the result aggregator, and the offline text analysis algorithms used by
//! the builtin analyzers (readability, RAKE keywords, lexicon scoring,
//! coherence, engagement).
//!
//! This crate contains no tokio, HTTP, filesystem I/O, or other
//! native-only dependencies.

pub mod aggregate;
pub mod coherence;
pub mod engagement;
pub mod keywords;
pub mod lexicon;
pub mod models;
pub mod readability;
pub mod stylometry;
pub mod text;
