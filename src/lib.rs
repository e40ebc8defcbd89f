//! # SMCA
//!
//! Social media content analyzer: upload a document or image, extract its
//! text, and stream it through a fixed sequence of analysis stages
//! (category, readability, sentiment, emotion, keywords, AI-text detection,
//! coherence, hashtags, engagement) into one aggregated report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────────────┐   ┌────────────┐
//! │  upload  │──▶│  extract  │──▶│  9 isolated stages   │──▶│ aggregate  │
//! │ registry │   │ PDF/DOCX/ │   │ (analyzer backends)  │   │  + events  │
//! └──────────┘   │ OCR/text  │   └──────────────────────┘   └─────┬──────┘
//!                └───────────┘                                    │
//!                                  ┌──────────────────────────────┤
//!                                  ▼                              ▼
//!                            ┌──────────┐                   ┌──────────┐
//!                            │   SSE    │                   │   CLI    │
//!                            │ (server) │                   │ (smca)   │
//!                            └──────────┘                   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Result types and pipeline events |
//! | [`extract`] | Text extraction from uploads |
//! | [`analyzers`] | Analyzer traits and backends |
//! | [`hashtags`] | Hashtag suggestions with caching |
//! | [`registry`] | Task id registry and upload ownership |
//! | [`pipeline`] | Stage orchestration and failure isolation |
//! | [`progress`] | CLI progress reporting |
//! | [`analyze_cmd`] | One-shot local analysis |
//! | [`server`] | Upload and SSE HTTP server |

pub mod analyze_cmd;
pub mod analyzers;
pub mod config;
pub mod extract;
pub mod hashtags;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod server;
