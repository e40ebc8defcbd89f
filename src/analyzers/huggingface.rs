//! Hosted-inference analyzers (Hugging Face Inference API).
//!
//! Every request is `POST {endpoint}/{model}` with a bearer token read from
//! the environment variable named by `analyzers.token_env`.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited), 503 (model loading), and other 5xx → retry
//! - HTTP 4xx (not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AiTextDetector, CategoryClassifier, EmotionDetector, SentimentAnalyzer};
use crate::config::AnalyzersConfig;
use crate::models::{AiDetection, CategoryResult, ScoreMap, SentimentResult};

/// Classification models accept roughly 512 tokens; longer input is cut here.
const MAX_INPUT_CHARS: usize = 2000;

/// Shared HTTP client for all hosted analyzers.
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    max_retries: u32,
}

impl InferenceClient {
    pub fn new(config: &AnalyzersConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env)
            .map_err(|_| anyhow!("{} not set", config.token_env))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
            max_retries: config.max_retries,
        })
    }

    /// POST `body` to the model and return the parsed JSON response.
    pub async fn infer(&self, model: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, model);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(model, attempt, ?delay, "retrying inference request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.token)
                .json(body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("inference error {} for {}: {}", status, model, body_text));
                        continue;
                    }
                    bail!("inference error {} for {}: {}", status, model, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("inference failed after retries")))
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Text-classification responses come back either as `[[{label, score}]]`
/// or flattened as `[{label, score}]`.
fn parse_label_scores(json: &Value) -> Result<Vec<LabelScore>> {
    let outer = json
        .as_array()
        .ok_or_else(|| anyhow!("invalid classification response: expected array"))?;
    let inner = match outer.first() {
        Some(Value::Array(_)) => outer[0].clone(),
        _ => json.clone(),
    };
    let scores: Vec<LabelScore> = serde_json::from_value(inner)?;
    if scores.is_empty() {
        bail!("invalid classification response: no labels");
    }
    Ok(scores)
}

fn parse_sentiment(json: &Value) -> Result<SentimentResult> {
    let scores = parse_label_scores(json)?;
    let top = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| anyhow!("empty sentiment response"))?;
    Ok(SentimentResult::new(top.label.to_lowercase(), top.score))
}

fn parse_emotions(json: &Value) -> Result<ScoreMap> {
    Ok(parse_label_scores(json)?
        .into_iter()
        .map(|ls| (ls.label.to_lowercase(), ls.score))
        .collect())
}

/// The OpenAI detector labels machine text `Fake` (index 1).
fn parse_ai_probability(json: &Value) -> Result<AiDetection> {
    let scores = parse_label_scores(json)?;
    let find = |names: &[&str]| {
        scores
            .iter()
            .find(|ls| names.contains(&ls.label.to_lowercase().as_str()))
            .map(|ls| ls.score)
    };
    if let Some(p) = find(&["fake", "label_1", "ai", "machine"]) {
        return Ok(AiDetection::new(p));
    }
    if let Some(p) = find(&["real", "label_0", "human"]) {
        return Ok(AiDetection::new(1.0 - p));
    }
    bail!("unrecognised AI detector labels")
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

fn parse_zero_shot(json: &Value) -> Result<CategoryResult> {
    let resp: ZeroShotResponse = serde_json::from_value(json.clone())?;
    match (resp.labels.first(), resp.scores.first()) {
        (Some(label), Some(score)) => Ok(CategoryResult::new(label.clone(), *score)),
        _ => bail!("zero-shot response has no labels"),
    }
}

/// Zero-shot classification over the configured candidate labels.
pub struct ZeroShotCategory {
    client: Arc<InferenceClient>,
    model: String,
    labels: Vec<String>,
}

impl ZeroShotCategory {
    pub fn new(client: Arc<InferenceClient>, config: &AnalyzersConfig) -> Self {
        Self {
            client,
            model: config.category_model.clone(),
            labels: config.category_labels.clone(),
        }
    }
}

#[async_trait]
impl CategoryClassifier for ZeroShotCategory {
    async fn classify(&self, text: &str) -> Result<CategoryResult> {
        let body = json!({
            "inputs": truncate(text),
            "parameters": { "candidate_labels": self.labels },
        });
        parse_zero_shot(&self.client.infer(&self.model, &body).await?)
    }
}

pub struct HfSentiment {
    client: Arc<InferenceClient>,
    model: String,
}

impl HfSentiment {
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for HfSentiment {
    async fn analyze(&self, text: &str) -> Result<SentimentResult> {
        let body = json!({ "inputs": truncate(text) });
        parse_sentiment(&self.client.infer(&self.model, &body).await?)
    }
}

pub struct HfEmotion {
    client: Arc<InferenceClient>,
    model: String,
}

impl HfEmotion {
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EmotionDetector for HfEmotion {
    async fn detect(&self, text: &str) -> Result<ScoreMap> {
        let body = json!({
            "inputs": truncate(text),
            "parameters": { "top_k": null },
        });
        parse_emotions(&self.client.infer(&self.model, &body).await?)
    }
}

pub struct HfAiDetector {
    client: Arc<InferenceClient>,
    model: String,
}

impl HfAiDetector {
    pub fn new(client: Arc<InferenceClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl AiTextDetector for HfAiDetector {
    async fn detect(&self, text: &str) -> Result<AiDetection> {
        let body = json!({ "inputs": truncate(text) });
        parse_ai_probability(&self.client.infer(&self.model, &body).await?)
    }
}
