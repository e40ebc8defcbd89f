//! Analysis pipeline orchestrator.
//!
//! One run takes one file through a fixed sequence of stages and emits
//! [`PipelineEvent`]s on a bounded channel as it goes:
//!
//! ```text
//! prepare ─▶ extract ─▶ category ─▶ readability ─▶ sentiment ─▶ emotion
//!         ─▶ keywords ─▶ ai-detection ─▶ coherence ─▶ hashtags ─▶ engagement
//!         ─▶ finalize ─▶ Result + Done
//! ```
//!
//! Stages run strictly in sequence. Hashtags consume the category label;
//! engagement consumes sentiment confidence and the emotion map.
//!
//! # Failure isolation
//!
//! Every analyzer stage goes through [`StageRunner::run_stage`]. An error,
//! a panic, or an expired deadline inside a stage is logged and replaced
//! with the stage's `Default` value; the run continues. Extraction is the
//! exception: a failed extraction, or text that is empty after trimming,
//! ends the run with a progress event at 100 followed by one `Error` event.
//!
//! # Progress
//!
//! Each stage reports a start and a finish milestone. Emitted progress
//! values never decrease within a run and the last one is always 100.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::Instrument;

use smca_core::aggregate::{aggregate, StageOutputs};
use smca_core::text::word_count;

use crate::analyzers::Analyzers;
use crate::config::Config;
use crate::extract::Extractor;
use crate::models::PipelineEvent;
use crate::registry::UploadGuard;

/// The pipeline's stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Extract,
    Category,
    Readability,
    Sentiment,
    Emotion,
    Keywords,
    AiDetection,
    Coherence,
    Hashtags,
    Engagement,
    Finalize,
}

impl Stage {
    pub const ALL: [Stage; 12] = [
        Stage::Prepare,
        Stage::Extract,
        Stage::Category,
        Stage::Readability,
        Stage::Sentiment,
        Stage::Emotion,
        Stage::Keywords,
        Stage::AiDetection,
        Stage::Coherence,
        Stage::Hashtags,
        Stage::Engagement,
        Stage::Finalize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::Extract => "extract",
            Stage::Category => "category",
            Stage::Readability => "readability",
            Stage::Sentiment => "sentiment",
            Stage::Emotion => "emotion",
            Stage::Keywords => "keywords",
            Stage::AiDetection => "ai_detection",
            Stage::Coherence => "coherence",
            Stage::Hashtags => "hashtags",
            Stage::Engagement => "engagement",
            Stage::Finalize => "finalize",
        }
    }

    /// Step message and progress reported when the stage begins.
    pub fn start(&self) -> (&'static str, u8) {
        match self {
            Stage::Prepare => ("Preparing analysis...", 30),
            Stage::Extract => ("Extracting text...", 32),
            Stage::Category => ("Classifying category...", 38),
            Stage::Readability => ("Analyzing readability...", 44),
            Stage::Sentiment => ("Analyzing sentiment...", 50),
            Stage::Emotion => ("Detecting emotions...", 56),
            Stage::Keywords => ("Extracting keywords...", 62),
            Stage::AiDetection => ("Detecting AI-generated text...", 68),
            Stage::Coherence => ("Computing coherence score...", 74),
            Stage::Hashtags => ("Generating hashtags...", 80),
            Stage::Engagement => ("Predicting engagement...", 86),
            Stage::Finalize => ("Finalising results...", 92),
        }
    }

    /// Step message and progress reported when the stage ends.
    /// `Prepare` has no work and reports nothing on completion.
    pub fn finish(&self) -> Option<(&'static str, u8)> {
        match self {
            Stage::Prepare => None,
            Stage::Extract => Some(("Text extracted", 35)),
            Stage::Category => Some(("Category classified", 41)),
            Stage::Readability => Some(("Readability complete", 47)),
            Stage::Sentiment => Some(("Sentiment complete", 53)),
            Stage::Emotion => Some(("Emotion detection complete", 59)),
            Stage::Keywords => Some(("Keywords extracted", 65)),
            Stage::AiDetection => Some(("AI detection complete", 71)),
            Stage::Coherence => Some(("Coherence calculated", 77)),
            Stage::Hashtags => Some(("Hashtags ready", 83)),
            Stage::Engagement => Some(("Engagement predicted", 89)),
            Stage::Finalize => Some(("Analysis complete", 100)),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a stage fell back to its default.
#[derive(Debug)]
enum StageFault {
    Error(anyhow::Error),
    Panic(String),
    Timeout(Duration),
}

impl fmt::Display for StageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFault::Error(e) => write!(f, "{:#}", e),
            StageFault::Panic(msg) => write!(f, "panicked: {}", msg),
            StageFault::Timeout(d) => write!(f, "timed out after {:?}", d),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Emits events for one run and applies uniform failure isolation.
///
/// Methods return `None` once the receiving side has gone away, so a run
/// whose subscriber disconnected stops at the next stage boundary.
pub struct StageRunner<'a> {
    tx: &'a mpsc::Sender<PipelineEvent>,
    timeout: Option<Duration>,
    last_progress: u8,
}

impl<'a> StageRunner<'a> {
    pub fn new(tx: &'a mpsc::Sender<PipelineEvent>, timeout: Option<Duration>) -> Self {
        Self {
            tx,
            timeout,
            last_progress: 0,
        }
    }

    pub fn last_progress(&self) -> u8 {
        self.last_progress
    }

    async fn send(&mut self, event: PipelineEvent) -> Option<()> {
        tracing::debug!(event = event.name(), "pipeline event");
        self.tx.send(event).await.ok()
    }

    /// Report progress, never lower than what was already reported.
    pub async fn progress(&mut self, step: &str, progress: u8) -> Option<()> {
        let progress = progress.max(self.last_progress).min(100);
        self.last_progress = progress;
        self.send(PipelineEvent::progress(step, progress)).await
    }

    /// Run one analyzer stage between its start and finish milestones.
    ///
    /// Errors, panics, and timeouts yield `T::default()`.
    pub async fn run_stage<T, F>(&mut self, stage: Stage, work: F) -> Option<T>
    where
        T: Default,
        F: std::future::Future<Output = anyhow::Result<T>>,
    {
        let (step, progress) = stage.start();
        self.progress(step, progress).await?;

        let started = Instant::now();
        let value = match self.isolate(work).await {
            Ok(value) => {
                tracing::debug!(stage = %stage, elapsed = ?started.elapsed(), "stage complete");
                value
            }
            Err(fault) => {
                tracing::warn!(stage = %stage, error = %fault, "stage failed, using default");
                T::default()
            }
        };

        if let Some((step, progress)) = stage.finish() {
            self.progress(step, progress).await?;
        }
        Some(value)
    }

    async fn isolate<T, F>(&self, work: F) -> Result<T, StageFault>
    where
        F: std::future::Future<Output = anyhow::Result<T>>,
    {
        let guarded = AssertUnwindSafe(work).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| StageFault::Timeout(limit))?,
            None => guarded.await,
        };
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StageFault::Error(e)),
            Err(payload) => Err(StageFault::Panic(panic_message(payload))),
        }
    }

    /// End the run with a fatal error: progress 100, then `Error`.
    pub async fn fail(&mut self, message: String) {
        if self.progress(&message, 100).await.is_some() {
            let _ = self.send(PipelineEvent::Error(message)).await;
        }
    }
}

/// What a run reads from. An upload is owned by the run and deleted when the
/// run ends; a local file is left alone.
#[derive(Debug)]
pub enum RunSource {
    Upload(UploadGuard),
    File(PathBuf),
}

impl RunSource {
    pub fn path(&self) -> &Path {
        match self {
            RunSource::Upload(guard) => guard.path(),
            RunSource::File(path) => path,
        }
    }
}

/// Sequences extraction and the analyzers for one text at a time.
pub struct Pipeline {
    extractor: Extractor,
    analyzers: Analyzers,
    keyword_limit: usize,
    stage_timeout: Option<Duration>,
    event_buffer: usize,
}

impl Pipeline {
    pub fn new(config: &Config, analyzers: Analyzers) -> Self {
        let timeout_secs = config.pipeline.stage_timeout_secs;
        Self {
            extractor: Extractor::new(&config.uploads, &config.ocr),
            analyzers,
            keyword_limit: config.pipeline.keyword_limit,
            stage_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            event_buffer: config.pipeline.event_buffer,
        }
    }

    /// Override the per-stage deadline.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Start a run on its own task and return the event stream.
    ///
    /// The task owns `source` and drops it when the run ends, whether or
    /// not anyone is still reading events.
    pub fn spawn(self: &Arc<Self>, source: RunSource) -> mpsc::Receiver<PipelineEvent> {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let pipeline = Arc::clone(self);
        let span = match &source {
            RunSource::Upload(guard) => tracing::info_span!("run", task_id = %guard.id()),
            RunSource::File(path) => tracing::info_span!("run", file = %path.display()),
        };
        tokio::spawn(
            async move {
                pipeline.run(source.path(), &tx).await;
                drop(source);
            }
            .instrument(span),
        );
        rx
    }

    /// Run the pipeline over `path`, sending events on `tx`.
    pub async fn run(&self, path: &Path, tx: &mpsc::Sender<PipelineEvent>) {
        let started = Instant::now();
        let mut runner = StageRunner::new(tx, self.stage_timeout);
        tracing::info!(path = %path.display(), "analysis started");

        match self.execute(path, &mut runner).await {
            Some(()) => {
                tracing::info!(elapsed = ?started.elapsed(), "analysis finished");
            }
            None => {
                tracing::info!(
                    progress = runner.last_progress(),
                    "analysis stopped: subscriber gone or run ended early"
                );
            }
        }
    }

    async fn execute(&self, path: &Path, runner: &mut StageRunner<'_>) -> Option<()> {
        let (step, progress) = Stage::Prepare.start();
        runner.progress(step, progress).await?;

        let (step, progress) = Stage::Extract.start();
        runner.progress(step, progress).await?;
        let extracted = AssertUnwindSafe(self.extractor.extract(path))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(crate::extract::ExtractError::Io(std::io::Error::other(
                    panic_message(payload),
                )))
            });
        let text = match extracted {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "extraction failed");
                runner.fail(format!("Extraction failed: {}", e)).await;
                return None;
            }
        };
        if let Some((step, progress)) = Stage::Extract.finish() {
            runner.progress(step, progress).await?;
        }

        if text.trim().is_empty() {
            tracing::warn!("extracted text is empty");
            runner.fail("No usable text found".to_string()).await;
            return None;
        }

        let outputs = self.analyze(&text, runner).await?;

        let (step, progress) = Stage::Finalize.start();
        runner.progress(step, progress).await?;
        let result = aggregate(&text, outputs, chrono::Utc::now());
        if let Some((step, progress)) = Stage::Finalize.finish() {
            runner.progress(step, progress).await?;
        }

        runner.send(PipelineEvent::Result(Box::new(result))).await?;
        runner.send(PipelineEvent::Done).await
    }

    /// Stages 3 to 11. Each one degrades to its default on failure.
    async fn analyze(&self, text: &str, runner: &mut StageRunner<'_>) -> Option<StageOutputs> {
        let a = &self.analyzers;

        let category = runner
            .run_stage(Stage::Category, a.category.classify(text))
            .await?;
        let readability = runner
            .run_stage(Stage::Readability, a.readability.analyze(text))
            .await?;
        let sentiment = runner
            .run_stage(Stage::Sentiment, a.sentiment.analyze(text))
            .await?;
        let emotion = runner
            .run_stage(Stage::Emotion, a.emotion.detect(text))
            .await?;
        let keywords = runner
            .run_stage(Stage::Keywords, a.keywords.extract(text, self.keyword_limit))
            .await?;
        let ai_detection = runner
            .run_stage(Stage::AiDetection, a.ai_detector.detect(text))
            .await?;
        let coherence = runner
            .run_stage(Stage::Coherence, a.coherence.score(text))
            .await?;
        let hashtags = runner
            .run_stage(
                Stage::Hashtags,
                a.hashtags.get_hashtags(category.label(), ""),
            )
            .await?;
        let engagement = runner
            .run_stage(
                Stage::Engagement,
                a.engagement.predict(
                    sentiment.confidence_or_zero(),
                    word_count(text),
                    &emotion,
                ),
            )
            .await?;

        Some(StageOutputs {
            category: Some(category),
            readability: Some(readability),
            sentiment: Some(sentiment),
            emotion: Some(emotion),
            keywords: Some(keywords),
            ai_detection: Some(ai_detection),
            coherence: Some(coherence),
            hashtags: Some(hashtags),
            engagement: Some(engagement),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn milestones_strictly_increase() {
        let mut values = Vec::new();
        for stage in Stage::ALL {
            values.push(stage.start().1);
            if let Some((_, p)) = stage.finish() {
                values.push(p);
            }
        }
        assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?}", values);
        assert_eq!(values.first(), Some(&30));
        assert_eq!(values.last(), Some(&100));
    }

    async fn drain(mut rx: mpsc::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn error_becomes_default() {
        let (tx, rx) = mpsc::channel(16);
        let mut runner = StageRunner::new(&tx, None);
        let value: Vec<String> = runner
            .run_stage(Stage::Hashtags, async { Err(anyhow!("scrape failed")) })
            .await
            .unwrap();
        assert!(value.is_empty());
        drop(tx);

        let events = drain(rx).await;
        assert_eq!(
            events,
            vec![
                PipelineEvent::progress("Generating hashtags...", 80),
                PipelineEvent::progress("Hashtags ready", 83),
            ]
        );
    }

    #[tokio::test]
    async fn panic_becomes_default() {
        let (tx, _rx) = mpsc::channel(16);
        let mut runner = StageRunner::new(&tx, None);
        let value: f64 = runner
            .run_stage(Stage::Coherence, async {
                if true {
                    panic!("model crashed");
                }
                Ok(1.0)
            })
            .await
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[tokio::test]
    async fn timeout_becomes_default() {
        let (tx, _rx) = mpsc::channel(16);
        let mut runner = StageRunner::new(&tx, Some(Duration::from_millis(20)));
        let value: f64 = runner
            .run_stage(Stage::Engagement, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(99.0)
            })
            .await
            .unwrap();
        assert_eq!(value, 0.0);
    }

    #[tokio::test]
    async fn progress_never_decreases() {
        let (tx, rx) = mpsc::channel(16);
        let mut runner = StageRunner::new(&tx, None);
        runner.progress("a", 50).await.unwrap();
        runner.progress("b", 40).await.unwrap();
        drop(tx);
        let events = drain(rx).await;
        assert_eq!(events[1], PipelineEvent::progress("b", 50));
    }

    #[tokio::test]
    async fn closed_receiver_stops_stage() {
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let mut runner = StageRunner::new(&tx, None);
        let out: Option<f64> = runner.run_stage(Stage::Coherence, async { Ok(0.5) }).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn fail_emits_terminal_progress_then_error() {
        let (tx, rx) = mpsc::channel(16);
        let mut runner = StageRunner::new(&tx, None);
        runner.progress("Extracting text...", 32).await.unwrap();
        runner.fail("Extraction failed: boom".into()).await;
        drop(tx);
        let events = drain(rx).await;
        assert_eq!(
            &events[1..],
            &[
                PipelineEvent::progress("Extraction failed: boom", 100),
                PipelineEvent::Error("Extraction failed: boom".into()),
            ]
        );
    }
}
