//! One-shot local analysis (`smca analyze <file>`).
//!
//! Runs the same pipeline the server streams, reports progress on stderr,
//! and prints the aggregated report as JSON on stdout. The input file is
//! never deleted.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::analyzers::create_analyzers;
use crate::config::Config;
use crate::models::{AggregateResult, PipelineEvent};
use crate::pipeline::{Pipeline, RunSource};
use crate::progress::ProgressMode;

/// Analyze a local file and return the aggregated result.
///
/// # Errors
///
/// Returns the run's error message if extraction fails or yields no text.
pub async fn analyze_file(
    config: &Config,
    file: &Path,
    progress: ProgressMode,
) -> Result<AggregateResult> {
    if !file.is_file() {
        bail!("File not found: {}", file.display());
    }

    let analyzers = create_analyzers(config)?;
    let pipeline = Arc::new(Pipeline::new(config, analyzers));
    let reporter = progress.reporter();

    let mut events = pipeline.spawn(RunSource::File(file.to_path_buf()));
    let mut result = None;
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Progress(p) => reporter.report(&p),
            PipelineEvent::Result(r) => result = Some(*r),
            PipelineEvent::Done => break,
            PipelineEvent::Error(message) => bail!("{}", message),
        }
    }

    match result {
        Some(result) => Ok(result),
        None => bail!("Analysis ended without a result"),
    }
}

/// CLI entry point: analyze and print the report to stdout.
pub async fn run_analyze(
    config: &Config,
    file: &Path,
    progress: ProgressMode,
    pretty: bool,
) -> Result<()> {
    let result = analyze_file(config, file, progress).await?;
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", json)?;
    out.flush()?;
    Ok(())
}
