//! Progress reporting for `smca analyze`.
//!
//! Pipeline progress is written to **stderr** so stdout stays parseable
//! for scripts that consume the JSON report.

use std::io::Write;

use crate::models::ProgressEvent;

/// Receives progress events from a local pipeline run.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Human-friendly progress on stderr: `[ 53%] Sentiment complete`.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: &ProgressEvent) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", format_human(event));
        let _ = err.flush();
    }
}

fn format_human(event: &ProgressEvent) -> String {
    format!("[{:>3}%] {}", event.progress, event.step)
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: &ProgressEvent) {
        let obj = serde_json::json!({
            "event": "progress",
            "step": event.step,
            "progress": event.progress,
        });
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", obj);
        let _ = err.flush();
    }
}

pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl std::str::FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "invalid progress mode '{}': expected human, json, or off",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_line_is_padded() {
        assert_eq!(
            format_human(&ProgressEvent::new("Text extracted", 35)),
            "[ 35%] Text extracted"
        );
        assert_eq!(
            format_human(&ProgressEvent::new("Analysis complete", 100)),
            "[100%] Analysis complete"
        );
    }

    #[test]
    fn parses_modes() {
        assert_eq!("JSON".parse::<ProgressMode>().unwrap(), ProgressMode::Json);
        assert_eq!("off".parse::<ProgressMode>().unwrap(), ProgressMode::Off);
        assert!("loud".parse::<ProgressMode>().is_err());
    }
}
