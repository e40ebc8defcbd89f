//! Data models shared across the application.
//!
//! Stage result types and [`AggregateResult`] live in `smca-core`; this
//! module re-exports them and adds the event type a pipeline run emits.

pub use smca_core::models::*;

/// One unit emitted by a pipeline run, in order.
///
/// A run produces zero or more `Progress` events followed by exactly one
/// terminal outcome: `Result` then `Done`, or a single `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    Result(Box<AggregateResult>),
    Done,
    Error(String),
}

impl PipelineEvent {
    pub fn progress(step: impl Into<String>, progress: u8) -> Self {
        PipelineEvent::Progress(ProgressEvent::new(step, progress))
    }

    /// SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::Progress(_) => "progress",
            PipelineEvent::Result(_) => "result",
            PipelineEvent::Done => "done",
            PipelineEvent::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_wire_format() {
        assert_eq!(PipelineEvent::progress("a", 1).name(), "progress");
        assert_eq!(PipelineEvent::Done.name(), "done");
        assert_eq!(PipelineEvent::Error("e".into()).name(), "error");
    }
}
