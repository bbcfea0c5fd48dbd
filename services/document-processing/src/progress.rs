//! Progress reporting and cooperative cancellation.
//!
//! The pipeline keeps no state between runs; callers observe progress by
//! passing a [`ProgressSink`] into each call.

use finrisk_models::ExtractionMethod;

/// Events emitted while a document moves through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StrategyStarted {
        method: ExtractionMethod,
    },
    PageExtracted {
        method: ExtractionMethod,
        page_number: u32,
        page_count: usize,
    },
    StrategyRejected {
        method: ExtractionMethod,
        reason: String,
    },
    ExtractionCompleted {
        method: ExtractionMethod,
        recovered_pages: usize,
        page_count: usize,
    },
    ChunkingCompleted {
        chunk_count: usize,
    },
    FilterApplied {
        retained: usize,
        fallback: bool,
    },
}

/// Receives progress events and decides whether work should stop.
///
/// `is_cancelled` is polled between page units and between pipeline stages.
pub trait ProgressSink {
    fn on_event(&self, event: &ProgressEvent);

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent),
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Sink that ignores every event and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}
