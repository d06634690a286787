//! Result sink: the callback surface between the pipeline and its consumer
//!
//! The pipeline holds no UI-visible state of its own; it only emits events
//! through this trait. [`ObservedState`] is a ready-made implementation for
//! consumers that want an observable mirror of readiness and latest results
//! instead of wiring their own.

use crate::error::PipelineError;
use crate::types::{Detection, DetectionResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Callbacks fired by the pipeline.
///
/// `on_initialized` fires exactly once if the pipeline reaches READY and is
/// never followed by another. `on_error` fires once for a fatal
/// initialization failure, or per occurrence for per-frame failures; use
/// [`PipelineError::is_fatal`] to tell them apart. `on_results` fires once
/// per successfully processed frame, and each call supersedes the previous
/// one.
///
/// Callbacks run on the pipeline's dedicated context and should return
/// quickly.
pub trait DetectorListener: Send + Sync {
    fn on_initialized(&self);
    fn on_error(&self, error: &PipelineError);
    fn on_results(&self, results: DetectionResult);
}

/// Observable mirror of the pipeline's readiness and latest results.
///
/// Keeps only the most recent detections (last-write-wins, no merging).
#[derive(Default)]
pub struct ObservedState {
    initialized: AtomicBool,
    failed: AtomicBool,
    detections: Mutex<Vec<Detection>>,
    last_error: Mutex<Option<String>>,
}

impl ObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pipeline reached READY
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Whether the pipeline failed terminally
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Detections from the most recently processed frame
    pub fn latest_detections(&self) -> Vec<Detection> {
        self.detections.lock().unwrap().clone()
    }

    /// Message of the most recent error, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }
}

impl DetectorListener for ObservedState {
    fn on_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    fn on_error(&self, error: &PipelineError) {
        if error.is_fatal() {
            self.failed.store(true, Ordering::Release);
        }
        *self.last_error.lock().unwrap() = Some(error.to_string());
    }

    fn on_results(&self, results: DetectionResult) {
        *self.detections.lock().unwrap() = results.detections;
    }
}
