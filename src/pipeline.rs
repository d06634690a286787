//! Inference scheduler: single-consumer frame processing with
//! keep-only-latest backpressure
//!
//! Frames arrive from the camera collaborator on any thread; processing runs
//! exclusively on one dedicated worker. A single-slot pending buffer bounds
//! queue depth: a newer frame overwrites a waiting one, so at most one frame
//! is in flight and at most one is pending. Detector initialization is a
//! two-phase async sequence (capability probe, then construction) that must
//! finish before any frame is processed.

use crate::capability;
use crate::detector::{Detector, DetectorFactory};
use crate::detector_onnx::OnnxDetector;
use crate::error::{PipelineError, Result};
use crate::listener::DetectorListener;
use crate::preprocessing::FramePreprocessor;
use crate::types::{DetectorConfig, Frame, PipelineState};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Log processed/dropped totals every this many frames
const PROGRESS_LOG_INTERVAL: u64 = 100;

/// State shared between the producer-facing handle and the worker
struct Shared {
    state: Mutex<PipelineState>,
    /// Single-slot overwrite buffer for the next frame to process
    pending: Mutex<Option<Frame>>,
    notify: Notify,
    shutdown: AtomicBool,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(PipelineState::Uninitialized),
            pending: Mutex::new(None),
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    fn state(&self) -> PipelineState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap() = state;
    }
}

/// Handle to a running detection pipeline
///
/// Owns the dedicated execution context; dropping the handle shuts the
/// pipeline down, letting any in-flight detection finish first.
pub struct DetectionPipeline {
    shared: Arc<Shared>,
    // Keeps the worker thread alive; dropping it drains the in-flight poll
    _runtime: tokio::runtime::Runtime,
}

impl DetectionPipeline {
    /// Start a pipeline with an injected detector constructor.
    ///
    /// Returns immediately with the pipeline in `Initializing`; probing and
    /// detector construction continue on the dedicated context and resolve
    /// to `Ready` or `Failed` through the listener.
    pub fn spawn<F>(
        config: DetectorConfig,
        factory: F,
        listener: Arc<dyn DetectorListener>,
    ) -> Result<Self>
    where
        F: DetectorFactory,
    {
        let shared = Arc::new(Shared::new());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("framewatch-worker")
            .enable_all()
            .build()?;

        shared.set_state(PipelineState::Initializing);

        let worker_shared = Arc::clone(&shared);
        runtime.spawn(async move {
            worker_loop(worker_shared, config, factory, listener).await;
        });

        Ok(Self {
            shared,
            _runtime: runtime,
        })
    }

    /// Start a pipeline backed by the ONNX Runtime detector
    pub fn spawn_onnx(
        config: DetectorConfig,
        listener: Arc<dyn DetectorListener>,
    ) -> Result<Self> {
        Self::spawn(
            config,
            |config: &DetectorConfig,
             capability: crate::types::AccelerationCapability|
             -> Result<Box<dyn Detector>> {
                OnnxDetector::create(config, capability)
                    .map(|detector| Box::new(detector) as Box<dyn Detector>)
            },
            listener,
        )
    }

    /// Deliver a frame from the camera collaborator.
    ///
    /// Non-blocking and callable from any thread: only swaps the pending
    /// slot. A frame already waiting there is discarded in favor of this one
    /// (keep-only-latest). Frames delivered before the pipeline is ready sit
    /// in the slot until initialization resolves; frames delivered after
    /// shutdown or a terminal failure are ignored.
    pub fn on_frame(&self, frame: Frame) {
        if self.shared.shutdown.load(Ordering::Acquire) {
            debug!("Frame delivered after shutdown, ignoring");
            return;
        }

        let superseded = self.shared.pending.lock().unwrap().replace(frame).is_some();
        if superseded {
            self.shared.frames_dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Pending frame superseded by a newer one");
        }
        self.shared.notify.notify_one();
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Number of frames fully processed so far
    pub fn frames_processed(&self) -> u64 {
        self.shared.frames_processed.load(Ordering::Relaxed)
    }

    /// Number of frames discarded by backpressure
    pub fn frames_dropped(&self) -> u64 {
        self.shared.frames_dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting frames and wind the worker down.
    ///
    /// Cooperative: an in-flight detection finishes naturally before the
    /// detector handle is released. Idempotent.
    pub fn shutdown(&self) {
        if !self.shared.shutdown.swap(true, Ordering::AcqRel) {
            info!("Pipeline shutdown requested");
            self.shared.notify.notify_one();
        }
    }
}

impl Drop for DetectionPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker entry point: two-phase initialization, then the frame loop
async fn worker_loop<F>(
    shared: Arc<Shared>,
    config: DetectorConfig,
    factory: F,
    listener: Arc<dyn DetectorListener>,
) where
    F: DetectorFactory,
{
    // Phase 1: capability probe (best-effort, never fails)
    let capability = capability::probe_acceleration().await;

    // Phase 2: detector construction; failure is terminal for this instance
    let mut detector = match factory.create(&config, capability) {
        Ok(detector) => detector,
        Err(e) => {
            error!("Detector initialization failed: {}", e);
            shared.set_state(PipelineState::Failed);
            shared.shutdown.store(true, Ordering::Release);
            listener.on_error(&e);
            return;
        }
    };

    let preprocessor = FramePreprocessor::new(config.input_size);

    shared.set_state(PipelineState::Ready);
    info!("Pipeline ready ({} backend)", detector.name());
    listener.on_initialized();

    'run: loop {
        let frame = loop {
            if shared.shutdown.load(Ordering::Acquire) {
                break 'run;
            }
            if let Some(frame) = shared.pending.lock().unwrap().take() {
                break frame;
            }
            shared.notify.notified().await;
        };

        process_frame(
            &shared,
            &preprocessor,
            detector.as_mut(),
            listener.as_ref(),
            frame,
        );
    }

    info!(
        "Pipeline worker stopped: {} frames processed, {} dropped",
        shared.frames_processed.load(Ordering::Relaxed),
        shared.frames_dropped.load(Ordering::Relaxed)
    );
    // Detector handle is released here
}

/// Process one frame, converting every failure into a listener notification.
///
/// Nothing may unwind past this point; the worker must survive malformed
/// frames and backend hiccups.
fn process_frame(
    shared: &Shared,
    preprocessor: &FramePreprocessor,
    detector: &mut dyn Detector,
    listener: &dyn DetectorListener,
    frame: Frame,
) {
    if shared.state() != PipelineState::Ready {
        warn!("Frame taken for processing before READY, dropping");
        listener.on_error(&PipelineError::NotReady);
        return;
    }

    let input = match preprocessor.prepare(&frame) {
        Ok(input) => input,
        Err(e) => {
            warn!("Frame preprocessing failed: {}", e);
            listener.on_error(&e);
            return;
        }
    };

    match detector.detect(&input) {
        Ok(results) => {
            let processed = shared.frames_processed.fetch_add(1, Ordering::Relaxed) + 1;
            if processed % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "{} frames processed, {} dropped",
                    processed,
                    shared.frames_dropped.load(Ordering::Relaxed)
                );
            }
            listener.on_results(results);
        }
        Err(e) => {
            warn!("Detection failed: {}", e);
            listener.on_error(&e);
        }
    }
}
