//! Real-time object detection for live camera streams
//!
//! Streams camera frames through an ONNX object detector and surfaces ranked
//! detections to a listening consumer. The pipeline initializes
//! asynchronously (probing for hardware acceleration first), preprocesses
//! each frame (rotation correction + tensor conversion), and dispatches
//! inference on a dedicated single-consumer context with keep-only-latest
//! backpressure, so a slow model never builds an unbounded frame queue.

pub mod capability;
pub mod detector;
pub mod detector_onnx;
pub mod error;
pub mod listener;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use detector::{Detector, DetectorFactory};
pub use detector_onnx::OnnxDetector;
pub use error::{PipelineError, Result};
pub use listener::{DetectorListener, ObservedState};
pub use pipeline::DetectionPipeline;
pub use preprocessing::FramePreprocessor;
pub use types::{
    AccelerationCapability, BoundingBox, Category, Detection, DetectionResult, DetectorConfig,
    Frame, PipelineState, Rotation, TensorInput,
};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
