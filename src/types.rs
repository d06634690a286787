//! Type definitions for the frame-detection pipeline

use crate::error::{PipelineError, Result};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hardware acceleration available on the host, determined once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccelerationCapability {
    /// No usable accelerator; inference runs on the CPU
    CpuOnly,
    /// A GPU execution provider is available
    GpuCapable,
}

/// Lifecycle state of a pipeline instance
///
/// Transitions: `Uninitialized` → `Initializing` (on construction) → `Ready`
/// (probe + detector setup succeeded) or `Failed` (terminal for this
/// instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Configuration for the object detector
///
/// Immutable once the detector has been constructed; reconfiguring requires
/// building a new pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Minimum top-category score for a detection to be reported (0-1]
    pub score_threshold: f32,

    /// Maximum number of detections per frame
    pub max_results: usize,

    /// Number of threads for CPU inference
    pub num_threads: usize,

    /// Request GPU acceleration when the host supports it
    pub use_acceleration: bool,

    /// Model input size (width, height)
    pub input_size: (u32, u32),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/mobilenetv1.onnx".to_string(),
            score_threshold: 0.5,
            max_results: 3,
            num_threads: 2,
            use_acceleration: true,
            input_size: (320, 320),
        }
    }
}

impl DetectorConfig {
    /// Check configuration bounds before detector construction
    pub fn validate(&self) -> Result<()> {
        if !(self.score_threshold > 0.0 && self.score_threshold <= 1.0) {
            return Err(PipelineError::config(format!(
                "score_threshold must be in (0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.max_results == 0 {
            return Err(PipelineError::config("max_results must be > 0"));
        }
        if self.num_threads == 0 {
            return Err(PipelineError::config("num_threads must be > 0"));
        }
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err(PipelineError::config("input_size must be non-zero"));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}

/// Frame rotation reported by the producer, clockwise degrees
///
/// Camera sensors deliver buffers in sensor orientation; the preprocessor
/// counter-rotates so the image is upright before inference. Rotation is
/// always a multiple of 90; anything else is rejected at this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = PipelineError;

    fn try_from(degrees: i32) -> Result<Self> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(PipelineError::InvalidRotation(other)),
        }
    }
}

/// A single camera frame handed to the pipeline
///
/// Ephemeral: produced by the camera collaborator, consumed by one pipeline
/// pass and discarded. Pixel data is tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw RGBA pixel data, row-major
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Sensor rotation to undo before inference
    pub rotation: Rotation,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, rotation: Rotation) -> Self {
        Self {
            data,
            width,
            height,
            rotation,
        }
    }

    /// Validate buffer length against the declared dimensions
    pub fn validate(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

/// Model-ready representation of a frame: upright, normalized, NCHW layout
#[derive(Debug, Clone)]
pub struct TensorInput {
    /// Input tensor of shape [1, 3, height, width], values in [0, 1]
    pub tensor: ArrayD<f32>,
    /// Upright frame width (after rotation normalization)
    pub frame_width: u32,
    /// Upright frame height (after rotation normalization)
    pub frame_height: u32,
}

/// Bounding box coordinates, normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let x_overlap = self.x < other.x + other.width && self.x + self.width > other.x;
        let y_overlap = self.y < other.y + other.height && self.y + self.height > other.y;
        x_overlap && y_overlap
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if !self.intersects(other) {
            return 0.0;
        }

        let x_left = self.x.max(other.x);
        let y_top = self.y.max(other.y);
        let x_right = (self.x + self.width).min(other.x + other.width);
        let y_bottom = (self.y + self.height).min(other.y + other.height);

        let intersection_area = (x_right - x_left) * (y_bottom - y_top);
        let union_area = self.area() + other.area() - intersection_area;

        intersection_area / union_area
    }
}

/// One ranked category guess for a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    /// Confidence score in [0, 1]
    pub score: f32,
}

impl Category {
    pub fn new<S: Into<String>>(label: S, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A single detected object
///
/// Categories are ordered by descending score; index 0 is the best guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub categories: Vec<Category>,
}

impl Detection {
    pub fn new(bbox: BoundingBox, categories: Vec<Category>) -> Self {
        Self { bbox, categories }
    }

    /// Score of the best category guess
    pub fn top_score(&self) -> f32 {
        self.categories.first().map(|c| c.score).unwrap_or(0.0)
    }
}

/// Detections for one processed frame, ordered by descending top score
///
/// An empty list is a valid result (no objects above threshold) and is
/// distinct from an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    /// Inference time in milliseconds
    pub inference_time_ms: f32,
    /// Upright frame dimensions the boxes are normalized against
    pub frame_width: u32,
    pub frame_height: u32,
}

impl DetectionResult {
    pub fn new(
        detections: Vec<Detection>,
        inference_time_ms: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            detections,
            inference_time_ms,
            frame_width,
            frame_height,
        }
    }

    pub fn count(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_bounds() {
        assert!(DetectorConfig::default().validate().is_ok());

        let mut config = DetectorConfig::default();
        config.score_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.score_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.max_results = 0;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.num_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let path = std::env::temp_dir().join("framewatch_config_test.json");
        let json = serde_json::to_string(&DetectorConfig::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let config = DetectorConfig::from_file(&path).unwrap();
        assert_eq!(config.max_results, 3);
        assert_eq!(config.score_threshold, 0.5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::try_from(0).unwrap(), Rotation::Deg0);
        assert_eq!(Rotation::try_from(90).unwrap(), Rotation::Deg90);
        assert_eq!(Rotation::try_from(180).unwrap(), Rotation::Deg180);
        assert_eq!(Rotation::try_from(270).unwrap(), Rotation::Deg270);
        assert!(matches!(
            Rotation::try_from(45),
            Err(PipelineError::InvalidRotation(45))
        ));
        assert!(Rotation::try_from(360).is_err());
    }

    #[test]
    fn frame_buffer_validation() {
        let frame = Frame::new(vec![0u8; 2 * 3 * 4], 2, 3, Rotation::Deg0);
        assert!(frame.validate());

        let short = Frame::new(vec![0u8; 5], 2, 3, Rotation::Deg0);
        assert!(!short.validate());
    }

    #[test]
    fn bounding_box_iou() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let b = BoundingBox::new(0.25, 0.25, 0.5, 0.5);
        let iou = a.iou(&b);
        assert!(iou > 0.14 && iou < 0.15);

        let c = BoundingBox::new(0.6, 0.6, 0.2, 0.2);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn detection_top_score() {
        let det = Detection::new(
            BoundingBox::new(0.0, 0.0, 0.1, 0.1),
            vec![Category::new("dog", 0.8), Category::new("cat", 0.2)],
        );
        assert_eq!(det.top_score(), 0.8);
    }
}
