//! Detector trait and shared result-shaping logic
//!
//! The pipeline talks to the inference backend through the [`Detector`]
//! trait, so any engine (ONNX Runtime in production, scripted doubles in
//! tests) can sit behind the scheduler. Score thresholding, ranking, and the
//! result cap live here with the trait: they are the adapter's contract, not
//! the caller's.

use crate::error::Result;
use crate::types::{AccelerationCapability, Detection, DetectionResult, DetectorConfig, TensorInput};

/// Common interface for object detectors
pub trait Detector: Send {
    /// Detect objects in a single prepared frame
    ///
    /// Synchronous and free of pipeline-state side effects. The scheduler
    /// guarantees the pipeline is READY before calling.
    fn detect(&mut self, input: &TensorInput) -> Result<DetectionResult>;

    /// Detector name, for logging
    fn name(&self) -> &str;
}

/// Constructor for the detector used by a pipeline instance.
///
/// Invoked once on the pipeline's dedicated context after capability probing
/// completes. A construction failure is fatal for the pipeline instance.
pub trait DetectorFactory: Send + 'static {
    fn create(
        &self,
        config: &DetectorConfig,
        capability: AccelerationCapability,
    ) -> Result<Box<dyn Detector>>;
}

impl<F> DetectorFactory for F
where
    F: Fn(&DetectorConfig, AccelerationCapability) -> Result<Box<dyn Detector>> + Send + 'static,
{
    fn create(
        &self,
        config: &DetectorConfig,
        capability: AccelerationCapability,
    ) -> Result<Box<dyn Detector>> {
        self(config, capability)
    }
}

/// Apply the configured score threshold and result cap.
///
/// Orders each detection's categories by descending score, drops detections
/// whose best guess is below the threshold, sorts survivors by best score,
/// and truncates to `max_results`.
pub fn rank_detections(
    mut detections: Vec<Detection>,
    score_threshold: f32,
    max_results: usize,
) -> Vec<Detection> {
    for det in &mut detections {
        det.categories
            .sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    detections.retain(|det| det.top_score() >= score_threshold);
    detections.sort_by(|a, b| b.top_score().total_cmp(&a.top_score()));
    detections.truncate(max_results);
    detections
}

/// COCO class names (80 classes); the bundled MobileNet model is COCO-trained
const COCO_CLASSES: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Resolve a class ID to a human-readable label
pub fn class_label(class_id: usize) -> String {
    COCO_CLASSES
        .get(class_id)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("class_{}", class_id))
}
