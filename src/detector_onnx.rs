//! ONNX Runtime detector backend
//!
//! Owns the ort session for the lifetime of a pipeline instance. Constructed
//! once after capability probing; the session is dropped when the pipeline
//! shuts down.

use crate::detector::{class_label, rank_detections, Detector};
use crate::error::{PipelineError, Result};
use crate::types::{
    AccelerationCapability, BoundingBox, Category, Detection, DetectionResult, DetectorConfig,
    TensorInput,
};
use log::{debug, info};
use ndarray::ArrayViewD;
use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
    value::TensorRef,
};
use std::time::Instant;

/// IoU above which two same-class boxes are considered duplicates
const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Object detector backed by an ONNX Runtime session
pub struct OnnxDetector {
    session: Session,
    config: DetectorConfig,
}

impl OnnxDetector {
    /// Construct the detector from a model file.
    ///
    /// GPU acceleration is attempted only when the host probe reported
    /// `GpuCapable` AND the config requests it; in every other case the
    /// session runs on the CPU. The CPU fallback never surfaces as an
    /// error.
    pub fn create(
        config: &DetectorConfig,
        capability: AccelerationCapability,
    ) -> Result<Self> {
        config.validate()?;

        info!("Initializing ONNX Runtime detector");
        info!("Model: {}", config.model_path);

        let builder = base_builder(config)?;

        let want_gpu = config.use_acceleration
            && capability == AccelerationCapability::GpuCapable;

        #[cfg(feature = "cuda")]
        let builder = if want_gpu {
            use log::warn;
            use ort::execution_providers::CUDAExecutionProvider;

            info!("Registering CUDA execution provider");
            match builder.with_execution_providers([CUDAExecutionProvider::default().build()]) {
                Ok(builder) => builder,
                Err(e) => {
                    warn!("CUDA registration failed ({}), continuing on CPU", e);
                    base_builder(config)?
                }
            }
        } else {
            builder
        };

        #[cfg(not(feature = "cuda"))]
        if want_gpu {
            info!("GPU requested but this build carries no CUDA support, using CPU");
        }

        let session = builder
            .commit_from_file(&config.model_path)
            .map_err(|e| PipelineError::model_load(format!("Failed to load model: {}", e)))?;

        info!("Model loaded");

        Ok(Self {
            session,
            config: config.clone(),
        })
    }
}

fn base_builder(config: &DetectorConfig) -> Result<SessionBuilder> {
    Session::builder()
        .map_err(|e| PipelineError::model_load(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| PipelineError::model_load(e.to_string()))?
        .with_intra_threads(config.num_threads)
        .map_err(|e| PipelineError::model_load(e.to_string()))
}

impl Detector for OnnxDetector {
    fn detect(&mut self, input: &TensorInput) -> Result<DetectionResult> {
        debug!(
            "Running inference for {}x{} frame",
            input.frame_width, input.frame_height
        );

        let start = Instant::now();

        let tensor_ref = TensorRef::from_array_view(&input.tensor)
            .map_err(|e| PipelineError::inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| PipelineError::inference(e.to_string()))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| PipelineError::inference(e.to_string()))?
            .into_owned();
        drop(outputs);

        let inference_time_ms = start.elapsed().as_secs_f32() * 1000.0;

        let candidates =
            parse_output(output.view(), self.config.score_threshold)?;
        let deduplicated = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

        // Threshold, ordering, and cap are enforced here, never by callers
        let detections = rank_detections(
            deduplicated,
            self.config.score_threshold,
            self.config.max_results,
        );

        debug!(
            "{} detections in {:.2} ms",
            detections.len(),
            inference_time_ms
        );

        Ok(DetectionResult::new(
            detections,
            inference_time_ms,
            input.frame_width,
            input.frame_height,
        ))
    }

    fn name(&self) -> &str {
        "ONNX Runtime"
    }
}

/// Parse a `[1, 4 + num_classes, num_boxes]` output tensor.
///
/// Each column carries a center-format box in normalized coordinates
/// followed by per-class scores. Classes scoring below the threshold are not
/// reported as category guesses.
fn parse_output(output: ArrayViewD<'_, f32>, score_threshold: f32) -> Result<Vec<Detection>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[1] < 5 {
        return Err(PipelineError::inference(format!(
            "Unexpected output shape: {:?}",
            shape
        )));
    }

    let num_classes = shape[1] - 4;
    let num_boxes = shape[2];
    let mut detections = Vec::new();

    for i in 0..num_boxes {
        let x_center = output[[0, 0, i]];
        let y_center = output[[0, 1, i]];
        let width = output[[0, 2, i]];
        let height = output[[0, 3, i]];

        let mut categories: Vec<Category> = (0..num_classes)
            .filter_map(|c| {
                let score = output[[0, 4 + c, i]];
                (score >= score_threshold).then(|| Category::new(class_label(c), score))
            })
            .collect();

        if categories.is_empty() {
            continue;
        }
        categories.sort_by(|a, b| b.score.total_cmp(&a.score));

        let x = (x_center - width / 2.0).clamp(0.0, 1.0);
        let y = (y_center - height / 2.0).clamp(0.0, 1.0);
        let w = width.clamp(0.0, 1.0 - x);
        let h = height.clamp(0.0, 1.0 - y);

        detections.push(Detection::new(BoundingBox::new(x, y, w, h), categories));
    }

    Ok(detections)
}

/// Greedy NMS over same-class detections
fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.top_score().total_cmp(&a.top_score()));

    let mut keep: Vec<Detection> = Vec::new();

    while !detections.is_empty() {
        let current = detections.remove(0);

        detections.retain(|det| {
            let same_class = det
                .categories
                .first()
                .zip(current.categories.first())
                .map(|(a, b)| a.label == b.label)
                .unwrap_or(false);
            !same_class || current.bbox.iou(&det.bbox) < iou_threshold
        });

        keep.push(current);
    }

    keep
}
