//! Frame preprocessing: rotation normalization and tensor conversion
//!
//! Converts a raw RGBA camera frame into the NCHW tensor the detector
//! expects. Two transforms, in order: undo the sensor rotation so the image
//! is upright, then convert colorspace/layout and scale to the model input
//! size. Stateless and side-effect free.

use crate::error::{PipelineError, Result};
use crate::types::{Frame, Rotation, TensorInput};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use ndarray::Array4;

/// Preprocessor preparing frames for a detector with a fixed input size
#[derive(Debug, Clone)]
pub struct FramePreprocessor {
    /// Model input size (width, height)
    input_size: (u32, u32),
}

impl FramePreprocessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    pub fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    /// Convert a frame into a model-ready tensor.
    ///
    /// Fails only on malformed input (buffer length not matching the declared
    /// dimensions); such failures are per-frame errors, not pipeline-fatal.
    pub fn prepare(&self, frame: &Frame) -> Result<TensorInput> {
        if !frame.validate() {
            return Err(PipelineError::preprocessing(format!(
                "RGBA buffer length {} does not match {}x{} frame",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }

        let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                PipelineError::preprocessing("failed to wrap frame buffer as RGBA image")
            })?;

        let upright = normalize_rotation(rgba, frame.rotation);
        let (frame_width, frame_height) = upright.dimensions();

        // Drop alpha, then scale to the model input size
        let rgb = DynamicImage::ImageRgba8(upright).to_rgb8();
        let (target_w, target_h) = self.input_size;
        let resized = if rgb.dimensions() == (target_w, target_h) {
            rgb
        } else {
            imageops::resize(&rgb, target_w, target_h, FilterType::Triangle)
        };

        // HWC u8 -> NCHW f32 in [0, 1]
        let mut tensor = Array4::<f32>::zeros((1, 3, target_h as usize, target_w as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        Ok(TensorInput {
            tensor: tensor.into_dyn(),
            frame_width,
            frame_height,
        })
    }
}

/// Rotate the buffer so the image is upright.
///
/// The producer reports how far the sensor output is rotated; undoing it
/// means rotating by -rotation/90 quarter-turns, which for clockwise image
/// ops is a clockwise rotation by the reported angle.
fn normalize_rotation(img: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::Deg0 => img,
        Rotation::Deg90 => imageops::rotate90(&img),
        Rotation::Deg180 => imageops::rotate180(&img),
        Rotation::Deg270 => imageops::rotate270(&img),
    }
}
