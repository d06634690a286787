//! Error types for the detection pipeline

use thiserror::Error;

/// Result type alias for the detection pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur during pipeline operation
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection requested before the pipeline reached READY")]
    NotReady,

    #[error("Frame preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unsupported rotation: {0} degrees (must be a multiple of 90)")]
    InvalidRotation(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn preprocessing<S: Into<String>>(msg: S) -> Self {
        Self::Preprocessing(msg.into())
    }

    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Whether this error terminates the pipeline instance.
    ///
    /// Fatal errors (failed detector construction, bad configuration) move the
    /// pipeline to FAILED permanently; everything else is reported per
    /// occurrence and processing continues with the next frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ModelLoad(_) | Self::Config(_) | Self::Io(_) | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(PipelineError::model_load("missing file").is_fatal());
        assert!(PipelineError::config("bad threshold").is_fatal());
        assert!(!PipelineError::NotReady.is_fatal());
        assert!(!PipelineError::preprocessing("short buffer").is_fatal());
        assert!(!PipelineError::inference("backend hiccup").is_fatal());
        assert!(!PipelineError::InvalidRotation(45).is_fatal());
    }
}
