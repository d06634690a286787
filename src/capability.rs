//! Hardware acceleration capability probing
//!
//! Queried once at pipeline startup, before the detector is constructed.
//! Probing is best-effort by contract: any failure to interrogate the host
//! downgrades to CPU-only instead of propagating an error.

use crate::types::AccelerationCapability;
use log::info;

/// Probe the host for GPU acceleration support.
///
/// Completes exactly once and never fails; a probe error means the
/// accelerator is unusable, which is the same answer as "not present".
#[cfg(feature = "cuda")]
pub async fn probe_acceleration() -> AccelerationCapability {
    use log::warn;
    use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};

    match CUDAExecutionProvider::default().is_available() {
        Ok(true) => {
            info!("CUDA execution provider available, GPU acceleration possible");
            AccelerationCapability::GpuCapable
        }
        Ok(false) => {
            info!("No CUDA execution provider on this host, using CPU");
            AccelerationCapability::CpuOnly
        }
        Err(e) => {
            warn!("Acceleration probe failed ({}), falling back to CPU", e);
            AccelerationCapability::CpuOnly
        }
    }
}

/// Probe the host for GPU acceleration support.
///
/// Built without the `cuda` feature there is no accelerator to probe for.
#[cfg(not(feature = "cuda"))]
pub async fn probe_acceleration() -> AccelerationCapability {
    info!("Built without GPU support, using CPU");
    AccelerationCapability::CpuOnly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_never_fails() {
        // Whatever the host looks like, the probe resolves to a capability.
        let capability = probe_acceleration().await;
        assert!(matches!(
            capability,
            AccelerationCapability::CpuOnly | AccelerationCapability::GpuCapable
        ));
    }
}
