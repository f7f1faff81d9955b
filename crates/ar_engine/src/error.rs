//! Top-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::gpu::GpuError;

/// Errors surfaced when creating an [`ArRenderer`](crate::session::ArRenderer)
///
/// Nothing after creation returns an error: per-tick failures are logged and
/// absorbed where they happen.
#[derive(Error, Debug)]
pub enum ArError {
    /// World tracking is not available on this device
    #[error("world tracking is not supported on this device")]
    UnsupportedDevice,

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The GPU collaborator could not provide a required resource
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}
