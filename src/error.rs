//! Error types for embers.
//!
//! Configuration mistakes are rejected when an emitter is built, GPU
//! failures are fatal for the frame that hit them, and texture errors come
//! from loading sprite images.

use thiserror::Error;

/// Errors raised while configuring, updating or staging an emitter.
#[derive(Debug, Error, PartialEq)]
pub enum EmitterError {
    /// Capacity of zero, or too large to address with 32-bit quad indices.
    #[error("invalid particle capacity {0}: must be between 1 and {max}", max = crate::config::MAX_CAPACITY)]
    InvalidCapacity(u32),
    /// Emission rate that is zero, negative or not finite.
    #[error("invalid emission rate {0}: must be a positive, finite number of particles per second")]
    InvalidEmissionRate(f32),
    /// Particle lifetime that is zero, negative or not finite.
    #[error("invalid particle lifetime {0}: must be a positive, finite number of seconds")]
    InvalidLifetime(f32),
    /// A spawn event that would produce no particles.
    #[error("burst count must be at least 1")]
    InvalidBurstCount,
    /// A min/max range with `min > max` or a non-finite bound.
    #[error("invalid range for `{field}`: min must not exceed max and both must be finite")]
    InvalidRange {
        /// Name of the offending shape field.
        field: &'static str,
    },
    /// Destination of an upload is too small for the live particles.
    #[error("staging buffer holds {available} bytes but {needed} are needed")]
    StagingTooSmall {
        /// Bytes required for the live particles.
        needed: usize,
        /// Bytes available in the destination.
        available: usize,
    },
}

/// Errors that can occur during GPU initialization and uploads.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The queue could not provide a writable view of a buffer.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
    /// Staging the particle data failed.
    #[error(transparent)]
    Staging(#[from] EmitterError),
    /// A buffer for the requested capacity would exceed a device limit.
    #[error("{capacity} particles need a {bytes}-byte {buffer} buffer, but the device allows at most {limit} bytes")]
    CapacityExceedsLimits {
        capacity: u32,
        buffer: &'static str,
        bytes: u64,
        limit: u64,
    },
    /// wgpu reported an error while creating renderer resources.
    #[error("failed to create GPU resources: {0}")]
    ResourceCreation(#[from] wgpu::Error),
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode the image.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when running the demo application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Emitter configuration was rejected.
    #[error("emitter error: {0}")]
    Emitter(#[from] EmitterError),
}
