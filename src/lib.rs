//! # embers
//!
//! CPU-simulated particle emitters drawn as camera-facing quads with wgpu.
//!
//! Each [`Emitter`] owns a fixed-capacity ring of particles. Particles spawn
//! at a steady rate (plus optional bursts), age every update and die in the
//! order they were born, so the live set is always one contiguous, possibly
//! wrapped, window of the ring. Every frame that window is copied into a GPU
//! storage buffer and expanded into quads by the vertex shader; position,
//! scale, rotation and color are all evaluated on the GPU from a particle's
//! start state and age.
//!
//! ## Quick Start
//!
//! ```ignore
//! use embers::prelude::*;
//!
//! let mut emitter = Emitter::new(
//!     EmitterConfig::new(2_000, 400.0, 1.5)
//!         .with_velocity(Vec3::new(-0.3, 1.0, -0.3), Vec3::new(0.3, 2.0, 0.3))
//!         .with_acceleration(Vec3::new(0.0, -2.0, 0.0))
//!         .with_blend(BlendMode::Additive),
//! )?;
//!
//! // Once, after the device exists:
//! let mut renderer = EmitterRenderer::new(&device, &queue, format, &emitter)?;
//!
//! // Every frame:
//! emitter.update(dt);
//! renderer.prepare(&queue, &emitter, &camera)?;
//! // ... inside the render pass:
//! renderer.draw(&mut render_pass);
//! ```
//!
//! ## Lifecycle
//!
//! [`Emitter::update`] runs in a fixed order:
//!
//! 1. advance the emitter clock by `dt`
//! 2. age every live particle by `dt`
//! 3. retire the oldest particles whose age reached the lifetime
//! 4. ask the [`EmissionScheduler`] how many particles are due
//! 5. spawn them into the free slots of the ring
//!
//! When the ring is full, due spawns are dropped, counted in
//! [`Emitter::dropped_spawns`] and logged at `warn` level.
//!
//! ## Upload
//!
//! [`stage_alive`] writes the live window into a byte slice oldest first,
//! splitting the copy in two when the window wraps past the end of the ring.
//! [`EmitterRenderer::prepare`] points it at a queue staging view, so the
//! GPU never sees dead slots.

pub mod config;
pub mod emitter;
pub mod error;
pub mod gpu;
pub mod lifecycle;
pub mod particle;
pub mod schedule;
pub mod spawn;
pub mod textures;
pub mod time;
pub mod upload;
pub mod visuals;

pub use bytemuck;
pub use glam::{Mat4, Vec2, Vec3, Vec4};

pub use config::{EmissionShape, EmitterConfig, MAX_CAPACITY};
pub use emitter::{Emitter, UpdateStats};
pub use error::{AppError, EmitterError, GpuError, TextureError};
pub use gpu::{Camera, CameraView, EmitterRenderer, EmitterUniforms, GpuContext};
pub use lifecycle::{ParticleRing, RingFull};
pub use particle::{Particle, PARTICLE_STRIDE};
pub use schedule::EmissionScheduler;
pub use spawn::ValueRange;
pub use textures::{AddressMode, FilterMode, TextureConfig};
pub use time::FrameClock;
pub use upload::{stage_alive, staged_size, UploadPlan};
pub use visuals::BlendMode;

/// Common imports for building and drawing emitters.
pub mod prelude {
    pub use crate::config::{EmissionShape, EmitterConfig};
    pub use crate::emitter::{Emitter, UpdateStats};
    pub use crate::error::{EmitterError, GpuError};
    pub use crate::gpu::{Camera, CameraView, EmitterRenderer, GpuContext};
    pub use crate::spawn::ValueRange;
    pub use crate::textures::TextureConfig;
    pub use crate::time::FrameClock;
    pub use crate::visuals::BlendMode;
    pub use crate::{Vec3, Vec4};
}
