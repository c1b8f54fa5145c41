//! Emitter configuration.
//!
//! An [`EmitterConfig`] fixes the pool size, emission rate and lifetime of an
//! emitter, plus the [`EmissionShape`] that describes how each new particle
//! looks and moves. The shape stays tunable after construction through
//! [`Emitter::shape_mut`](crate::Emitter::shape_mut); capacity does not.
//!
//! # Presets
//!
//! ```ignore
//! let fire = EmitterConfig::fire(Vec3::ZERO);
//! let smoke = EmitterConfig::smoke(Vec3::new(0.0, 0.5, 0.0));
//! let custom = EmitterConfig::new(500, 40.0, 2.0)
//!     .with_velocity(Vec3::new(-0.2, 1.0, -0.2), Vec3::new(0.2, 1.5, 0.2))
//!     .with_acceleration(Vec3::new(0.0, -0.5, 0.0))
//!     .with_burst(3)
//!     .with_seed(42);
//! ```

use glam::{Vec3, Vec4};

use crate::error::EmitterError;
use crate::spawn::ValueRange;
use crate::visuals::BlendMode;

/// Largest pool whose quad indices (`4 * capacity`) still fit in a `u32`.
pub const MAX_CAPACITY: u32 = u32::MAX / 4;

/// How each new particle is initialized and animated.
///
/// All ranges are sampled independently per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionShape {
    /// Spawn offset from the emitter origin.
    pub position: ValueRange<Vec3>,
    /// Initial rotation in radians.
    pub rotation: ValueRange<f32>,
    /// Quad size at birth.
    pub start_scale: ValueRange<f32>,
    /// Quad size at death.
    pub end_scale: ValueRange<f32>,
    /// Rotation speed in radians per second.
    pub angular_velocity: ValueRange<f32>,
    /// Initial velocity.
    pub velocity: ValueRange<Vec3>,
    /// Constant acceleration applied to every particle (gravity, wind).
    pub acceleration: Vec3,
    /// Color at birth (RGBA).
    pub start_color: Vec4,
    /// Color at death (RGBA).
    pub end_color: Vec4,
    /// Particles produced by each spawn event.
    pub burst_count: u32,
    pub blend: BlendMode,
    /// Alpha flicker depth in `[0, 1]`, animated over emitter time.
    pub flicker: f32,
}

impl Default for EmissionShape {
    fn default() -> Self {
        Self {
            position: ValueRange::fixed(Vec3::ZERO),
            rotation: ValueRange::fixed(0.0),
            start_scale: ValueRange::fixed(1.0),
            end_scale: ValueRange::fixed(1.0),
            angular_velocity: ValueRange::fixed(0.0),
            velocity: ValueRange::fixed(Vec3::ZERO),
            acceleration: Vec3::ZERO,
            start_color: Vec4::ONE,
            end_color: Vec4::ONE,
            burst_count: 1,
            blend: BlendMode::Alpha,
            flicker: 0.0,
        }
    }
}

impl EmissionShape {
    /// Check every range and the burst count.
    pub fn validate(&self) -> Result<(), EmitterError> {
        let vec_ranges = [("position", &self.position), ("velocity", &self.velocity)];
        for (field, range) in vec_ranges {
            if !range.is_valid() {
                return Err(EmitterError::InvalidRange { field });
            }
        }

        let scalar_ranges = [
            ("rotation", &self.rotation),
            ("start_scale", &self.start_scale),
            ("end_scale", &self.end_scale),
            ("angular_velocity", &self.angular_velocity),
        ];
        for (field, range) in scalar_ranges {
            if !range.is_valid() {
                return Err(EmitterError::InvalidRange { field });
            }
        }

        if !self.acceleration.is_finite() {
            return Err(EmitterError::InvalidRange { field: "acceleration" });
        }
        if self.burst_count == 0 {
            return Err(EmitterError::InvalidBurstCount);
        }
        if !(0.0..=1.0).contains(&self.flicker) {
            return Err(EmitterError::InvalidRange { field: "flicker" });
        }
        Ok(())
    }
}

/// Construction parameters for an [`Emitter`](crate::Emitter).
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// Maximum number of live particles.
    pub capacity: u32,
    /// Spawn events per second.
    pub emission_rate: f32,
    /// Seconds a particle lives.
    pub max_lifetime: f32,
    /// World-space spawn origin.
    pub origin: Vec3,
    pub shape: EmissionShape,
    /// RNG seed. `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            emission_rate: 10.0,
            max_lifetime: 1.0,
            origin: Vec3::ZERO,
            shape: EmissionShape::default(),
            seed: None,
        }
    }
}

impl EmitterConfig {
    /// Pool of `capacity` particles, `emission_rate` events per second,
    /// each particle living `max_lifetime` seconds.
    pub fn new(capacity: u32, emission_rate: f32, max_lifetime: f32) -> Self {
        Self {
            capacity,
            emission_rate,
            max_lifetime,
            ..Default::default()
        }
    }

    // =========================================================================
    // PRESETS
    // =========================================================================

    /// Rising additive embers, yellow fading to transparent red.
    pub fn fire(origin: Vec3) -> Self {
        Self::new(400, 120.0, 1.5)
            .with_origin(origin)
            .with_position(Vec3::new(-0.15, 0.0, -0.15), Vec3::new(0.15, 0.05, 0.15))
            .with_velocity(Vec3::new(-0.1, 0.6, -0.1), Vec3::new(0.1, 1.0, 0.1))
            .with_rotation(0.0, std::f32::consts::TAU)
            .with_angular_velocity(-1.0, 1.0)
            .with_scale(0.25, 0.35)
            .with_end_scale(0.05, 0.1)
            .with_colors(Vec4::new(1.0, 0.9, 0.3, 1.0), Vec4::new(0.8, 0.15, 0.0, 0.0))
            .with_blend(BlendMode::Additive)
            .with_flicker(0.35)
    }

    /// Slow grey puffs that grow as they rise.
    pub fn smoke(origin: Vec3) -> Self {
        Self::new(200, 20.0, 4.0)
            .with_origin(origin)
            .with_position(Vec3::new(-0.1, 0.0, -0.1), Vec3::new(0.1, 0.0, 0.1))
            .with_velocity(Vec3::new(-0.1, 0.3, -0.1), Vec3::new(0.1, 0.5, 0.1))
            .with_acceleration(Vec3::new(0.05, 0.0, 0.0))
            .with_rotation(0.0, std::f32::consts::TAU)
            .with_angular_velocity(-0.3, 0.3)
            .with_scale(0.3, 0.4)
            .with_end_scale(1.0, 1.4)
            .with_colors(Vec4::new(0.4, 0.4, 0.4, 0.6), Vec4::new(0.15, 0.15, 0.15, 0.0))
    }

    /// Fast, short-lived sparks thrown out in bursts and pulled down by gravity.
    pub fn sparks(origin: Vec3) -> Self {
        Self::new(600, 8.0, 0.8)
            .with_origin(origin)
            .with_velocity(Vec3::new(-1.5, 0.5, -1.5), Vec3::new(1.5, 2.5, 1.5))
            .with_acceleration(Vec3::new(0.0, -4.0, 0.0))
            .with_scale(0.05, 0.08)
            .with_end_scale(0.0, 0.02)
            .with_colors(Vec4::new(1.0, 1.0, 1.0, 1.0), Vec4::new(1.0, 0.6, 0.1, 0.0))
            .with_burst(12)
            .with_blend(BlendMode::Additive)
    }

    /// Water arcing up and falling back.
    pub fn fountain(origin: Vec3) -> Self {
        Self::new(800, 200.0, 2.5)
            .with_origin(origin)
            .with_velocity(Vec3::new(-0.3, 2.2, -0.3), Vec3::new(0.3, 2.8, 0.3))
            .with_acceleration(Vec3::new(0.0, -2.5, 0.0))
            .with_scale(0.06, 0.08)
            .with_end_scale(0.04, 0.06)
            .with_colors(Vec4::new(0.7, 0.85, 1.0, 0.9), Vec4::new(0.2, 0.4, 0.8, 0.0))
    }

    /// Pool sized for one large burst; fire it with
    /// [`Emitter::burst`](crate::Emitter::burst). The rate is a trickle so
    /// the pool stays free for the next explosion.
    pub fn explosion(origin: Vec3, count: u32) -> Self {
        Self::new(count.max(1), 0.001, 1.2)
            .with_origin(origin)
            .with_velocity(Vec3::splat(-3.0), Vec3::splat(3.0))
            .with_acceleration(Vec3::new(0.0, -1.0, 0.0))
            .with_scale(0.08, 0.15)
            .with_end_scale(0.0, 0.0)
            .with_colors(Vec4::new(1.0, 1.0, 0.8, 1.0), Vec4::new(1.0, 0.3, 0.0, 0.0))
            .with_blend(BlendMode::Additive)
    }

    // =========================================================================
    // BUILDER METHODS
    // =========================================================================

    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// Spawn offset range around the origin.
    pub fn with_position(mut self, min: Vec3, max: Vec3) -> Self {
        self.shape.position = ValueRange::new(min, max);
        self
    }

    pub fn with_velocity(mut self, min: Vec3, max: Vec3) -> Self {
        self.shape.velocity = ValueRange::new(min, max);
        self
    }

    pub fn with_rotation(mut self, min: f32, max: f32) -> Self {
        self.shape.rotation = ValueRange::new(min, max);
        self
    }

    pub fn with_angular_velocity(mut self, min: f32, max: f32) -> Self {
        self.shape.angular_velocity = ValueRange::new(min, max);
        self
    }

    /// Birth size range.
    pub fn with_scale(mut self, min: f32, max: f32) -> Self {
        self.shape.start_scale = ValueRange::new(min, max);
        self
    }

    /// Death size range.
    pub fn with_end_scale(mut self, min: f32, max: f32) -> Self {
        self.shape.end_scale = ValueRange::new(min, max);
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.shape.acceleration = acceleration;
        self
    }

    /// Color gradient from birth to death.
    pub fn with_colors(mut self, start: Vec4, end: Vec4) -> Self {
        self.shape.start_color = start;
        self.shape.end_color = end;
        self
    }

    /// Particles per spawn event.
    pub fn with_burst(mut self, count: u32) -> Self {
        self.shape.burst_count = count;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.shape.blend = blend;
        self
    }

    /// Deterministic RNG seed.
    /// Dim particles by up to `depth` of their alpha in a per-particle pulse.
    pub fn with_flicker(mut self, depth: f32) -> Self {
        self.shape.flicker = depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the emitter cannot run with.
    pub fn validate(&self) -> Result<(), EmitterError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(EmitterError::InvalidCapacity(self.capacity));
        }
        if !(self.emission_rate.is_finite() && self.emission_rate > 0.0) {
            return Err(EmitterError::InvalidEmissionRate(self.emission_rate));
        }
        if !(self.max_lifetime.is_finite() && self.max_lifetime > 0.0) {
            return Err(EmitterError::InvalidLifetime(self.max_lifetime));
        }
        self.shape.validate()
    }
}
