//! Per-particle simulation record.
//!
//! [`Particle`] is laid out to match the `Particle` struct in
//! `particle.wgsl` exactly, so a slice of records can be copied byte for byte
//! into the GPU storage buffer.
//!
//! | Offset | Field | WGSL type |
//! |--------|-------|-----------|
//! | 0 | `start_position` | `vec3<f32>` |
//! | 12 | `start_rotation` | `f32` |
//! | 16 | `velocity` | `vec3<f32>` |
//! | 28 | `angular_velocity` | `f32` |
//! | 32 | `start_scale` | `f32` |
//! | 36 | `end_scale` | `f32` |
//! | 40 | `age` | `f32` |
//! | 44 | `_pad` | `f32` |

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Size in bytes of one particle record, as seen by the shader.
pub const PARTICLE_STRIDE: usize = std::mem::size_of::<Particle>();

/// One slot of the particle ring.
///
/// Everything except `age` is fixed at spawn time; the vertex shader derives
/// the current position, rotation, scale and color from these values and the
/// age.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// World-space position at spawn.
    pub start_position: Vec3,
    /// Rotation around the view axis at spawn, in radians.
    pub start_rotation: f32,
    /// Initial velocity in units per second.
    pub velocity: Vec3,
    /// Rotation speed in radians per second.
    pub angular_velocity: f32,
    /// Quad size at birth.
    pub start_scale: f32,
    /// Quad size at death.
    pub end_scale: f32,
    /// Seconds since spawn.
    pub age: f32,
    _pad: f32,
}

impl Particle {
    /// A freshly spawned particle at `position` with everything else at rest.
    pub fn at(position: Vec3) -> Self {
        Self {
            start_position: position,
            start_scale: 1.0,
            end_scale: 1.0,
            ..Self::zeroed()
        }
    }

    /// Position after `age` seconds under constant `acceleration`.
    ///
    /// Mirrors the vertex shader; used for CPU-side queries and tests.
    pub fn position_at(&self, acceleration: Vec3) -> Vec3 {
        let t = self.age;
        self.start_position + self.velocity * t + 0.5 * acceleration * t * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_matches_wgsl_layout() {
        assert_eq!(PARTICLE_STRIDE, 48);
        assert_eq!(std::mem::align_of::<Particle>(), 4);
    }

    #[test]
    fn test_new_particle_is_unit_scale() {
        let p = Particle::at(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.start_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.start_scale, 1.0);
        assert_eq!(p.end_scale, 1.0);
        assert_eq!(p.age, 0.0);
    }

    #[test]
    fn test_position_integrates_acceleration() {
        let mut p = Particle::at(Vec3::ZERO);
        p.velocity = Vec3::new(1.0, 0.0, 0.0);
        p.age = 2.0;

        let pos = p.position_at(Vec3::new(0.0, -1.0, 0.0));
        assert!((pos - Vec3::new(2.0, -2.0, 0.0)).length() < 1e-6);
    }
}
