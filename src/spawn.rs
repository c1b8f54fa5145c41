//! Randomized spawn attributes.
//!
//! Every attribute of a new particle is drawn from a [`ValueRange`]. A range
//! whose bounds are equal always yields that value, so fixed attributes cost
//! nothing extra to express.
//!
//! Ranges stay editable after an emitter is built, so sampling never
//! panics: inverted bounds are swapped and non-finite bounds fall back to
//! the finite one (or `0.0`).

use glam::Vec3;
use rand::Rng;

/// Inclusive `[min, max]` range sampled independently per particle.
///
/// For vectors each component is sampled on its own, giving a uniform
/// distribution over the axis-aligned box between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy> ValueRange<T> {
    /// Range between `min` and `max`.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Range that always yields `value`.
    pub const fn fixed(value: T) -> Self {
        Self { min: value, max: value }
    }
}

impl ValueRange<f32> {
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Draw a value from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };

        if lo < hi && (hi - lo).is_finite() {
            rng.gen_range(lo..=hi)
        } else if lo.is_finite() {
            lo
        } else if hi.is_finite() {
            hi
        } else {
            0.0
        }
    }
}

impl ValueRange<Vec3> {
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    pub fn contains(&self, value: Vec3) -> bool {
        value.cmpge(self.min).all() && value.cmple(self.max).all()
    }

    /// Draw a vector from the range, one component at a time.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            ValueRange::new(self.min.x, self.max.x).sample(rng),
            ValueRange::new(self.min.y, self.max.y).sample(rng),
            ValueRange::new(self.min.z, self.max.z).sample(rng),
        )
    }
}

impl From<f32> for ValueRange<f32> {
    fn from(value: f32) -> Self {
        Self::fixed(value)
    }
}

impl From<Vec3> for ValueRange<Vec3> {
    fn from(value: Vec3) -> Self {
        Self::fixed(value)
    }
}

impl From<std::ops::RangeInclusive<f32>> for ValueRange<f32> {
    fn from(range: std::ops::RangeInclusive<f32>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

impl From<(Vec3, Vec3)> for ValueRange<Vec3> {
    fn from((min, max): (Vec3, Vec3)) -> Self {
        Self::new(min, max)
    }
}
