//! CPU-side particle emitter.
//!
//! An [`Emitter`] owns a [`ParticleRing`], an [`EmissionScheduler`] and its
//! own RNG. Each frame [`Emitter::update`] ages the live particles, retires
//! the expired ones from the oldest end, and spawns whatever the scheduler
//! says is due. No GPU work happens here; the paired
//! [`EmitterRenderer`](crate::gpu::EmitterRenderer) uploads and draws the
//! result.
//!
//! # Example
//!
//! ```ignore
//! let mut emitter = Emitter::new(EmitterConfig::fire(Vec3::ZERO))?;
//!
//! // In your frame loop:
//! emitter.update(clock.tick());
//! renderer.prepare(&queue, &emitter, &camera)?;
//! renderer.draw(&mut render_pass);
//! ```

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{EmissionShape, EmitterConfig};
use crate::error::EmitterError;
use crate::lifecycle::ParticleRing;
use crate::particle::Particle;
use crate::schedule::EmissionScheduler;

/// What one call to [`Emitter::update`] or [`Emitter::burst`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub spawned: usize,
    pub died: usize,
    /// Spawns refused because the pool was full.
    pub dropped: usize,
}

/// A fixed-capacity particle emitter.
pub struct Emitter {
    ring: ParticleRing,
    scheduler: EmissionScheduler,
    max_lifetime: f32,
    elapsed: f32,
    origin: Vec3,
    shape: EmissionShape,
    rng: SmallRng,
    dropped_spawns: u64,
}

impl Emitter {
    /// Build an emitter, rejecting invalid configurations.
    pub fn new(config: EmitterConfig) -> Result<Self, EmitterError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        log::debug!(
            "emitter created: capacity {}, rate {}/s, lifetime {}s",
            config.capacity,
            config.emission_rate,
            config.max_lifetime
        );

        Ok(Self {
            ring: ParticleRing::new(config.capacity as usize),
            scheduler: EmissionScheduler::new(config.emission_rate)?,
            max_lifetime: config.max_lifetime,
            elapsed: 0.0,
            origin: config.origin,
            shape: config.shape,
            rng,
            dropped_spawns: 0,
        })
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Ages and retires particles first, then spawns. Spawns that would not
    /// fit in the pool are dropped and reported through `log::warn!`.
    /// A negative or non-finite `dt` is ignored.
    pub fn update(&mut self, dt: f32) -> UpdateStats {
        if !(dt.is_finite() && dt >= 0.0) {
            log::debug!("ignoring emitter update with dt = {dt}");
            return UpdateStats::default();
        }

        self.elapsed += dt;
        let died = self.ring.age_and_reap(dt, self.max_lifetime);

        let events = self.scheduler.tick(dt);
        let requested = events as usize * self.shape.burst_count as usize;
        let (spawned, dropped) = self.spawn(requested);

        UpdateStats { spawned, died, dropped }
    }

    /// Spawn `count` particles right now, independent of the emission rate.
    pub fn burst(&mut self, count: u32) -> UpdateStats {
        let (spawned, dropped) = self.spawn(count as usize);
        UpdateStats { spawned, died: 0, dropped }
    }

    fn spawn(&mut self, requested: usize) -> (usize, usize) {
        let mut spawned = 0;
        while spawned < requested && !self.ring.is_full() {
            let particle = self.sample_particle();
            if self.ring.push(particle).is_err() {
                break;
            }
            spawned += 1;
        }

        let dropped = requested - spawned;
        if dropped > 0 {
            self.dropped_spawns += dropped as u64;
            log::warn!(
                "emitter pool full ({} particles): dropped {} of {} spawns",
                self.ring.capacity(),
                dropped,
                requested
            );
        }
        (spawned, dropped)
    }

    fn sample_particle(&mut self) -> Particle {
        let shape = &self.shape;
        let rng = &mut self.rng;
        let mut p = Particle::at(self.origin + shape.position.sample(rng));
        p.start_rotation = shape.rotation.sample(rng);
        p.start_scale = shape.start_scale.sample(rng);
        p.end_scale = shape.end_scale.sample(rng);
        p.angular_velocity = shape.angular_velocity.sample(rng);
        p.velocity = shape.velocity.sample(rng);
        p
    }

    /// Retire every live particle and forget pending spawn time.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.scheduler.reset();
    }

    // ========== Accessors ==========

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.ring.live_count()
    }

    /// Particle ring, for staging and inspection.
    #[inline]
    pub fn ring(&self) -> &ParticleRing {
        &self.ring
    }

    /// Seconds since the emitter was created, fed to the shader.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn max_lifetime(&self) -> f32 {
        self.max_lifetime
    }

    /// Change the particle lifetime. Already-spawned particles are judged
    /// against the new value from the next update on.
    pub fn set_max_lifetime(&mut self, seconds: f32) -> Result<(), EmitterError> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(EmitterError::InvalidLifetime(seconds));
        }
        self.max_lifetime = seconds;
        Ok(())
    }

    #[inline]
    pub fn emission_rate(&self) -> f32 {
        self.scheduler.rate()
    }

    pub fn set_emission_rate(&mut self, rate: f32) -> Result<(), EmitterError> {
        self.scheduler.set_rate(rate)
    }

    /// Time carried towards the next spawn event.
    #[inline]
    pub fn spawn_accumulator(&self) -> f32 {
        self.scheduler.accumulator()
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Move the spawn point. Live particles keep their positions.
    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
    }

    #[inline]
    pub fn shape(&self) -> &EmissionShape {
        &self.shape
    }

    /// Tunable spawn parameters. Changes apply to particles spawned later,
    /// except acceleration, colors and blend mode, which are read at draw time.
    #[inline]
    pub fn shape_mut(&mut self) -> &mut EmissionShape {
        &mut self.shape
    }

    /// Total spawns refused because the pool was full.
    #[inline]
    pub fn dropped_spawns(&self) -> u64 {
        self.dropped_spawns
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("ring", &self.ring)
            .field("scheduler", &self.scheduler)
            .field("max_lifetime", &self.max_lifetime)
            .field("elapsed", &self.elapsed)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::ValueRange;

    fn seeded(capacity: u32, rate: f32, lifetime: f32) -> Emitter {
        Emitter::new(EmitterConfig::new(capacity, rate, lifetime).with_seed(1)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Emitter::new(EmitterConfig::new(0, 10.0, 1.0)).is_err());
        assert!(Emitter::new(EmitterConfig::new(10, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_first_update_below_interval_spawns_nothing() {
        let mut e = seeded(100, 10.0, 1.0);
        let stats = e.update(0.05);
        assert_eq!(stats.spawned, 0);
        assert_eq!(e.live_count(), 0);
    }

    #[test]
    fn test_three_half_intervals_spawn_once() {
        let mut e = seeded(100, 10.0, 1.0);
        for _ in 0..3 {
            e.update(0.05);
        }
        assert_eq!(e.live_count(), 1);
        assert!((e.spawn_accumulator() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_twelve_intervals_retire_two() {
        let mut e = seeded(100, 10.0, 1.0);
        let mut spawned = 0;
        for _ in 0..12 {
            spawned += e.update(0.1).spawned;
        }
        assert_eq!(spawned, 12);
        assert_eq!(e.live_count(), 10);
        assert_eq!(e.ring().first_alive(), 2);
        assert_eq!(e.ring().first_dead(), 12);
    }

    #[test]
    fn test_overflow_is_clamped_and_counted() {
        let mut e = seeded(5, 100.0, 10.0);
        let stats = e.update(0.1);

        assert_eq!(e.live_count(), 5);
        assert_eq!(stats.spawned, 5);
        assert!(stats.dropped >= 4);
        assert_eq!(e.dropped_spawns(), stats.dropped as u64);
    }

    #[test]
    fn test_spawns_at_origin_offset() {
        let mut e = seeded(10, 10.0, 1.0);
        e.set_origin(Vec3::new(5.0, 0.0, 0.0));
        e.shape_mut().position = ValueRange::fixed(Vec3::Y);
        e.update(0.1);

        let p = e.ring().get(0).unwrap();
        assert_eq!(p.start_position, Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(p.age, 0.0);
    }

    #[test]
    fn test_shape_edited_at_runtime_keeps_spawning() {
        let mut e = seeded(50, 10.0, 1.0);
        e.update(0.1);

        e.shape_mut().start_scale = ValueRange::new(2.0, 1.0);
        e.shape_mut().velocity = ValueRange::new(Vec3::ONE, Vec3::splat(f32::NAN));
        e.shape_mut().rotation = ValueRange::new(f32::NEG_INFINITY, f32::INFINITY);
        let stats = e.update(0.1);

        assert_eq!(stats.spawned, 1);
        let p = e.ring().get(1).unwrap();
        assert!((1.0..=2.0).contains(&p.start_scale));
        assert_eq!(p.velocity, Vec3::ONE);
        assert_eq!(p.start_rotation, 0.0);
    }

    #[test]
    fn test_huge_rate_with_long_frame_fills_pool() {
        let mut e = seeded(100, 1.0e9, 1.0);
        let stats = e.update(0.25);

        assert_eq!(stats.spawned, 100);
        assert_eq!(e.live_count(), 100);
        assert!(stats.dropped > 0);
        assert!(e.spawn_accumulator() < 1.0e-8);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut e = seeded(10, 10.0, 1.0);
        e.update(0.1);
        let stats = e.update(-1.0);
        assert_eq!(stats, UpdateStats::default());
        assert_eq!(e.live_count(), 1);
        assert!((e.elapsed() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_manual_burst() {
        let mut e = seeded(10, 1.0, 1.0);
        let stats = e.burst(4);
        assert_eq!(stats.spawned, 4);
        assert_eq!(e.live_count(), 4);

        let stats = e.burst(10);
        assert_eq!(stats.spawned, 6);
        assert_eq!(stats.dropped, 4);
    }

    #[test]
    fn test_setters_validate() {
        let mut e = seeded(10, 1.0, 1.0);
        assert!(e.set_emission_rate(-1.0).is_err());
        assert!(e.set_max_lifetime(0.0).is_err());
        e.set_emission_rate(5.0).unwrap();
        assert_eq!(e.emission_rate(), 5.0);
    }

    #[test]
    fn test_clear() {
        let mut e = seeded(10, 10.0, 1.0);
        e.update(0.3);
        assert!(e.live_count() > 0);
        e.clear();
        assert_eq!(e.live_count(), 0);
        assert_eq!(e.spawn_accumulator(), 0.0);
    }
}
