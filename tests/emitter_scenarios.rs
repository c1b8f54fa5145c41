//! Integration tests for emitter lifecycle and GPU staging.
//!
//! Everything here runs on the CPU; the GPU only ever sees the bytes that
//! `stage_alive` produces, so these tests check exactly what would be drawn.

use embers::{
    stage_alive, staged_size, Emitter, EmitterConfig, Particle, ParticleRing, UploadPlan, Vec3,
    PARTICLE_STRIDE,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn decode(bytes: &[u8]) -> Vec<Particle> {
    bytes
        .chunks_exact(PARTICLE_STRIDE)
        .map(bytemuck::pod_read_unaligned::<Particle>)
        .collect()
}

fn stage(ring: &ParticleRing) -> Vec<Particle> {
    let mut buf = vec![0u8; ring.capacity() * PARTICLE_STRIDE];
    let written = stage_alive(ring, &mut buf).expect("buffer sized for full ring");
    assert_eq!(written, ring.live_count());
    decode(&buf[..staged_size(ring)])
}

fn assert_indices_consistent(ring: &ParticleRing) {
    assert!(ring.live_count() <= ring.capacity());
    assert_eq!(
        ring.first_dead(),
        (ring.first_alive() + ring.live_count()) % ring.capacity()
    );
}

// ============================================================================
// Invariants under arbitrary frame timing
// ============================================================================

#[test]
fn test_indices_stay_consistent_under_jittery_frames() {
    let mut timing = SmallRng::seed_from_u64(7);
    let mut emitter = Emitter::new(EmitterConfig::new(64, 90.0, 0.7).with_seed(1)).unwrap();

    for _ in 0..2_000 {
        let dt = timing.gen_range(0.0..0.05);
        let stats = emitter.update(dt);
        assert!(stats.spawned <= emitter.capacity());
        assert_indices_consistent(emitter.ring());
    }
}

#[test]
fn test_overflowing_emitter_never_exceeds_capacity() {
    let mut emitter = Emitter::new(
        EmitterConfig::new(16, 500.0, 10.0)
            .with_burst(3)
            .with_seed(2),
    )
    .unwrap();

    let mut dropped = 0;
    for _ in 0..100 {
        let stats = emitter.update(0.02);
        dropped += stats.dropped as u64;
        assert_indices_consistent(emitter.ring());
    }

    assert_eq!(emitter.live_count(), 16);
    assert!(dropped > 0);
    assert_eq!(emitter.dropped_spawns(), dropped);
}

#[test]
fn test_zero_dt_update_is_a_no_op() {
    let mut emitter = Emitter::new(EmitterConfig::new(32, 20.0, 1.0).with_seed(3)).unwrap();
    for _ in 0..17 {
        emitter.update(0.1);
    }

    let before: Vec<Particle> = emitter.ring().iter().copied().collect();
    let (alive, dead) = (emitter.ring().first_alive(), emitter.ring().first_dead());

    let stats = emitter.update(0.0);

    assert_eq!(stats.spawned, 0);
    assert_eq!(stats.died, 0);
    assert_eq!(emitter.ring().first_alive(), alive);
    assert_eq!(emitter.ring().first_dead(), dead);
    let after: Vec<Particle> = emitter.ring().iter().copied().collect();
    assert_eq!(before, after);
}

// ============================================================================
// Staging
// ============================================================================

#[test]
fn test_staged_particles_match_ring_order() {
    let mut emitter = Emitter::new(EmitterConfig::new(10, 10.0, 1.0).with_seed(4)).unwrap();

    let mut saw_contiguous = false;
    let mut saw_wrapped = false;
    for _ in 0..40 {
        emitter.update(0.1);
        match UploadPlan::for_ring(emitter.ring()) {
            UploadPlan::Contiguous(_) => saw_contiguous = true,
            UploadPlan::Wrapped { .. } => saw_wrapped = true,
            UploadPlan::Empty => {}
        }
        let expected: Vec<Particle> = emitter.ring().iter().copied().collect();
        assert_eq!(stage(emitter.ring()), expected);
    }

    assert!(saw_contiguous);
    assert!(saw_wrapped);
}

#[test]
fn test_wrapped_ring_stages_oldest_to_newest() {
    let mut ring = ParticleRing::new(5);
    for i in 0..5 {
        let mut p = Particle::at(Vec3::new(i as f32, 0.0, 0.0));
        // The first two are about to expire.
        p.age = if i < 2 { 0.5 } else { 0.0 };
        ring.push(p).unwrap();
    }
    assert_eq!(ring.age_and_reap(0.5, 1.0), 2);

    for i in 5..7 {
        ring.push(Particle::at(Vec3::new(i as f32, 0.0, 0.0))).unwrap();
    }

    assert_eq!(ring.first_alive(), 2);
    assert_eq!(ring.first_dead(), 2);
    assert_eq!(
        UploadPlan::for_ring(&ring),
        UploadPlan::Wrapped {
            older: 2..5,
            newer: 0..2
        }
    );

    let order: Vec<f32> = stage(&ring).iter().map(|p| p.start_position.x).collect();
    assert_eq!(order, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_staging_into_short_buffer_fails() {
    let mut emitter = Emitter::new(EmitterConfig::new(8, 10.0, 5.0).with_seed(5)).unwrap();
    emitter.burst(4);

    let mut short = vec![0u8; 3 * PARTICLE_STRIDE];
    assert!(stage_alive(emitter.ring(), &mut short).is_err());
}

#[test]
fn test_empty_ring_stages_nothing() {
    let emitter = Emitter::new(EmitterConfig::new(8, 10.0, 1.0)).unwrap();
    let mut buf = [0xAAu8; PARTICLE_STRIDE];
    assert_eq!(stage_alive(emitter.ring(), &mut buf).unwrap(), 0);
    assert!(buf.iter().all(|&b| b == 0xAA));
}

// ============================================================================
// Bursts and sampled attributes
// ============================================================================

#[test]
fn test_burst_event_spawns_sampled_particles() {
    let config = EmitterConfig::new(100, 10.0, 2.0)
        .with_burst(5)
        .with_origin(Vec3::new(0.0, 1.0, 0.0))
        .with_position(Vec3::splat(-0.5), Vec3::splat(0.5))
        .with_velocity(Vec3::new(-1.0, 2.0, -1.0), Vec3::new(1.0, 3.0, 1.0))
        .with_rotation(0.0, 1.0)
        .with_angular_velocity(-2.0, 2.0)
        .with_scale(0.1, 0.2)
        .with_end_scale(0.3, 0.4)
        .with_seed(6);
    let shape = config.shape.clone();
    let origin = config.origin;
    let mut emitter = Emitter::new(config).unwrap();

    let stats = emitter.update(0.1);
    assert_eq!(stats.spawned, 5);
    assert_eq!(emitter.live_count(), 5);

    for p in emitter.ring().iter() {
        assert!(shape.position.contains(p.start_position - origin));
        assert!(shape.velocity.contains(p.velocity));
        assert!(shape.rotation.contains(p.start_rotation));
        assert!(shape.angular_velocity.contains(p.angular_velocity));
        assert!(shape.start_scale.contains(p.start_scale));
        assert!(shape.end_scale.contains(p.end_scale));
        assert_eq!(p.age, 0.0);
    }
}

#[test]
fn test_same_seed_same_particles() {
    let run = || {
        let mut emitter = Emitter::new(EmitterConfig::fire(Vec3::ZERO).with_seed(42)).unwrap();
        for _ in 0..30 {
            emitter.update(1.0 / 60.0);
        }
        emitter.ring().iter().copied().collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_presets_are_valid() {
    let origin = Vec3::ZERO;
    for config in [
        EmitterConfig::fire(origin),
        EmitterConfig::smoke(origin),
        EmitterConfig::sparks(origin),
        EmitterConfig::fountain(origin),
        EmitterConfig::explosion(origin, 64),
    ] {
        assert!(config.validate().is_ok());
        assert!(Emitter::new(config).is_ok());
    }
}
