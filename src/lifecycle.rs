//! Circular lifecycle tracking for a fixed pool of particles.
//!
//! Particles are spawned in order and age in lockstep, so the live ones
//! always form one contiguous window of the pool when read circularly:
//!
//! ```text
//! not wrapped:  [ . . A A A A . . ]     first_alive = 2, first_dead = 6
//! wrapped:      [ A A . . . A A A ]     first_alive = 5, first_dead = 2
//! ```
//!
//! The oldest particle sits at `first_alive`, the next spawn goes to
//! `first_dead`, and `first_dead == (first_alive + live_count) % capacity`
//! holds after every operation.

use crate::particle::Particle;
use bytemuck::Zeroable;
use std::fmt;

/// Returned by [`ParticleRing::push`] when every slot holds a live particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingFull;

impl fmt::Display for RingFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle ring is full")
    }
}

impl std::error::Error for RingFull {}

/// Fixed-capacity circular store of particle records.
#[derive(Clone)]
pub struct ParticleRing {
    storage: Box<[Particle]>,
    first_alive: usize,
    first_dead: usize,
    live_count: usize,
}

impl ParticleRing {
    /// Create an empty ring with `capacity` slots.
    ///
    /// Callers validate the capacity; a zero-capacity ring accepts no pushes.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![Particle::zeroed(); capacity].into_boxed_slice(),
            first_alive: 0,
            first_dead: 0,
            live_count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Physical index of the oldest live particle.
    #[inline]
    pub fn first_alive(&self) -> usize {
        self.first_alive
    }

    /// Physical index the next spawn will be written to.
    #[inline]
    pub fn first_dead(&self) -> usize {
        self.first_dead
    }

    /// Number of free slots.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.live_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.live_count == self.capacity()
    }

    /// Whether the alive window crosses the end of the storage.
    pub fn is_wrapped(&self) -> bool {
        self.live_count > 0 && self.first_alive + self.live_count > self.capacity()
    }

    /// Age every live particle by `dt` and retire the ones past `max_lifetime`.
    ///
    /// Deaths are counted from the oldest particle forward and stop at the
    /// first survivor. Returns the number of particles retired.
    pub fn age_and_reap(&mut self, dt: f32, max_lifetime: f32) -> usize {
        let capacity = self.capacity();
        let mut deaths = 0;
        let mut reaping = true;

        for i in 0..self.live_count {
            let p = &mut self.storage[(self.first_alive + i) % capacity];
            p.age += dt;

            if reaping {
                if p.age >= max_lifetime {
                    deaths += 1;
                } else {
                    reaping = false;
                }
            }
        }

        if deaths > 0 {
            self.first_alive = (self.first_alive + deaths) % capacity;
            self.live_count -= deaths;
        }
        deaths
    }

    /// Store `particle` in the next free slot.
    ///
    /// Never overwrites a live particle: a full ring returns [`RingFull`].
    pub fn push(&mut self, particle: Particle) -> Result<(), RingFull> {
        if self.is_full() {
            return Err(RingFull);
        }
        self.storage[self.first_dead] = particle;
        self.first_dead = (self.first_dead + 1) % self.capacity();
        self.live_count += 1;
        Ok(())
    }

    /// Live particle at logical position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Particle> {
        if index >= self.live_count {
            return None;
        }
        Some(&self.storage[(self.first_alive + index) % self.capacity()])
    }

    /// The alive window as at most two physical segments, oldest first.
    ///
    /// The second slice is empty unless the window wraps.
    pub fn as_slices(&self) -> (&[Particle], &[Particle]) {
        if self.live_count == 0 {
            return (&[], &[]);
        }
        let end = self.first_alive + self.live_count;
        if end <= self.capacity() {
            (&self.storage[self.first_alive..end], &[])
        } else {
            (
                &self.storage[self.first_alive..],
                &self.storage[..self.first_dead],
            )
        }
    }

    /// Iterate live particles from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        let (head, tail) = self.as_slices();
        head.iter().chain(tail.iter())
    }

    /// Full physical storage, including stale dead slots.
    pub fn storage(&self) -> &[Particle] {
        &self.storage
    }

    /// Retire every particle without touching storage.
    pub fn clear(&mut self) {
        self.first_alive = 0;
        self.first_dead = 0;
        self.live_count = 0;
    }
}

impl fmt::Debug for ParticleRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleRing")
            .field("capacity", &self.capacity())
            .field("first_alive", &self.first_alive)
            .field("first_dead", &self.first_dead)
            .field("live_count", &self.live_count)
            .finish()
    }
}
