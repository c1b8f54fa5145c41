//! Staging live particles for the GPU.
//!
//! The shader reads particles `0..live_count` straight out of the storage
//! buffer, so the alive window has to arrive as one contiguous,
//! oldest-first run even when it wraps around the end of the ring:
//!
//! ```text
//! ring storage:   [ 5 6 . . . 3 4 ]      first_alive = 5, first_dead = 2
//! staged buffer:  [ 3 4 5 6 ]
//!                   ^^^ tail of storage, then head
//! ```

use std::ops::Range;

use crate::error::EmitterError;
use crate::lifecycle::ParticleRing;
use crate::particle::{Particle, PARTICLE_STRIDE};

/// How the alive window maps onto ring storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// No live particles; nothing to copy.
    Empty,
    /// One copy of `storage[range]` to offset 0.
    Contiguous(Range<usize>),
    /// `storage[older]` to offset 0, then `storage[newer]` right after it.
    Wrapped { older: Range<usize>, newer: Range<usize> },
}

impl UploadPlan {
    pub fn for_ring(ring: &ParticleRing) -> Self {
        let live = ring.live_count();
        if live == 0 {
            return UploadPlan::Empty;
        }
        let start = ring.first_alive();
        if start + live <= ring.capacity() {
            UploadPlan::Contiguous(start..start + live)
        } else {
            UploadPlan::Wrapped {
                older: start..ring.capacity(),
                newer: 0..ring.first_dead(),
            }
        }
    }

    /// Number of records the plan copies.
    pub fn len(&self) -> usize {
        match self {
            UploadPlan::Empty => 0,
            UploadPlan::Contiguous(range) => range.len(),
            UploadPlan::Wrapped { older, newer } => older.len() + newer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bytes needed to stage the ring's live particles.
pub fn staged_size(ring: &ParticleRing) -> usize {
    ring.live_count() * PARTICLE_STRIDE
}

/// Copy the live particles into `dst`, oldest first.
///
/// `dst` is raw bytes because mapped GPU memory carries no alignment
/// guarantee for `Particle`. Returns the number of records written.
pub fn stage_alive(ring: &ParticleRing, dst: &mut [u8]) -> Result<usize, EmitterError> {
    let needed = staged_size(ring);
    if dst.len() < needed {
        return Err(EmitterError::StagingTooSmall {
            needed,
            available: dst.len(),
        });
    }

    let storage = ring.storage();
    let plan = UploadPlan::for_ring(ring);
    match &plan {
        UploadPlan::Empty => {}
        UploadPlan::Contiguous(range) => {
            copy_records(&storage[range.clone()], &mut dst[..needed]);
        }
        UploadPlan::Wrapped { older, newer } => {
            let split = older.len() * PARTICLE_STRIDE;
            copy_records(&storage[older.clone()], &mut dst[..split]);
            copy_records(&storage[newer.clone()], &mut dst[split..needed]);
        }
    }
    Ok(plan.len())
}

fn copy_records(src: &[Particle], dst: &mut [u8]) {
    dst.copy_from_slice(bytemuck::cast_slice(src));
}
