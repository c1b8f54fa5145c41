//! Frame clock feeding emitter updates.
//!
//! [`FrameClock`] turns wall-clock frames into the `dt` values passed to
//! [`Emitter::update`](crate::Emitter::update). Long stalls (window drags,
//! breakpoints) are clamped to `max_delta` so a single hitch cannot flood
//! every emitter with a second's worth of spawns.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // In your frame loop:
//! let dt = clock.tick();
//! for emitter in &mut emitters {
//!     emitter.update(dt);
//! }
//! ```

use std::time::{Duration, Instant};

/// Default upper bound for one frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.25;

/// Simulation clock with pause, time scale, fixed step and hitch clamping.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    /// Simulated seconds, the sum of every delta handed out.
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    fixed_delta: Option<f32>,
    time_scale: f32,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Start a new frame and return its simulation delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance(raw, now)
    }

    fn advance(&mut self, raw_delta: f32, now: Instant) -> f32 {
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let step = self.fixed_delta.unwrap_or(raw_delta).min(self.max_delta);
        self.delta_secs = step * self.time_scale;
        self.elapsed_secs += self.delta_secs;
        self.delta_secs
    }

    /// Simulated seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Delta returned by the last [`tick`](Self::tick).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// While paused, `tick` returns 0.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a fixed step instead of wall-clock deltas. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Time scale multiplier; negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Largest unscaled delta a single frame may report.
    pub fn set_max_delta(&mut self, seconds: f32) {
        self.max_delta = seconds.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
