//! Fixed-rate emission scheduling.
//!
//! Frame times jitter, emission rates don't. [`EmissionScheduler`] keeps the
//! unspent part of each frame in an accumulator and converts whole spawn
//! intervals into discrete events, so the long-run spawn rate matches the
//! configured rate whatever the frame pacing.

use crate::error::EmitterError;

/// Accumulator that turns elapsed time into spawn events.
#[derive(Debug, Clone)]
pub struct EmissionScheduler {
    rate: f32,
    interval: f32,
    accumulator: f32,
}

impl EmissionScheduler {
    /// Create a scheduler emitting `rate` events per second.
    pub fn new(rate: f32) -> Result<Self, EmitterError> {
        check_rate(rate)?;
        Ok(Self {
            rate,
            interval: 1.0 / rate,
            accumulator: 0.0,
        })
    }

    /// Events per second.
    #[inline]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Seconds between events.
    #[inline]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Time carried over towards the next event.
    #[inline]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Change the rate, keeping the accumulated time.
    pub fn set_rate(&mut self, rate: f32) -> Result<(), EmitterError> {
        check_rate(rate)?;
        self.rate = rate;
        self.interval = 1.0 / rate;
        Ok(())
    }

    /// Advance by `dt` seconds and return how many events are due.
    ///
    /// A long frame yields several events at once; the caller decides how
    /// many of them actually fit. The count is computed in one step, so a
    /// tiny interval never turns a hitch into a long loop. Counts beyond
    /// `u32::MAX` are discarded along with their time.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        if self.accumulator < self.interval {
            return 0;
        }

        let acc = f64::from(self.accumulator);
        let interval = f64::from(self.interval);
        let mut events = (acc / interval).floor();
        let mut rest = acc - events * interval;
        // Division rounding can leave the remainder one interval off.
        if rest < 0.0 {
            events -= 1.0;
            rest += interval;
        } else if rest >= interval {
            events += 1.0;
            rest -= interval;
        }

        let rest = rest as f32;
        self.accumulator = if (0.0..self.interval).contains(&rest) {
            rest
        } else {
            0.0
        };
        events.min(f64::from(u32::MAX)) as u32
    }

    /// Drop any accumulated time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

fn check_rate(rate: f32) -> Result<(), EmitterError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(EmitterError::InvalidEmissionRate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(EmissionScheduler::new(0.0).is_err());
        assert!(EmissionScheduler::new(-5.0).is_err());
        assert!(EmissionScheduler::new(f32::NAN).is_err());
        assert!(EmissionScheduler::new(f32::INFINITY).is_err());
    }

    #[test]
    fn test_carries_fractional_time() {
        let mut s = EmissionScheduler::new(10.0).unwrap();
        assert_eq!(s.tick(0.05), 0);
        assert_eq!(s.tick(0.05), 1);
        assert_eq!(s.tick(0.05), 0);
        assert!((s.accumulator() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_one_event_per_interval() {
        let mut s = EmissionScheduler::new(10.0).unwrap();
        let total: u32 = (0..12).map(|_| s.tick(0.1)).sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_hitch_yields_many_events() {
        let mut s = EmissionScheduler::new(100.0).unwrap();
        let events = s.tick(0.5);
        assert!((49..=50).contains(&events));
        assert!(s.accumulator() < s.interval());
    }

    #[test]
    fn test_tiny_interval_hitch_returns_at_once() {
        let mut s = EmissionScheduler::new(1.0e9).unwrap();
        let events = s.tick(0.25);
        let expected = 0.25 / f64::from(s.interval());
        assert!((f64::from(events) - expected).abs() <= 1.0);
        assert!(s.accumulator() >= 0.0);
        assert!(s.accumulator() < s.interval());
    }

    #[test]
    fn test_event_count_saturates() {
        let mut s = EmissionScheduler::new(f32::MAX).unwrap();
        assert_eq!(s.tick(1.0e6), u32::MAX);
        assert!(s.accumulator() < s.interval());
    }

    #[test]
    fn test_long_run_rate_converges() {
        let mut s = EmissionScheduler::new(60.0).unwrap();
        let dts = [0.016, 0.017, 0.033, 0.008, 0.02];
        let mut total = 0;
        let mut time = 0.0;
        for i in 0..1000 {
            let dt = dts[i % dts.len()];
            time += dt;
            total += s.tick(dt);
        }
        let expected = time * 60.0;
        assert!((total as f32 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_set_rate_validates() {
        let mut s = EmissionScheduler::new(10.0).unwrap();
        assert!(s.set_rate(0.0).is_err());
        assert_eq!(s.rate(), 10.0);
        s.set_rate(20.0).unwrap();
        assert!((s.interval() - 0.05).abs() < 1e-7);
    }
}
