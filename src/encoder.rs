//! Quadrature tick counters shared with interrupt context
//!
//! Each wheel has one accumulator, written only by that wheel's edge
//! handler and read or zeroed only by the foreground control loop. The
//! handler does nothing but an atomic increment or decrement; all filtering
//! and control math happens in the foreground.
//!
//! # Usage
//!
//! ```rust
//! use micromouse::{EncoderCounter, Wheel};
//!
//! static ENCODERS: EncoderCounter = EncoderCounter::new();
//!
//! // edge handler: rising edge on channel A, channel B sampled high
//! ENCODERS.on_rising_edge(Wheel::Left, true);
//!
//! // control loop
//! assert_eq!(ENCODERS.count(Wheel::Left), 1);
//! ENCODERS.reset_all();
//! ```

use core::sync::atomic::{AtomicI32, Ordering};

/// Wheel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wheel {
    Left,
    Right,
}

/// Snapshot of both counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelTicks {
    pub left: i32,
    pub right: i32,
}

impl WheelTicks {
    /// Mean travel of both wheels
    pub fn average(&self) -> i32 {
        (self.left + self.right) / 2
    }

    /// Left minus right
    pub fn difference(&self) -> i32 {
        self.left - self.right
    }
}

/// Signed tick totals for the left and right wheel
pub struct EncoderCounter {
    left: AtomicI32,
    right: AtomicI32,
}

impl Default for EncoderCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderCounter {
    /// Both counters at zero, usable in a `static`
    pub const fn new() -> Self {
        Self {
            left: AtomicI32::new(0),
            right: AtomicI32::new(0),
        }
    }

    fn counter(&self, wheel: Wheel) -> &AtomicI32 {
        match wheel {
            Wheel::Left => &self.left,
            Wheel::Right => &self.right,
        }
    }

    /// Record a rising edge of the wheel's leading channel
    ///
    /// `paired_high` is the level of the other channel sampled at the edge;
    /// high means the wheel turns forward.
    pub fn on_rising_edge(&self, wheel: Wheel, paired_high: bool) {
        let step = if paired_high { 1 } else { -1 };
        self.counter(wheel).fetch_add(step, Ordering::Relaxed);
    }

    /// Current count of one wheel
    pub fn count(&self, wheel: Wheel) -> i32 {
        self.counter(wheel).load(Ordering::Relaxed)
    }

    /// Both counts, read back to back
    pub fn ticks(&self) -> WheelTicks {
        WheelTicks {
            left: self.count(Wheel::Left),
            right: self.count(Wheel::Right),
        }
    }

    /// Read one wheel's count and zero it in the same operation
    pub fn take(&self, wheel: Wheel) -> i32 {
        self.counter(wheel).swap(0, Ordering::Relaxed)
    }

    /// Zero one wheel's count
    pub fn reset(&self, wheel: Wheel) {
        self.counter(wheel).store(0, Ordering::Relaxed);
    }

    /// Zero both counts
    pub fn reset_all(&self) {
        self.reset(Wheel::Left);
        self.reset(Wheel::Right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_level_selects_direction() {
        let encoders = EncoderCounter::new();
        for _ in 0..5 {
            encoders.on_rising_edge(Wheel::Left, true);
        }
        for _ in 0..3 {
            encoders.on_rising_edge(Wheel::Right, false);
        }

        assert_eq!(encoders.count(Wheel::Left), 5);
        assert_eq!(encoders.count(Wheel::Right), -3);
        assert_eq!(encoders.ticks().difference(), 8);
        assert_eq!(encoders.ticks().average(), 1);
    }

    #[test]
    fn take_zeroes_only_that_wheel() {
        let encoders = EncoderCounter::new();
        encoders.on_rising_edge(Wheel::Left, true);
        encoders.on_rising_edge(Wheel::Right, true);

        assert_eq!(encoders.take(Wheel::Left), 1);
        assert_eq!(encoders.count(Wheel::Left), 0);
        assert_eq!(encoders.count(Wheel::Right), 1);

        encoders.reset_all();
        assert_eq!(encoders.ticks(), WheelTicks::default());
    }

    #[test]
    fn edges_during_a_take_are_kept() {
        static SHARED: EncoderCounter = EncoderCounter::new();
        let mut taken = 0;
        std::thread::scope(|s| {
            let producer = s.spawn(|| {
                for _ in 0..50_000 {
                    SHARED.on_rising_edge(Wheel::Right, true);
                }
            });
            while !producer.is_finished() {
                taken += SHARED.take(Wheel::Right);
            }
        });
        taken += SHARED.take(Wheel::Right);
        assert_eq!(taken, 50_000);
    }

    #[test]
    fn edges_from_other_threads_are_not_lost() {
        static SHARED: EncoderCounter = EncoderCounter::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..10_000 {
                    SHARED.on_rising_edge(Wheel::Left, true);
                }
            });
            s.spawn(|| {
                for _ in 0..10_000 {
                    SHARED.on_rising_edge(Wheel::Right, false);
                }
            });
        });
        assert_eq!(SHARED.count(Wheel::Left), 10_000);
        assert_eq!(SHARED.count(Wheel::Right), -10_000);
    }
}
