//! Tick source abstraction
//!
//! The receiver does not own a timer. It publishes updated
//! [`ClockParams`] through its event stream, and whatever drives the
//! tick interrupt implements [`TickSource`] to accept the new period.
//! Hiding the timer behind this trait is what lets the whole pipeline
//! run offline: [`SimTicker`] stands in for the hardware and advances
//! a synthetic timebase instead, including a configurable oscillator
//! rate error so discipline behavior can be exercised in tests.

use crate::discipline::{ClockParams, FracDivider, DENOM, TIMER_HZ};

/// A reprogrammable fractional-period tick timer
///
/// Implementations must deliver the fractional cadence exactly: out of
/// every `frac_denom` consecutive periods, `frac_num` last one raw
/// cycle longer than the others, with no long-run rounding drift. A
/// hardware implementation programs its compare register to
/// `period − 1` and invokes its interrupt callback once per period;
/// the callback runs in interrupt context and must finish well inside
/// one tick.
pub trait TickSource {
    /// Program the period to `whole + frac_num/frac_denom` raw cycles
    fn set_period(&mut self, whole: u16, frac_num: u8, frac_denom: u8);
}

/// Simulated tick timer for offline use
///
/// Tracks the real time at which each tick interrupt would fire, given
/// the programmed fractional period and the oscillator's actual rate.
/// A positive `rate_error` models an oscillator running fast: every
/// raw cycle is shorter than nominal, so ticks arrive early.
#[derive(Clone, Debug)]
pub struct SimTicker {
    params: ClockParams,
    divider: FracDivider,
    seconds_per_cycle: f64,
    now: f64,
}

impl SimTicker {
    /// Ticker with a perfect oscillator
    pub fn new() -> Self {
        Self::with_rate_error(0.0)
    }

    /// Ticker whose oscillator runs off-frequency
    ///
    /// `rate_error` is fractional: `1.0e-3` means every period is
    /// 0.1 % shorter than programmed (a fast clock).
    pub fn with_rate_error(rate_error: f64) -> Self {
        Self {
            params: ClockParams::nominal(),
            divider: FracDivider::new(),
            seconds_per_cycle: (1.0 - rate_error) / TIMER_HZ as f64,
            now: 0.0,
        }
    }

    /// Advance to the next tick interrupt
    ///
    /// Returns the simulated time of the tick, in seconds.
    pub fn advance(&mut self) -> f64 {
        let period = self.divider.next_period(&self.params);
        self.now += period as f64 * self.seconds_per_cycle;
        self.now
    }

    /// Simulated time of the most recent tick, in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Currently programmed period
    pub fn params(&self) -> ClockParams {
        self.params
    }
}

impl Default for SimTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SimTicker {
    fn set_period(&mut self, whole: u16, frac_num: u8, frac_denom: u8) {
        debug_assert_eq!(frac_denom as u32, DENOM);
        self.params = ClockParams::new(whole, frac_num);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discipline::NOMINAL_SCALED;

    #[test]
    fn test_nominal_rate_is_60_hz() {
        let mut ticker = SimTicker::new();
        let ticks = 60 * DENOM as usize; // whole number of divider groups
        let mut last = 0.0;
        for _ in 0..ticks {
            last = ticker.advance();
        }
        // 3 840 ticks at exactly scaled/64 cycles each
        let expect = ticks as f64 * NOMINAL_SCALED as f64 / DENOM as f64 / TIMER_HZ as f64;
        assert!((last - expect).abs() < 1.0e-9);
        assert!((last - 64.0).abs() < 0.001);
    }

    #[test]
    fn test_fast_oscillator_ticks_early() {
        let mut nominal = SimTicker::new();
        let mut fast = SimTicker::with_rate_error(1.0e-3);
        for _ in 0..6_000 {
            nominal.advance();
            fast.advance();
        }
        let ratio = fast.now() / nominal.now();
        assert!((ratio - 0.999).abs() < 1.0e-9);
    }

    #[test]
    fn test_set_period_takes_effect() {
        let mut ticker = SimTicker::new();
        ticker.set_period(30_000, 0, DENOM as u8);
        assert_eq!(ticker.params().scaled(), 30_000 * DENOM);

        let before = ticker.now();
        ticker.advance();
        let period = ticker.now() - before;
        assert!((period - 30_000.0 / TIMER_HZ as f64).abs() < 1.0e-12);
    }
}
