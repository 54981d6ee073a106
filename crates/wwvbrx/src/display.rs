//! Display glue
//!
//! The receiver core never renders digits. It hands normalized local
//! hours, minutes, and seconds to a [`TimeSink`], and the sink owns
//! the segment packing, shift-register serialization, or terminal
//! printing. [`refresh`] applies the configured local offset and the
//! no-fix blanking rule on the way out; everything past the trait is
//! someone else's hardware.

use crate::timeofday::TimeOfDay;

/// Configured local-time offset from UTC
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalOffset {
    /// Whole hours east of UTC; negative is west
    pub hours: i8,

    /// Additional minutes, for half-hour zones
    pub minutes: i8,

    /// Apply one extra hour while the station announces DST
    pub observe_dst: bool,
}

impl LocalOffset {
    pub fn new(hours: i8, minutes: i8, observe_dst: bool) -> Self {
        Self {
            hours,
            minutes,
            observe_dst,
        }
    }
}

/// A time-of-day display
///
/// Values arrive normalized. Hours are 24-hour local; sinks that show
/// a tens digit should suppress a leading zero. Seconds may be 60
/// during a leap second.
pub trait TimeSink {
    fn set_hours(&mut self, hours: u8);
    fn set_minutes(&mut self, minutes: u8);
    fn set_seconds(&mut self, seconds: u8);

    /// Show nothing; the receiver has no fix
    fn blank(&mut self);
}

/// Local wall-clock hours and minutes
pub fn local_hours_minutes(time: &TimeOfDay, offset: &LocalOffset) -> (u8, u8) {
    let mut total = time.hours as i32 * 60 + time.minutes as i32;
    total += offset.hours as i32 * 60 + offset.minutes as i32;
    if offset.observe_dst && time.is_dst {
        total += 60;
    }
    let total = total.rem_euclid(24 * 60);
    ((total / 60) as u8, (total % 60) as u8)
}

/// Push the current time at a display
///
/// Blanks the sink while the receiver has no fix and the tick phase
/// is in the blanking window; otherwise writes local time.
pub fn refresh<S: TimeSink>(time: &TimeOfDay, offset: &LocalOffset, sink: &mut S) {
    if time.blank_display() {
        sink.blank();
        return;
    }

    let (hours, minutes) = local_hours_minutes(time, offset);
    sink.set_hours(hours);
    sink.set_minutes(minutes);
    sink.set_seconds(time.seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        time: Option<(u8, u8, u8)>,
        blanked: bool,
    }

    impl TimeSink for RecordingSink {
        fn set_hours(&mut self, hours: u8) {
            let t = self.time.get_or_insert((0, 0, 0));
            t.0 = hours;
        }

        fn set_minutes(&mut self, minutes: u8) {
            let t = self.time.get_or_insert((0, 0, 0));
            t.1 = minutes;
        }

        fn set_seconds(&mut self, seconds: u8) {
            let t = self.time.get_or_insert((0, 0, 0));
            t.2 = seconds;
        }

        fn blank(&mut self) {
            self.blanked = true;
            self.time = None;
        }
    }

    fn utc(hours: u8, minutes: u8) -> TimeOfDay {
        TimeOfDay {
            hours,
            minutes,
            seconds: 30,
            has_fix: true,
            ..TimeOfDay::new()
        }
    }

    #[test]
    fn test_western_offset_wraps_date() {
        let offset = LocalOffset::new(-7, 0, false);
        assert_eq!(local_hours_minutes(&utc(3, 15), &offset), (20, 15));
    }

    #[test]
    fn test_half_hour_zone() {
        let offset = LocalOffset::new(5, 30, false);
        assert_eq!(local_hours_minutes(&utc(10, 45), &offset), (16, 15));
    }

    #[test]
    fn test_dst_only_when_observed_and_announced() {
        let mut time = utc(12, 0);
        let observing = LocalOffset::new(-7, 0, true);

        assert_eq!(local_hours_minutes(&time, &observing), (5, 0));
        time.is_dst = true;
        assert_eq!(local_hours_minutes(&time, &observing), (6, 0));

        let ignoring = LocalOffset::new(-7, 0, false);
        assert_eq!(local_hours_minutes(&time, &ignoring), (5, 0));
    }

    #[test]
    fn test_refresh_writes_local_time() {
        let mut sink = RecordingSink::default();
        refresh(&utc(10, 36), &LocalOffset::new(-6, 0, false), &mut sink);
        assert_eq!(sink.time, Some((4, 36, 30)));
        assert!(!sink.blanked);
    }

    #[test]
    fn test_refresh_blanks_without_fix() {
        let mut time = utc(10, 36);
        time.has_fix = false;
        time.ticks = 50;

        let mut sink = RecordingSink::default();
        refresh(&time, &LocalOffset::default(), &mut sink);
        assert!(sink.blanked);
        assert_eq!(sink.time, None);
    }
}
