//! UTC time-of-day counter
//!
//! [`TimeOfDay`] is the receiver's running clock: a tick counter that
//! cascades through seconds, minutes, hours, day of year, and year,
//! with leap-minute and leap-year aware rollovers. It free-runs from
//! power-up; [`apply_frame`](TimeOfDay::apply_frame) snaps it to a
//! decoded WWVB frame, after which `has_fix` reports that the displayed
//! time is meaningful.

#[cfg(feature = "chrono")]
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::frame::TimeFrame;
use crate::waveform::TICKS_PER_SECOND;

/// Rollover edges produced by one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickRollover {
    /// The seconds field changed
    pub second: bool,

    /// The minutes field changed
    pub minute: bool,
}

/// UTC date and time, tick resolution
///
/// All fields stay normalized after every operation: `ticks` and
/// `seconds` below 60 (61 during a leap minute), `minutes` below 60,
/// `hours` below 24, `day_of_year` within the current year's length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeOfDay {
    /// Sub-second tick, `0..60`
    pub ticks: u8,

    /// `0..60`, or `0..61` during an announced leap minute
    pub seconds: u8,

    /// `0..60`
    pub minutes: u8,

    /// `0..24`
    pub hours: u8,

    /// Ordinal day, `1..=365` (366 in a leap year)
    pub day_of_year: u16,

    /// Full year, e.g. 2017
    pub year: u16,

    /// Daylight-saving time announced by the station; never set by the
    /// frame decoder in this receiver
    pub is_dst: bool,

    /// The current minute contains a 61st second; auto-clears after it
    /// elapses
    pub is_leap_minute: bool,

    /// The current year has 366 days
    pub is_leap_year: bool,

    /// At least one valid frame has been decoded
    pub has_fix: bool,
}

impl TimeOfDay {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            seconds: 0,
            minutes: 0,
            hours: 0,
            day_of_year: 1,
            year: 2000,
            is_dst: false,
            is_leap_minute: false,
            is_leap_year: true,
            has_fix: false,
        }
    }

    /// Advance one tick
    ///
    /// Call exactly once per 60 Hz tick. Returns which coarse fields
    /// rolled over, for edge-flag reporting.
    pub fn tick_time(&mut self) -> TickRollover {
        let mut roll = TickRollover::default();

        self.ticks += 1;
        if self.ticks < TICKS_PER_SECOND as u8 {
            return roll;
        }
        self.ticks = 0;
        self.seconds += 1;
        roll.second = true;

        let seconds_this_minute = if self.is_leap_minute { 61 } else { 60 };
        if self.seconds < seconds_this_minute {
            return roll;
        }
        self.seconds = 0;
        self.is_leap_minute = false;
        self.minutes += 1;
        roll.minute = true;

        if self.minutes < 60 {
            return roll;
        }
        self.minutes = 0;
        self.hours += 1;

        if self.hours < 24 {
            return roll;
        }
        self.hours = 0;
        self.day_of_year += 1;

        if self.day_of_year <= self.days_this_year() {
            return roll;
        }
        self.day_of_year = 1;
        self.year += 1;
        self.is_leap_year = is_leap_year(self.year);

        roll
    }

    /// Snap to a decoded frame
    ///
    /// The frame names the minute at which its first marker was
    /// transmitted; the minute now in progress is one later. The
    /// additional `ticks_delta` covers detection and processing
    /// latency and cascades through all fields.
    pub fn apply_frame(&mut self, frame: &TimeFrame, ticks_delta: u32) {
        self.year = 2000 + frame.year as u16;
        self.is_leap_year = frame.leap_year;
        self.day_of_year = frame.day_of_year;
        self.hours = frame.hours;
        self.minutes = frame.minutes;
        self.seconds = 0;
        self.ticks = 0;

        // the decoded minute has already elapsed
        self.advance_ticks(60 * TICKS_PER_SECOND + ticks_delta);
        self.has_fix = true;
    }

    /// Current month and day of month
    ///
    /// Walks the day-of-year through a days-in-month table. Returns
    /// `(month, day)`, both 1-based.
    pub fn month_day(&self) -> (u8, u8) {
        let mut days_in_month = [31u16, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        if self.is_leap_year {
            days_in_month[1] += 1;
        }

        let mut day = self.day_of_year;
        for (month0, &num_days) in days_in_month.iter().enumerate() {
            if day <= num_days {
                return (month0 as u8 + 1, day as u8);
            }
            day -= num_days;
        }
        (12, 31)
    }

    /// True when the display should be blanked
    ///
    /// Without a fix, the display blanks for the last quarter of every
    /// second, a visible "not yet synchronized" blink.
    pub fn blank_display(&self) -> bool {
        !self.has_fix && self.ticks > 45
    }

    /// Current time as a chrono UTC timestamp
    ///
    /// Returns `None` if the fields do not name a real calendar
    /// instant (e.g. during an uncorrected leap second).
    #[cfg(feature = "chrono")]
    pub fn utc_datetime(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_yo_opt(self.year as i32, self.day_of_year as u32)?;
        let time = date.and_hms_opt(
            self.hours as u32,
            self.minutes as u32,
            self.seconds.min(59) as u32,
        )?;
        Utc.from_local_datetime(&time).single()
    }

    fn days_this_year(&self) -> u16 {
        if self.is_leap_year {
            366
        } else {
            365
        }
    }

    fn advance_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick_time();
        }
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self::new()
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 400 == 0 || year % 100 != 0) && year % 4 == 0
}
