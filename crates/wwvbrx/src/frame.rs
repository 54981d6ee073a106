//! WWVB frame decoding
//!
//! An aligned frame carries the time of the minute at which the frame
//! began, BCD-coded with one weighted bit per second. Only the fields
//! this receiver consumes are listed; the station's other status bits
//! (DUT1, DST schedule, leap-second warning) pass through as ordinary
//! data symbols and are not decoded.

use std::fmt;

use thiserror::Error;

use crate::symbols::{Symbol, SymbolStream};

// BCD bit weights by frame position, most significant first. Positions
// 1-8 are the minute, 12-18 the hour, 22-33 the day of year, and 45-53
// the two-digit year.
pub(crate) const MINUTE_BITS: [(usize, u16); 7] =
    [(1, 40), (2, 20), (3, 10), (5, 8), (6, 4), (7, 2), (8, 1)];

pub(crate) const HOUR_BITS: [(usize, u16); 6] =
    [(12, 20), (13, 10), (15, 8), (16, 4), (17, 2), (18, 1)];

pub(crate) const DAY_OF_YEAR_BITS: [(usize, u16); 10] = [
    (22, 200),
    (23, 100),
    (25, 80),
    (26, 40),
    (27, 20),
    (28, 10),
    (30, 8),
    (31, 4),
    (32, 2),
    (33, 1),
];

pub(crate) const YEAR_BITS: [(usize, u16); 8] = [
    (45, 80),
    (46, 40),
    (47, 20),
    (48, 10),
    (50, 8),
    (51, 4),
    (52, 2),
    (53, 1),
];

/// Leap-year indicator position
pub(crate) const LEAP_YEAR_POSITION: usize = 55;

/// Time fields decoded from one WWVB frame
///
/// The fields name the UTC minute at which the frame's first marker
/// was transmitted. By the time the frame has been fully received, one
/// minute has elapsed: the minute now in progress is `minutes + 1`.
/// [`TimeOfDay::apply_frame`](crate::timeofday::TimeOfDay::apply_frame)
/// performs that adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeFrame {
    /// Minute of the hour, `0..=59`
    pub minutes: u8,

    /// Hour of the day, `0..=23`
    pub hours: u8,

    /// Ordinal day, `1..=366`
    pub day_of_year: u16,

    /// Last two digits of the year; the century is implicit
    pub year: u8,

    /// Station-announced leap-year indicator
    pub leap_year: bool,
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} UTC day {:03} of 20{:02}",
            self.hours, self.minutes, self.day_of_year, self.year
        )
    }
}

/// Reasons a candidate frame fails to decode
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameDecodeErr {
    /// The symbol buffer is not a structurally valid frame
    #[error("symbol buffer is not frame-aligned")]
    NotAligned,

    /// A BCD field decoded to an impossible value
    ///
    /// Individually plausible symbols can still assemble into
    /// out-of-range BCD, e.g. a minutes-tens digit above five.
    #[error("{field} field out of range: {value}")]
    FieldRange {
        field: &'static str,
        value: u16,
    },
}

/// Decode an aligned frame
///
/// The stream must currently score a full 60; otherwise
/// [`FrameDecodeErr::NotAligned`] is returned. Field values are range
/// checked, since structural validity does not constrain the BCD
/// contents.
pub fn decode_frame(stream: &SymbolStream) -> Result<TimeFrame, FrameDecodeErr> {
    if !stream.is_aligned() {
        return Err(FrameDecodeErr::NotAligned);
    }

    let minutes = field(stream, &MINUTE_BITS);
    let hours = field(stream, &HOUR_BITS);
    let day_of_year = field(stream, &DAY_OF_YEAR_BITS);
    let year = field(stream, &YEAR_BITS);
    let leap_year = stream.symbol(LEAP_YEAR_POSITION) == Symbol::One;

    check("minutes", minutes, 0, 59)?;
    check("hours", hours, 0, 23)?;
    check("day of year", day_of_year, 1, if leap_year { 366 } else { 365 })?;
    check("year", year, 0, 99)?;

    Ok(TimeFrame {
        minutes: minutes as u8,
        hours: hours as u8,
        day_of_year,
        year: year as u8,
        leap_year,
    })
}

// Sum the weights of the ONE bits at the field's positions
fn field(stream: &SymbolStream, weights: &[(usize, u16)]) -> u16 {
    weights
        .iter()
        .map(|&(position, weight)| match stream.symbol(position) {
            Symbol::One => weight,
            _ => 0,
        })
        .sum()
}

fn check(
    field: &'static str,
    value: u16,
    min: u16,
    max: u16,
) -> Result<(), FrameDecodeErr> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FrameDecodeErr::FieldRange { field, value })
    }
}
