//! Symbol waveforms and synthetic signal generation
//!
//! Each WWVB symbol is one second of amplitude envelope: high for a
//! symbol-dependent leading pulse, then low for the remainder. This
//! module knows the pulse widths and can synthesize the demodulated
//! bit stream for any symbol pattern, either bit-by-bit or by random
//! access against an absolute timebase. The generators exist for
//! tests and for demo mode; a real antenna produces the same bits.

use crate::frame::{
    TimeFrame, DAY_OF_YEAR_BITS, HOUR_BITS, LEAP_YEAR_POSITION, MINUTE_BITS, YEAR_BITS,
};
use crate::symbols::{Symbol, FRAME_SYMBOLS, MARKER_POSITIONS};

/// Input samples per second, and samples per symbol
pub const TICKS_PER_SECOND: u32 = 60;

impl Symbol {
    /// Leading high-pulse width, in ticks of the 60 Hz sample clock
    pub fn high_ticks(&self) -> u8 {
        match self {
            Symbol::Zero => 12,
            Symbol::One => 30,
            Symbol::Marker => 48,
            Symbol::Missing => 0,
        }
    }
}

/// Demodulated level of a symbol pattern at an absolute sample index
///
/// `sixtieth` counts samples from the start of the pattern; the
/// pattern repeats indefinitely. Random access lets a simulated
/// oscillator with rate error resample the same reference signal at
/// its own (wrong) tick instants.
pub fn sample_at(pattern: &[Symbol], sixtieth: u64) -> bool {
    let second = (sixtieth / TICKS_PER_SECOND as u64) as usize % pattern.len();
    let within = (sixtieth % TICKS_PER_SECOND as u64) as u8;
    within < pattern[second].high_ticks()
}

/// Bit-at-a-time synthetic signal source
///
/// Emits the demodulated envelope of a repeating symbol pattern, one
/// sample per call, for driving the receiver at the nominal rate.
#[derive(Clone, Debug)]
pub struct BitGenerator {
    pattern: Vec<Symbol>,
    position: usize,
    high_left: u8,
    low_left: u8,
}

impl BitGenerator {
    /// Generator looping over `pattern`
    ///
    /// Panics if the pattern is empty.
    pub fn new(pattern: &[Symbol]) -> Self {
        assert!(!pattern.is_empty());
        let mut gen = Self {
            pattern: pattern.to_vec(),
            position: 0,
            high_left: 0,
            low_left: 0,
        };
        gen.load_symbol();
        gen
    }

    /// Next demodulated sample
    pub fn next_bit(&mut self) -> bool {
        if self.high_left > 0 {
            self.high_left -= 1;
            return true;
        }
        if self.low_left > 0 {
            self.low_left -= 1;
            return false;
        }

        // advance to the next symbol, wrapping at the pattern end
        self.position += 1;
        if self.position >= self.pattern.len() {
            self.position = 0;
        }
        self.load_symbol();

        if self.high_left > 0 {
            self.high_left -= 1;
            true
        } else {
            // a Missing symbol renders as a silent second
            self.low_left -= 1;
            false
        }
    }

    fn load_symbol(&mut self) {
        let high = self.pattern[self.position].high_ticks();
        self.high_left = high;
        self.low_left = TICKS_PER_SECOND as u8 - high;
    }
}

impl Iterator for BitGenerator {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        Some(self.next_bit())
    }
}

/// Build the 60-symbol pattern broadcasting `frame`
///
/// The inverse of frame decoding: markers at the marker positions,
/// BCD-weighted ONEs for each time field, ZEROs everywhere else.
pub fn encode_frame(frame: &TimeFrame) -> [Symbol; FRAME_SYMBOLS] {
    let mut symbols = [Symbol::Zero; FRAME_SYMBOLS];
    for &pos in MARKER_POSITIONS.iter() {
        symbols[pos] = Symbol::Marker;
    }

    encode_field(&mut symbols, &MINUTE_BITS, frame.minutes as u16);
    encode_field(&mut symbols, &HOUR_BITS, frame.hours as u16);
    encode_field(&mut symbols, &DAY_OF_YEAR_BITS, frame.day_of_year);
    encode_field(&mut symbols, &YEAR_BITS, frame.year as u16);
    if frame.leap_year {
        symbols[LEAP_YEAR_POSITION] = Symbol::One;
    }

    symbols
}

// Greedy BCD decomposition over descending weights; exact for values
// whose digits are in range.
fn encode_field(symbols: &mut [Symbol; FRAME_SYMBOLS], weights: &[(usize, u16)], value: u16) {
    let mut remaining = value;
    for &(position, weight) in weights {
        if remaining >= weight {
            symbols[position] = Symbol::One;
            remaining -= weight;
        }
    }
    debug_assert_eq!(remaining, 0, "value {} is not BCD-encodable", value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode_frame;
    use crate::symbols::SymbolStream;

    fn test_frame() -> TimeFrame {
        TimeFrame {
            minutes: 35,
            hours: 10,
            day_of_year: 152,
            year: 17,
            leap_year: false,
        }
    }

    #[test]
    fn test_pulse_widths() {
        assert_eq!(Symbol::Zero.high_ticks(), 12);
        assert_eq!(Symbol::One.high_ticks(), 30);
        assert_eq!(Symbol::Marker.high_ticks(), 48);
    }

    #[test]
    fn test_generator_pulse_shape() {
        let mut gen = BitGenerator::new(&[Symbol::Zero, Symbol::One]);

        let first: Vec<bool> = (0..60).map(|_| gen.next_bit()).collect();
        assert!(first[..12].iter().all(|&b| b));
        assert!(first[12..].iter().all(|&b| !b));

        let second: Vec<bool> = (0..60).map(|_| gen.next_bit()).collect();
        assert!(second[..30].iter().all(|&b| b));
        assert!(second[30..].iter().all(|&b| !b));

        // pattern wraps
        let third: Vec<bool> = (0..60).map(|_| gen.next_bit()).collect();
        assert_eq!(third, first);
    }

    #[test]
    fn test_generator_matches_random_access() {
        let pattern = encode_frame(&test_frame());
        let mut gen = BitGenerator::new(&pattern);
        for sixtieth in 0..3 * 60 * 60u64 {
            assert_eq!(gen.next_bit(), sample_at(&pattern, sixtieth));
        }
    }

    #[test]
    fn test_encode_positions() {
        let symbols = encode_frame(&test_frame());

        // minutes 35: tens 3 = 20 + 10 at positions 2, 3; units 5 = 4 + 1
        assert_eq!(symbols[1], Symbol::Zero);
        assert_eq!(symbols[2], Symbol::One);
        assert_eq!(symbols[3], Symbol::One);
        assert_eq!(symbols[5], Symbol::Zero);
        assert_eq!(symbols[6], Symbol::One);
        assert_eq!(symbols[7], Symbol::Zero);
        assert_eq!(symbols[8], Symbol::One);

        // hours 10
        assert_eq!(symbols[12], Symbol::Zero);
        assert_eq!(symbols[13], Symbol::One);
        assert!(symbols[15..=18].iter().all(|&s| s == Symbol::Zero));

        for &pos in MARKER_POSITIONS.iter() {
            assert_eq!(symbols[pos], Symbol::Marker);
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let frames = [
            test_frame(),
            TimeFrame {
                minutes: 0,
                hours: 0,
                day_of_year: 1,
                year: 0,
                leap_year: false,
            },
            TimeFrame {
                minutes: 59,
                hours: 23,
                day_of_year: 366,
                year: 96,
                leap_year: true,
            },
        ];
        for frame in frames {
            let mut stream = SymbolStream::new();
            for &sym in encode_frame(&frame).iter() {
                stream.shift(sym);
            }
            assert_eq!(decode_frame(&stream).expect("decode"), frame);
        }
    }
}
