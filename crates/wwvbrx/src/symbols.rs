//! Symbol alphabet and the 60-symbol frame buffer
//!
//! WWVB sends one symbol per second. A frame is one minute: sixty
//! symbols, with MARKERs at fixed positions framing the BCD data bits.
//! The [`SymbolStream`] accumulates detected symbols and scores the
//! buffer's structural validity after every shift; a full score means
//! the buffer holds exactly one well-aligned frame.

use std::fmt;

use arraydeque::{ArrayDeque, Wrapping};

/// Symbols per frame (seconds per minute)
pub const FRAME_SYMBOLS: usize = 60;

/// A full frame-alignment score: every position structurally valid
pub const FRAME_SCORE_MAX: u8 = FRAME_SYMBOLS as u8;

/// Frame positions that must hold a MARKER
pub const MARKER_POSITIONS: [usize; 7] = [0, 9, 19, 29, 39, 49, 59];

/// One received WWVB symbol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Data bit zero (0.2 s high)
    Zero,

    /// Data bit one (0.5 s high)
    One,

    /// Frame/position marker (0.8 s high)
    Marker,

    /// Nothing detected in this symbol slot
    Missing,
}

impl Symbol {
    /// Single-character display form
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Zero => '0',
            Symbol::One => '1',
            Symbol::Marker => 'M',
            Symbol::Missing => '-',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// True if `position` must hold a MARKER in an aligned frame
pub fn is_marker_position(position: usize) -> bool {
    position == 0 || position % 10 == 9
}

/// Sixty-slot symbol FIFO with frame-alignment scoring
///
/// Position 0 is the oldest symbol, position 59 the newest. A new
/// symbol enters at 59 and displaces everything older. After each
/// shift the buffer is rescored: one point for every marker position
/// holding a MARKER and every data position holding a plain bit.
#[derive(Clone, Debug)]
pub struct SymbolStream {
    slots: ArrayDeque<Symbol, FRAME_SYMBOLS, Wrapping>,
    score: u8,
}

impl SymbolStream {
    pub fn new() -> Self {
        let mut slots: ArrayDeque<Symbol, FRAME_SYMBOLS, Wrapping> = ArrayDeque::new();
        while !slots.is_full() {
            let _ = slots.push_back(Symbol::Missing);
        }
        Self { slots, score: 0 }
    }

    /// Append the newest symbol and rescore
    ///
    /// Returns the updated frame-alignment score.
    pub fn shift(&mut self, symbol: Symbol) -> u8 {
        let _ = self.slots.push_back(symbol);

        let mut score = 0u8;
        for (position, &sym) in self.slots.iter().enumerate() {
            let valid = if is_marker_position(position) {
                sym == Symbol::Marker
            } else {
                matches!(sym, Symbol::Zero | Symbol::One)
            };
            score += valid as u8;
        }
        self.score = score;
        score
    }

    /// Current frame-alignment score, in `[0, 60]`
    pub fn frame_score(&self) -> u8 {
        self.score
    }

    /// True when the buffer holds a structurally valid frame
    pub fn is_aligned(&self) -> bool {
        self.score == FRAME_SCORE_MAX
    }

    /// Symbol at `position`; 0 is oldest, 59 is newest
    pub fn symbol(&self, position: usize) -> Symbol {
        *self.slots.get(position).expect("position out of range")
    }
}

impl Default for SymbolStream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SymbolStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sym in self.slots.iter() {
            write!(f, "{}", sym)?;
        }
        Ok(())
    }
}
