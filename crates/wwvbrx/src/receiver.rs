//! Full receiver chain
//!
//! [`WwvbReceiver`] owns every piece of pipeline state and advances it
//! one input sample at a time:
//!
//! 1. The sample shifts into the 80-bit register.
//! 2. Three correlators score the register against the ZERO, ONE, and
//!    MARKER templates; each score shifts into that class's
//!    scoreboard.
//! 3. The acquisition state machine reads the scoreboards. In SEEK it
//!    counts center-aligned detections until bit sync is credible; in
//!    SYNC it peeks once per second at the expected symbol time,
//!    records the arrival offset, and feeds the clock discipline.
//! 4. Detected symbols shift into the 60-slot frame buffer, which
//!    raises a flag when it holds a structurally valid frame.
//! 5. The time-of-day counter ticks.
//!
//! [`tick`](WwvbReceiver::tick) is the interrupt body: bounded work,
//! no I/O, no allocation. Everything slow happens in
//! [`poll`](WwvbReceiver::poll), which the background loop calls
//! between ticks to consume edge flags, decode frames, and learn about
//! period changes worth reprogramming the timer or persisting. The
//! two halves communicate only through single-producer flags: `tick`
//! sets, `poll` clears.

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::{println as debug, println as info, println as warn};

use std::fmt;

use crate::builder::ReceiverBuilder;
use crate::correlate::{
    correlate, MARKER_TEMPLATE, ONE_TEMPLATE, TEMPLATE_PAD_BITS, ZERO_TEMPLATE,
};
use crate::discipline::{ClockParams, DENOM};
use crate::frame::{decode_frame, FrameDecodeErr, TimeFrame};
use crate::register::SampleRegister;
use crate::scoreboard::{ScoreBoard, CENTER_SLOT};
use crate::symbols::{Symbol, SymbolStream, FRAME_SCORE_MAX};
use crate::timeofday::TimeOfDay;
use crate::waveform::TICKS_PER_SECOND;

// Ticks between a symbol's last sample arriving and its detection:
// the template keeps scoring for the tail pad, and the peak must
// reach the scoreboard center.
const DETECT_LATENCY_TICKS: u32 = (TEMPLATE_PAD_BITS + CENTER_SLOT) as u32;

/// Receiver status changes, drained by [`WwvbReceiver::poll`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// Enough aligned symbols were detected to begin tracking
    SyncAcquired,

    /// Too many consecutive symbols were missed; reacquiring
    SyncLost,

    /// A candidate frame was decoded
    ///
    /// On success the receiver's time of day has already been set
    /// from the frame. Errors mean the frame buffer was structurally
    /// valid but carried impossible BCD; the pipeline keeps running.
    FrameDecoded(Result<TimeFrame, FrameDecodeErr>),

    /// Clock discipline changed the tick period
    ///
    /// Whoever owns the tick timer should reprogram it with these
    /// parameters.
    TickIntervalChanged(ClockParams),

    /// The calibration has been stable long enough to persist
    PersistRequest(ClockParams),
}

impl fmt::Display for ClockEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockEvent::SyncAcquired => write!(f, "bit sync acquired"),
            ClockEvent::SyncLost => write!(f, "bit sync lost"),
            ClockEvent::FrameDecoded(Ok(frame)) => write!(f, "frame decoded: {}", frame),
            ClockEvent::FrameDecoded(Err(err)) => write!(f, "frame rejected: {}", err),
            ClockEvent::TickIntervalChanged(params) => write!(
                f,
                "tick interval now {} + {}/{} cycles",
                params.whole(),
                params.frac(),
                DENOM
            ),
            ClockEvent::PersistRequest(_) => write!(f, "calibration ready to persist"),
        }
    }
}

// Acquisition state: searching for aligned symbols, or locked on and
// peeking at the expected arrival times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Acquisition {
    Seek {
        detected: u8,
    },
    Sync {
        // ticks until the next symbol peek
        peek_in: u8,
        // consecutive peeks with no symbol
        missed: u8,
        // net symbol-arrival drift since the last discipline pass
        accumulated_offset: i32,
    },
}

// Edge flags crossing the tick/background boundary. The tick path
// only ever sets these; poll() and the take_* accessors clear them.
#[derive(Clone, Copy, Debug, Default)]
struct Flags {
    valid_frame: bool,
    second_changed: bool,
    minute_changed: bool,
    params_unsaved: bool,
    needs_ui_refresh: bool,
    tick_interval_changed: bool,
    sync_acquired: bool,
    sync_lost: bool,
}

fn take(flag: &mut bool) -> bool {
    std::mem::replace(flag, false)
}

/// A complete WWVB receiver pipeline
///
/// Feed one demodulated bit per 60 Hz tick into
/// [`tick`](WwvbReceiver::tick) (or use
/// [`iter_events`](WwvbReceiver::iter_events) to drive the receiver
/// from any bit source) and the receiver acquires symbol alignment,
/// decodes time frames into its [`TimeOfDay`], and disciplines the
/// tick period against the broadcast.
///
/// ```
/// use wwvbrx::{ClockEvent, ReceiverBuilder};
///
/// # let some_bit_source = || std::iter::once(false);
/// let mut rx = ReceiverBuilder::new().build();
///
/// // let bits be an iterator of demodulated samples at 60 Hz
/// let bits = some_bit_source();
/// for event in rx.iter_events(bits) {
///     match event {
///         ClockEvent::FrameDecoded(Ok(frame)) => {
///             println!("station time {}", frame);
///         }
///         _ => {}
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct WwvbReceiver {
    register: SampleRegister,
    zero_board: ScoreBoard,
    one_board: ScoreBoard,
    marker_board: ScoreBoard,
    stream: SymbolStream,
    time: TimeOfDay,
    clock: ClockParams,
    state: Acquisition,
    flags: Flags,

    // lifetime input ticks
    tick_counter: u64,

    // ticks since the last discipline pass (or since tracking began)
    ticks_since_sync: u32,

    // ticks since the calibration was last queued for persistence
    ticks_since_save: u32,

    // tick at which the valid_frame flag was raised
    frame_raised_at: u64,

    score_threshold: u8,
    seek_detections: u8,
    sync_miss_limit: u8,
    drift_trigger: u16,
    min_discipline_ticks: u32,
    persist_after_ticks: u32,
}

impl WwvbReceiver {
    /// Process one input sample
    ///
    /// This is the tick interrupt body: call exactly once per tick
    /// with the demodulated input bit. Never blocks and performs no
    /// I/O; anything slow is deferred to [`poll`](Self::poll) via
    /// edge flags.
    pub fn tick(&mut self, bit: bool) {
        self.register.shift(bit);
        self.zero_board.shift(correlate(&self.register, &ZERO_TEMPLATE));
        self.one_board.shift(correlate(&self.register, &ONE_TEMPLATE));
        self.marker_board.shift(correlate(&self.register, &MARKER_TEMPLATE));

        self.tick_counter += 1;
        self.ticks_since_sync = self.ticks_since_sync.saturating_add(1);
        self.ticks_since_save = self.ticks_since_save.saturating_add(1);

        match self.state {
            Acquisition::Seek { detected } => self.seek_tick(detected),
            Acquisition::Sync {
                peek_in,
                missed,
                accumulated_offset,
            } => self.sync_tick(peek_in, missed, accumulated_offset),
        }

        let roll = self.time.tick_time();
        self.flags.second_changed |= roll.second;
        self.flags.minute_changed |= roll.minute;
        self.flags.needs_ui_refresh = true;
    }

    /// Service the receiver from the background loop
    ///
    /// Consumes one pending edge flag and returns the corresponding
    /// event, or `None` when nothing is pending. Frame decoding
    /// happens here, not in the tick path, and the elapsed ticks
    /// since detection are folded into the decoded time.
    ///
    /// Call repeatedly between ticks until it returns `None`.
    pub fn poll(&mut self) -> Option<ClockEvent> {
        if take(&mut self.flags.sync_acquired) {
            return Some(ClockEvent::SyncAcquired);
        }

        if take(&mut self.flags.sync_lost) {
            return Some(ClockEvent::SyncLost);
        }

        if take(&mut self.flags.valid_frame) {
            let latency =
                DETECT_LATENCY_TICKS + (self.tick_counter - self.frame_raised_at) as u32;
            let result = decode_frame(&self.stream);
            match &result {
                Ok(frame) => {
                    self.time.apply_frame(frame, latency);
                    info!("frame decoded: {}", frame);
                }
                Err(err) => warn!("frame rejected: {}", err),
            }
            return Some(ClockEvent::FrameDecoded(result));
        }

        if take(&mut self.flags.tick_interval_changed) {
            return Some(ClockEvent::TickIntervalChanged(self.clock));
        }

        if take(&mut self.flags.params_unsaved) {
            return Some(ClockEvent::PersistRequest(self.clock));
        }

        None
    }

    /// Decode events from a source of demodulated bits
    ///
    /// Binds an iterator which consumes `input` one sample at a time
    /// and yields each [`ClockEvent`] as it occurs. Returns `None`
    /// when the input is exhausted and no events remain.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter_events<'rx, I>(&'rx mut self, input: I) -> impl Iterator<Item = ClockEvent> + 'rx
    where
        I: IntoIterator<Item = bool> + 'rx,
        I::IntoIter: 'rx,
    {
        WwvbReceiverIter {
            receiver: self,
            source: input.into_iter(),
        }
    }

    /// Current UTC time of day
    pub fn time(&self) -> &TimeOfDay {
        &self.time
    }

    /// Current tick period parameters
    pub fn clock_params(&self) -> ClockParams {
        self.clock
    }

    /// True when locked on and tracking symbols
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, Acquisition::Sync { .. })
    }

    /// Lifetime count of input ticks
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Current frame-alignment score of the symbol buffer
    pub fn frame_score(&self) -> u8 {
        self.stream.frame_score()
    }

    /// Consume the once-per-second edge
    pub fn take_second_changed(&mut self) -> bool {
        take(&mut self.flags.second_changed)
    }

    /// Consume the once-per-minute edge
    pub fn take_minute_changed(&mut self) -> bool {
        take(&mut self.flags.minute_changed)
    }

    /// Consume the display-refresh request
    pub fn take_ui_refresh(&mut self) -> bool {
        take(&mut self.flags.needs_ui_refresh)
    }

    /// Clear all pipeline state and return to acquisition
    ///
    /// The learned clock calibration is kept; everything else resets
    /// to cold-start conditions.
    pub fn reset(&mut self) {
        self.register = SampleRegister::new();
        self.zero_board = ScoreBoard::new();
        self.one_board = ScoreBoard::new();
        self.marker_board = ScoreBoard::new();
        self.stream = SymbolStream::new();
        self.time = TimeOfDay::new();
        self.state = Acquisition::Seek { detected: 0 };
        self.flags = Flags::default();
        self.tick_counter = 0;
        self.ticks_since_sync = 0;
        self.ticks_since_save = 0;
        self.frame_raised_at = 0;
    }

    // Acquisition: count center-aligned detections until tracking is
    // justified. Off-center peaks are ignored entirely.
    fn seek_tick(&mut self, detected: u8) {
        let symbol = match self.center_detect() {
            Some(symbol) => symbol,
            None => return,
        };

        self.push_symbol(symbol);
        let detected = detected + 1;
        debug!(
            "[{:<10}] seek: {} at center ({}/{})",
            self.tick_counter, symbol, detected, self.seek_detections
        );

        if detected >= self.seek_detections {
            info!(
                "[{:<10}] seek: bit sync acquired; entering tracking",
                self.tick_counter
            );
            self.state = Acquisition::Sync {
                peek_in: TICKS_PER_SECOND as u8,
                missed: 0,
                accumulated_offset: 0,
            };
            self.ticks_since_sync = 0;
            self.ticks_since_save = 0;
            self.flags.sync_acquired = true;
        } else {
            self.state = Acquisition::Seek { detected };
        }
    }

    // Tracking: count down to the next expected symbol center, then
    // read all three boards at once.
    fn sync_tick(&mut self, peek_in: u8, missed: u8, accumulated_offset: i32) {
        if self.ticks_since_save >= self.persist_after_ticks {
            self.flags.params_unsaved = true;
            self.ticks_since_save = 0;
        }

        let peek_in = peek_in - 1;
        if peek_in > 0 {
            self.state = Acquisition::Sync {
                peek_in,
                missed,
                accumulated_offset,
            };
            return;
        }

        match self.peek() {
            Some((symbol, offset)) => {
                self.push_symbol(symbol);
                let mut accumulated_offset = accumulated_offset + offset as i32;

                // the peek schedule follows the observed arrival, so
                // a constant rate error shows up as a steady trickle
                // of offsets rather than a growing one
                let next_peek = (TICKS_PER_SECOND as i32 + offset as i32) as u8;

                if accumulated_offset.unsigned_abs() > self.drift_trigger as u32
                    && self.ticks_since_sync > self.min_discipline_ticks
                {
                    self.discipline(accumulated_offset);
                    accumulated_offset = 0;
                }

                self.state = Acquisition::Sync {
                    peek_in: next_peek,
                    missed: 0,
                    accumulated_offset,
                };
            }
            None => {
                self.push_symbol(Symbol::Missing);
                let missed = missed + 1;

                if missed >= self.sync_miss_limit {
                    warn!(
                        "[{:<10}] track: {} consecutive symbols missed; reacquiring",
                        self.tick_counter, missed
                    );
                    self.state = Acquisition::Seek { detected: 0 };
                    self.flags.sync_lost = true;
                } else {
                    debug!(
                        "[{:<10}] track: missed symbol ({}/{})",
                        self.tick_counter, missed, self.sync_miss_limit
                    );
                    self.state = Acquisition::Sync {
                        peek_in: TICKS_PER_SECOND as u8,
                        missed,
                        accumulated_offset,
                    };
                }
            }
        }
    }

    // Rescale the tick period from the accumulated drift. The local
    // clock counted ticks_since_sync ticks; per the broadcast, that
    // interval held accumulated_offset fewer.
    fn discipline(&mut self, accumulated_offset: i32) {
        let local = self.ticks_since_sync;
        let apparent = i64::max(local as i64 - accumulated_offset as i64, 1) as u32;

        let before = self.clock.scaled();
        self.clock.adjust(local, apparent);
        info!(
            "[{:<10}] discipline: offset {:+} over {} ticks; period {} -> {}",
            self.tick_counter,
            accumulated_offset,
            local,
            before,
            self.clock.scaled()
        );

        self.ticks_since_sync = 0;
        self.flags.tick_interval_changed = true;
    }

    // Boards in detection tie-break order
    fn boards(&self) -> [(Symbol, &ScoreBoard); 3] {
        [
            (Symbol::Zero, &self.zero_board),
            (Symbol::One, &self.one_board),
            (Symbol::Marker, &self.marker_board),
        ]
    }

    // SEEK detector: a peak over threshold sitting exactly in the
    // center slot.
    fn center_detect(&self) -> Option<Symbol> {
        for (symbol, board) in self.boards() {
            if let Some((_, index)) = board.max_over_threshold(self.score_threshold) {
                if index == CENTER_SLOT {
                    return Some(symbol);
                }
            }
        }
        None
    }

    // SYNC detector: exactly one board over threshold, anywhere on
    // the board. The peak's distance from center is the drift signal:
    // positive offset means the symbol landed later than expected
    // (the local clock is running fast).
    fn peek(&self) -> Option<(Symbol, i8)> {
        let mut hit = None;
        let mut over = 0u8;
        for (symbol, board) in self.boards() {
            if let Some((_, index)) = board.max_over_threshold(self.score_threshold) {
                over += 1;
                if hit.is_none() {
                    hit = Some((symbol, CENTER_SLOT as i8 - index as i8));
                }
            }
        }

        if over == 1 {
            hit
        } else {
            None
        }
    }

    fn push_symbol(&mut self, symbol: Symbol) {
        let score = self.stream.shift(symbol);
        if score == FRAME_SCORE_MAX {
            debug!("[{:<10}] frame: candidate frame complete", self.tick_counter);
            self.flags.valid_frame = true;
            self.frame_raised_at = self.tick_counter;
        }
    }
}

impl From<&ReceiverBuilder> for WwvbReceiver {
    /// Create the receiver from its builder
    fn from(cfg: &ReceiverBuilder) -> Self {
        Self {
            register: SampleRegister::new(),
            zero_board: ScoreBoard::new(),
            one_board: ScoreBoard::new(),
            marker_board: ScoreBoard::new(),
            stream: SymbolStream::new(),
            time: TimeOfDay::new(),
            clock: cfg.clock_params(),
            state: Acquisition::Seek { detected: 0 },
            flags: Flags::default(),
            tick_counter: 0,
            ticks_since_sync: 0,
            ticks_since_save: 0,
            frame_raised_at: 0,
            score_threshold: cfg.score_threshold(),
            seek_detections: cfg.seek_detections(),
            sync_miss_limit: cfg.sync_miss_limit(),
            drift_trigger: cfg.drift_trigger(),
            min_discipline_ticks: cfg.min_discipline_ticks(),
            persist_after_ticks: cfg.persist_after_ticks(),
        }
    }
}

#[derive(Debug)]
struct WwvbReceiverIter<'rx, I>
where
    I: Iterator<Item = bool>,
{
    source: I,
    receiver: &'rx mut WwvbReceiver,
}

impl<'rx, I> Iterator for WwvbReceiverIter<'rx, I>
where
    I: Iterator<Item = bool>,
{
    type Item = ClockEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.receiver.poll() {
                return Some(event);
            }
            match self.source.next() {
                Some(bit) => self.receiver.tick(bit),
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::discipline::NOMINAL_SCALED;
    use crate::ticksource::{SimTicker, TickSource};
    use crate::waveform::{encode_frame, sample_at, BitGenerator};

    // The frame used throughout: 10:35 UTC, day 152 of 2017
    fn test_frame() -> TimeFrame {
        TimeFrame {
            minutes: 35,
            hours: 10,
            day_of_year: 152,
            year: 17,
            leap_year: false,
        }
    }

    fn ticks(seconds: u32) -> u64 {
        seconds as u64 * TICKS_PER_SECOND as u64
    }

    // xorshift64*, plenty for deterministic bit-flip noise
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x >> 12;
            x ^= x << 25;
            x ^= x >> 27;
            self.0 = x;
            x.wrapping_mul(0x2545_F491_4F6C_DD1D)
        }

        // true with probability num/1000
        fn chance(&mut self, num: u64) -> bool {
            self.next() % 1000 < num
        }
    }

    #[test]
    fn test_clean_signal_acquires_and_decodes() {
        let mut rx = ReceiverBuilder::new().build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));

        let mut sync_at = None;
        let mut frame_at = None;
        for tick in 0..ticks(180) {
            rx.tick(gen.next_bit());
            while let Some(event) = rx.poll() {
                match event {
                    ClockEvent::SyncAcquired => {
                        sync_at.get_or_insert(tick);
                    }
                    ClockEvent::FrameDecoded(Ok(frame)) if frame_at.is_none() => {
                        frame_at = Some(tick);
                        assert_eq!(frame, test_frame());

                        // the minute in progress is decoded + 1, and
                        // the detection latency lands in the ticks
                        let t = rx.time();
                        assert!(t.has_fix);
                        assert_eq!(t.hours, 10);
                        assert_eq!(t.minutes, 36);
                        assert_eq!(t.seconds, 0);
                        assert_eq!(t.ticks, 15);
                        assert_eq!(t.day_of_year, 152);
                        assert_eq!(t.year, 2017);
                        assert!(!t.is_leap_year);
                    }
                    ClockEvent::SyncLost => panic!("sync lost on clean signal"),
                    _ => {}
                }
            }
        }

        // ten detections at one per second, plus pipeline latency
        let sync_at = sync_at.expect("never acquired sync");
        assert!(sync_at <= ticks(11), "sync at tick {}", sync_at);

        // the first full frame needs at most one discarded partial
        // minute plus one clean minute
        let frame_at = frame_at.expect("never decoded a frame");
        assert!(frame_at <= ticks(75), "first frame at tick {}", frame_at);
    }

    #[test]
    fn test_iter_events_clean_signal() {
        let mut rx = ReceiverBuilder::new().build();
        let bits: Vec<bool> = BitGenerator::new(&encode_frame(&test_frame()))
            .take(ticks(80) as usize)
            .collect();

        let events: Vec<ClockEvent> = rx.iter_events(bits).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ClockEvent::SyncAcquired);
        assert_eq!(
            events[1],
            ClockEvent::FrameDecoded(Ok(test_frame()))
        );
    }

    #[test]
    fn test_seek_transitions_at_exact_detection_count() {
        let mut rx = ReceiverBuilder::new().with_seek_detections(3).build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));

        let mut observed = Vec::new();
        for _ in 0..ticks(10) {
            rx.tick(gen.next_bit());
            match rx.state {
                Acquisition::Seek { detected } => {
                    if observed.last() != Some(&detected) {
                        observed.push(detected);
                    }
                }
                Acquisition::Sync { .. } => break,
            }
        }

        // two detections leave us seeking; the third flips the state
        assert_eq!(observed, vec![0, 1, 2]);
        assert!(rx.is_tracking());
    }

    #[test]
    fn test_sync_lost_at_exact_miss_count() {
        let mut rx = ReceiverBuilder::new().build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));

        for _ in 0..ticks(20) {
            rx.tick(gen.next_bit());
        }
        assert!(rx.is_tracking());

        // dead air: every peek misses
        let mut observed = Vec::new();
        let mut lost_after = 0u32;
        while rx.is_tracking() {
            rx.tick(false);
            lost_after += 1;
            assert!(lost_after <= 10 * TICKS_PER_SECOND, "sync never dropped");
            if let Acquisition::Sync { missed, .. } = rx.state {
                if observed.last() != Some(&missed) {
                    observed.push(missed);
                }
            }
        }

        // five misses survive; the sixth drops sync
        assert_eq!(observed, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(rx.poll(), Some(ClockEvent::SyncAcquired));
        assert_eq!(rx.poll(), Some(ClockEvent::SyncLost));
    }

    #[test]
    fn test_sync_loss_and_recovery() {
        let mut rx = ReceiverBuilder::new().build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));

        for _ in 0..ticks(20) {
            rx.tick(gen.next_bit());
        }
        while rx.poll().is_some() {}
        assert!(rx.is_tracking());

        // signal dies mid-broadcast
        let mut lost = false;
        for _ in 0..ticks(8) {
            rx.tick(false);
            while let Some(event) = rx.poll() {
                lost |= event == ClockEvent::SyncLost;
            }
        }
        assert!(lost);
        assert!(!rx.is_tracking());

        // signal returns at an arbitrary phase; reacquire within 15 s
        let mut reacquired_at = None;
        for tick in 0..ticks(20) {
            rx.tick(gen.next_bit());
            while let Some(event) = rx.poll() {
                if event == ClockEvent::SyncAcquired {
                    reacquired_at.get_or_insert(tick);
                }
            }
        }
        let reacquired_at = reacquired_at.expect("never reacquired");
        assert!(
            reacquired_at <= ticks(15),
            "reacquired at tick {}",
            reacquired_at
        );
        assert!(rx.is_tracking());
    }

    #[test]
    fn test_noisy_signal_keeps_sync() {
        // 5 % of input samples flipped at random
        let mut rx = ReceiverBuilder::new().build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

        let mut sync_at = None;
        for tick in 0..ticks(600) {
            let bit = gen.next_bit() ^ rng.chance(50);
            rx.tick(bit);
            while let Some(event) = rx.poll() {
                match event {
                    ClockEvent::SyncAcquired => {
                        sync_at.get_or_insert(tick);
                    }
                    ClockEvent::SyncLost => {
                        panic!("lost sync at tick {} under 5% noise", tick)
                    }
                    _ => {}
                }
            }
        }

        let sync_at = sync_at.expect("never acquired sync");
        assert!(sync_at <= ticks(30), "sync at tick {}", sync_at);
        assert!(rx.is_tracking());
    }

    #[test]
    fn test_fast_oscillator_is_disciplined() {
        // the local oscillator runs 0.1% fast: programmed periods
        // elapse in less real time, so the receiver ticks too often
        // and symbols appear to arrive late
        let mut rx = ReceiverBuilder::new().build();
        let mut ticker = SimTicker::with_rate_error(1.0e-3);
        let pattern = encode_frame(&test_frame());

        let mut scaled_history = vec![rx.clock_params().scaled()];
        for _ in 0..ticks(600) {
            let now = ticker.advance();
            let sixtieth = (now * TICKS_PER_SECOND as f64) as u64;
            rx.tick(sample_at(&pattern, sixtieth));

            while let Some(event) = rx.poll() {
                if let ClockEvent::TickIntervalChanged(params) = event {
                    scaled_history.push(params.scaled());
                    ticker.set_period(params.whole(), params.frac(), DENOM as u8);
                }
            }
        }

        assert!(
            scaled_history.len() >= 2,
            "discipline never adjusted the period"
        );

        // each adjustment raises the period toward the oscillator's
        // true rate, nominal × 1.001
        for pair in scaled_history.windows(2) {
            assert!(pair[1] > pair[0], "period adjustment not monotonic");
        }
        let target = NOMINAL_SCALED as f64 * 1.001;
        let last = *scaled_history.last().unwrap() as f64;
        assert!(last > NOMINAL_SCALED as f64);
        assert!((target - last) / target < 0.01, "period {} vs target {}", last, target);

        // the drift accumulator settled back below the trigger
        match rx.state {
            Acquisition::Sync {
                accumulated_offset, ..
            } => assert!(accumulated_offset.unsigned_abs() <= 15),
            Acquisition::Seek { .. } => panic!("lost sync during discipline test"),
        }
    }

    #[test]
    fn test_persist_requested_after_stable_tracking() {
        let mut rx = ReceiverBuilder::new()
            .with_persist_after_ticks(300)
            .build();
        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));

        let mut persists = 0;
        for _ in 0..ticks(30) {
            rx.tick(gen.next_bit());
            while let Some(event) = rx.poll() {
                if let ClockEvent::PersistRequest(params) = event {
                    assert_eq!(params, rx.clock_params());
                    persists += 1;
                }
            }
        }

        // tracking begins around 11 s; every 5 s thereafter
        assert!(persists >= 2, "expected repeated persist requests");
    }

    #[test]
    fn test_second_and_minute_edges() {
        let mut rx = ReceiverBuilder::new().build();

        assert!(!rx.take_second_changed());
        for _ in 0..TICKS_PER_SECOND {
            rx.tick(false);
        }
        assert!(rx.take_second_changed());
        assert!(!rx.take_second_changed());
        assert!(!rx.take_minute_changed());

        for _ in 0..ticks(59) {
            rx.tick(false);
        }
        assert!(rx.take_minute_changed());
        assert!(rx.take_ui_refresh());
        assert!(!rx.take_ui_refresh());
    }

    #[test]
    fn test_reset_keeps_calibration() {
        let mut rx = ReceiverBuilder::new().build();
        let calibrated = ClockParams::from_scaled(NOMINAL_SCALED + 500);
        rx.clock = calibrated;

        let mut gen = BitGenerator::new(&encode_frame(&test_frame()));
        for _ in 0..ticks(20) {
            rx.tick(gen.next_bit());
        }
        assert!(rx.is_tracking());

        rx.reset();
        assert!(!rx.is_tracking());
        assert_eq!(rx.tick_count(), 0);
        assert_eq!(rx.frame_score(), 0);
        assert_eq!(rx.clock_params(), calibrated);
    }
}
