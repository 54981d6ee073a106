//! # wwvbrx: WWVB time-code reception
//!
//! This crate decodes the [WWVB](https://en.wikipedia.org/wiki/WWVB)
//! 60 kHz time broadcast from an already-demodulated bit stream. Feed
//! it one bi-level envelope sample per 60 Hz tick and it detects the
//! station's one-symbol-per-second amplitude code, assembles and
//! validates 60-symbol minute frames, recovers UTC, and steers a
//! fractional-divider tick period against the broadcast so the local
//! clock stays honest between frames. The learned oscillator
//! calibration can be persisted and restored across power cycles.
//!
//! ## Scope
//!
//! Demodulating the RF carrier is not this crate's job: a hardware
//! receiver module (or a recording of one) supplies the bi-level
//! envelope. Rendering digits is not its job either; see
//! [`TimeSink`]. What remains is the receiver pipeline itself, built
//! to run bit-by-bit from a timer interrupt on small targets and
//! byte-by-byte from files and tests on large ones.
//!
//! ## Example
//!
//! ```
//! use wwvbrx::{ClockEvent, ReceiverBuilder};
//!
//! # let some_bit_source_iterator = || std::iter::once(false);
//! #
//! let mut rx = ReceiverBuilder::new()
//!     .with_score_threshold(70)   // matching bits (of 80) to accept a symbol
//!     .with_seek_detections(10)   // aligned symbols required for bit sync
//!     .with_sync_miss_limit(6)    // missed symbols before reacquiring
//!     .build();
//!
//! // let bits be an iterator of demodulated samples, one per 60 Hz
//! // tick, such as a file reader or a GPIO sampled from a timer ISR
//! let bits = some_bit_source_iterator();
//! for event in rx.iter_events(bits) {
//!     match event {
//!         ClockEvent::FrameDecoded(Ok(frame)) => {
//!             println!("station reports {}", frame);
//!         }
//!         ClockEvent::TickIntervalChanged(params) => {
//!             println!("retune the tick timer to {} scaled counts", params.scaled());
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! On a live device the same receiver runs split across two contexts:
//! the timer interrupt calls [`WwvbReceiver::tick`] with each sampled
//! bit, and the main loop calls [`WwvbReceiver::poll`] to decode
//! frames, persist calibration through a [`CalibStore`], and refresh
//! the display. The tick half never blocks and never touches I/O; the
//! two halves meet only at edge flags that tick sets and poll clears,
//! so the main loop must simply keep the receiver borrowed exclusively
//! (mask the tick interrupt, or run single-threaded) while it services
//! them.
//!
//! ## Crate features
//!
//! * `chrono`: convert the receiver's time of day into
//!   [`chrono`](https://crates.io/crates/chrono) UTC timestamps. If
//!   enabled, `chrono` becomes part of this crate's public API.

mod builder;
mod calib;
mod correlate;
mod discipline;
mod display;
mod frame;
mod receiver;
mod register;
mod scoreboard;
mod symbols;
mod ticksource;
mod timeofday;
mod waveform;

pub use builder::ReceiverBuilder;
pub use calib::{load_params, save_params, CalibError, CalibStore, MemStore};
pub use discipline::{muldiv, ClockParams, DENOM, NOMINAL_SCALED, TIMER_HZ};
pub use display::{local_hours_minutes, refresh, LocalOffset, TimeSink};
pub use frame::{decode_frame, FrameDecodeErr, TimeFrame};
pub use receiver::{ClockEvent, WwvbReceiver};
pub use symbols::{Symbol, SymbolStream, FRAME_SYMBOLS, MARKER_POSITIONS};
pub use ticksource::{SimTicker, TickSource};
pub use timeofday::{TickRollover, TimeOfDay};
pub use waveform::{encode_frame, sample_at, BitGenerator, TICKS_PER_SECOND};
