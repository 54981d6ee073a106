//! Decoder run loop
//!
//! Drives a [`WwvbReceiver`] from a bit iterator the way firmware
//! would from a timer interrupt: one `tick` per sample, then service
//! every pending event before the next. Decoded frames are printed;
//! persist requests go to the calibration store, if one is
//! configured.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use log::{debug, info, warn};

use wwvbrx::{
    encode_frame, local_hours_minutes, save_params, BitGenerator, ClockEvent, LocalOffset,
    TimeFrame, WwvbReceiver, TICKS_PER_SECOND,
};

use crate::cli::Args;
use crate::store::FileStore;

/// Demo broadcast length, in seconds: long enough to acquire, fill a
/// partial minute, and decode one full frame
const DEMO_SECONDS: u32 = 150;

/// Decode a bit stream until it is exhausted
pub fn run<I>(args: &Args, rx: &mut WwvbReceiver, bits: I, mut store: Option<&mut FileStore>)
where
    I: Iterator<Item = bool>,
{
    let offset = LocalOffset::new(args.tz_hours, args.tz_minutes, args.observe_dst);

    for bit in bits {
        rx.tick(bit);
        while let Some(event) = rx.poll() {
            handle_event(args, rx, &offset, &event, store.as_deref_mut());
        }
    }

    info!(
        "input exhausted after {} ticks; tracking: {}, frame score {}/60",
        rx.tick_count(),
        rx.is_tracking(),
        rx.frame_score()
    );
}

/// Synthesize a clean broadcast of the current minute and decode it
pub fn run_demo(args: &Args, rx: &mut WwvbReceiver, store: Option<&mut FileStore>) {
    let frame = demo_frame(&Utc::now());
    warn!("demo mode: decoding a synthesized broadcast, not a live signal");
    info!("demo broadcast carries {}", frame);

    let bits =
        BitGenerator::new(&encode_frame(&frame)).take((DEMO_SECONDS * TICKS_PER_SECOND) as usize);
    run(args, rx, bits, store);
}

// The frame the station would be transmitting this minute. A frame
// names the minute at its first marker, and a receiver only finishes
// hearing it a minute later, so encode the minute before `now`: the
// decoded clock then lands on the instant the demo was invoked.
fn demo_frame(now: &DateTime<Utc>) -> TimeFrame {
    let start = *now - Duration::minutes(1);
    let year = start.year();
    TimeFrame {
        minutes: start.minute() as u8,
        hours: start.hour() as u8,
        day_of_year: start.ordinal() as u16,
        year: (year % 100) as u8,
        leap_year: (year % 400 == 0 || year % 100 != 0) && year % 4 == 0,
    }
}

/// Map one input byte to a sample
///
/// ASCII `0`/`1` and raw `0x00`/`0x01` are samples; anything else
/// (line endings, spaces, stray bytes) is skipped.
pub fn sample_from_byte(byte: u8) -> Option<bool> {
    match byte {
        b'0' | 0x00 => Some(false),
        b'1' | 0x01 => Some(true),
        _ => None,
    }
}

fn handle_event(
    args: &Args,
    rx: &WwvbReceiver,
    offset: &LocalOffset,
    event: &ClockEvent,
    store: Option<&mut FileStore>,
) {
    match event {
        ClockEvent::FrameDecoded(Ok(_)) => {
            if !args.quiet {
                print_time(rx, offset);
            }
        }
        ClockEvent::PersistRequest(params) => match store {
            Some(store) => match save_params(store, params) {
                Ok(()) => info!("calibration saved: {} scaled counts", params.scaled()),
                // not fatal; the receiver will ask again
                Err(err) => warn!("calibration save failed: {}", err),
            },
            None => debug!("calibration stable, but no --calibration store configured"),
        },
        ClockEvent::TickIntervalChanged(params) => {
            // no real timer to reprogram here; just record the trim
            info!("oscillator trim now {} scaled counts", params.scaled());
        }
        _ => {}
    }
}

fn print_time(rx: &WwvbReceiver, offset: &LocalOffset) {
    let time = rx.time();
    let (local_hours, local_minutes) = local_hours_minutes(time, offset);
    match time.utc_datetime() {
        Some(utc) => println!(
            "{} | local {:02}:{:02}",
            utc.format("%Y-%m-%d %H:%M:%S UTC"),
            local_hours,
            local_minutes
        ),
        None => println!(
            "{:02}:{:02}:{:02} UTC day {} | local {:02}:{:02}",
            time.hours,
            time.minutes,
            time.seconds,
            time.day_of_year,
            local_hours,
            local_minutes
        ),
    }
}
