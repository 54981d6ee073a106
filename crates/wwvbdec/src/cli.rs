use clap::{value_parser, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts a demodulated WWVB bit stream, one sample per byte at 60 samples per second, and decodes the station's time code. ASCII '0' and '1' (or raw 0x00/0x01) are samples; whitespace is ignored.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts a demodulated WWVB bit stream, one sample per byte at 60 samples per second, and decodes the station's time code. ASCII '0' and '1' (or raw 0x00/0x01) are samples; whitespace is ignored. Each decoded frame is printed together with the recovered UTC and configured local time.

A receiver module's envelope output sampled at 60 Hz is exactly this format. To try the decoder without hardware, use --demo, which synthesizes a clean broadcast of the current minute and decodes it:

    wwvbdec --demo

To decode a capture:

    wwvbdec --file capture.bits

With --calibration, the learned oscillator trim is loaded at startup and written back whenever tracking has been stable long enough:

    wwvbdec --calibration trim.bin --file capture.bits
"#;

const ADVANCED: &str = "Advanced Receiver Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded frames
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Decode a synthesized broadcast of the current minute and exit
    #[arg(long)]
    pub demo: bool,

    /// Calibration file for the learned oscillator trim. Optional.
    #[arg(long)]
    pub calibration: Option<String>,

    /// Local offset from UTC, whole hours east (negative is west)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    #[arg(value_parser = value_parser!(i8).range(-12..=14))]
    pub tz_hours: i8,

    /// Local offset from UTC, additional minutes
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    #[arg(value_parser = value_parser!(i8).range(-59..=59))]
    pub tz_minutes: i8,

    /// Add an hour while the station announces DST
    #[arg(long)]
    pub observe_dst: bool,

    /// Symbol detection threshold (matching bits of 80)
    #[arg(long, default_value_t = 70)]
    #[arg(value_parser = value_parser!(u8).range(40..80))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub score_threshold: u8,

    /// Aligned detections required for bit sync
    #[arg(long, default_value_t = 10)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub seek_detections: u8,

    /// Consecutive missed symbols before reacquiring
    #[arg(long, default_value_t = 6)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub sync_miss_limit: u8,

    /// Accumulated offset (ticks) that triggers clock discipline
    #[arg(long, default_value_t = 15)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub drift_trigger: u16,

    /// Minimum ticks between discipline adjustments
    #[arg(long, default_value_t = 1_000)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub min_discipline_ticks: u32,

    /// Ticks of stable tracking before calibration persists
    #[arg(long, default_value_t = 500_000)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub persist_after_ticks: u32,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}
