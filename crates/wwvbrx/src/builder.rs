use crate::discipline::ClockParams;
use crate::receiver::WwvbReceiver;

/// Builds a WWVB receiver
///
/// The defaults are tuned for the real broadcast and a reasonable
/// oscillator; most embeddings only need to supply a stored
/// calibration, if they have one. The builder API is part of this
/// crate's API; the default values are not, and may shift in any minor
/// release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiverBuilder {
    score_threshold: u8,
    seek_detections: u8,
    sync_miss_limit: u8,
    drift_trigger: u16,
    min_discipline_ticks: u32,
    persist_after_ticks: u32,
    clock: ClockParams,
}

impl ReceiverBuilder {
    /// New receiver configuration with broadcast defaults
    pub fn new() -> Self {
        Self {
            score_threshold: 70,
            seek_detections: 10,
            sync_miss_limit: 6,
            drift_trigger: 15,
            min_discipline_ticks: 1_000,
            persist_after_ticks: 500_000,
            clock: ClockParams::nominal(),
        }
    }

    /// Build a receiver, ready for its first tick
    pub fn build(&self) -> WwvbReceiver {
        WwvbReceiver::from(self)
    }

    /// Symbol detection threshold (matching bits of 80)
    ///
    /// A correlation peak must strictly exceed this score to count as
    /// a symbol. The closest pair of symbol templates differs in 18
    /// bits, so thresholds above 71 make the classes mutually
    /// exclusive even on a clean signal; lower values admit more
    /// noise-corrupted symbols at the cost of more false detections.
    pub fn with_score_threshold(&mut self, threshold: u8) -> &mut Self {
        self.score_threshold = threshold.clamp(40, 79);
        self
    }

    /// Detections required to leave acquisition
    ///
    /// The receiver declares bit sync after this many center-aligned
    /// symbol detections.
    pub fn with_seek_detections(&mut self, detections: u8) -> &mut Self {
        self.seek_detections = detections.max(1);
        self
    }

    /// Consecutive missed symbols before sync is abandoned
    pub fn with_sync_miss_limit(&mut self, misses: u8) -> &mut Self {
        self.sync_miss_limit = misses.max(1);
        self
    }

    /// Accumulated offset (ticks) that triggers clock discipline
    pub fn with_drift_trigger(&mut self, ticks: u16) -> &mut Self {
        self.drift_trigger = ticks.max(1);
        self
    }

    /// Minimum ticks between discipline adjustments
    ///
    /// Short measurement intervals amplify quantization in the offset
    /// measurement; keep this to several hundred ticks at least.
    pub fn with_min_discipline_ticks(&mut self, ticks: u32) -> &mut Self {
        self.min_discipline_ticks = ticks.max(60);
        self
    }

    /// Ticks of continuous tracking before calibration is persisted
    pub fn with_persist_after_ticks(&mut self, ticks: u32) -> &mut Self {
        self.persist_after_ticks = ticks.max(60);
        self
    }

    /// Initial tick period, typically a stored calibration
    pub fn with_clock_params(&mut self, clock: ClockParams) -> &mut Self {
        self.clock = clock;
        self
    }

    /// Symbol detection threshold
    pub fn score_threshold(&self) -> u8 {
        self.score_threshold
    }

    /// Detections required to leave acquisition
    pub fn seek_detections(&self) -> u8 {
        self.seek_detections
    }

    /// Consecutive misses before sync is abandoned
    pub fn sync_miss_limit(&self) -> u8 {
        self.sync_miss_limit
    }

    /// Discipline trigger threshold, in ticks of offset
    pub fn drift_trigger(&self) -> u16 {
        self.drift_trigger
    }

    /// Minimum ticks between discipline adjustments
    pub fn min_discipline_ticks(&self) -> u32 {
        self.min_discipline_ticks
    }

    /// Ticks of tracking before calibration persists
    pub fn persist_after_ticks(&self) -> u32 {
        self.persist_after_ticks
    }

    /// Initial tick period
    pub fn clock_params(&self) -> ClockParams {
        self.clock
    }
}

impl Default for ReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
