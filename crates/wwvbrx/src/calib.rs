//! Calibration persistence
//!
//! The learned oscillator trim survives power cycles as a small record
//! in a byte-addressed store: a version byte followed by the scaled
//! period, little-endian, at offset 0. Version 1 records used a
//! divider denominator of 16; they are migrated to the current
//! denominator of 64 on read. Anything unreadable falls back to the
//! compile-time nominal period; a stale or missing calibration is a
//! quality problem, never a fatal one.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::discipline::{ClockParams, SCALED_MAX, SCALED_MIN};

/// Record version with denominator 16
pub const VERSION_V1: u8 = 1;

/// Current record version, denominator 64
pub const VERSION_V2: u8 = 2;

/// Serialized record length: version byte plus scaled counts
pub const RECORD_LEN: usize = 5;

/// Errors reading or writing the calibration record
#[derive(Debug, Error)]
pub enum CalibError {
    /// The version byte names no known record layout
    #[error("unrecognized calibration record version {0}")]
    UnknownVersion(u8),

    /// The stored period is outside the oscillator trim range
    #[error("stored calibration {0} is outside the trim range")]
    OutOfRange(u32),

    /// The underlying store failed
    #[error("calibration store: {0}")]
    Store(#[from] std::io::Error),
}

/// A byte-addressed persistent store
///
/// The narrow interface the receiver needs from an EEPROM, flash
/// page, or settings file. Reads and writes are whole-buffer and may
/// be slow; only background code should touch the store.
pub trait CalibStore {
    /// Fill `buf` from the store starting at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::io::Result<()>;

    /// Write `data` to the store starting at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> std::io::Result<()>;
}

/// Load calibrated clock parameters
///
/// Reads and validates the record at offset 0, migrating version 1
/// denominators. The caller decides what a failure means; typically it
/// logs and substitutes [`ClockParams::nominal`].
pub fn load_params<S: CalibStore>(store: &mut S) -> Result<ClockParams, CalibError> {
    let mut buf = [0u8; RECORD_LEN];
    store.read(0, &mut buf)?;

    let stored = LittleEndian::read_u32(&buf[1..]);
    let scaled = match buf[0] {
        VERSION_V2 => stored,
        // v1 counted in 16ths of a cycle; 64ths are 4x finer
        VERSION_V1 => stored.saturating_mul(4),
        version => return Err(CalibError::UnknownVersion(version)),
    };

    if !(SCALED_MIN..=SCALED_MAX).contains(&scaled) {
        return Err(CalibError::OutOfRange(scaled));
    }

    Ok(ClockParams::from_scaled(scaled))
}

/// Persist clock parameters as a current-version record
pub fn save_params<S: CalibStore>(
    store: &mut S,
    params: &ClockParams,
) -> Result<(), CalibError> {
    let mut buf = [0u8; RECORD_LEN];
    buf[0] = VERSION_V2;
    LittleEndian::write_u32(&mut buf[1..], params.scaled());
    store.write(0, &buf)?;
    Ok(())
}

/// In-memory store for tests and hosts without persistence
#[derive(Clone, Debug)]
pub struct MemStore {
    bytes: Vec<u8>,
}

impl MemStore {
    /// Empty store of `len` zero bytes
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    /// Store pre-loaded with `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl CalibStore for MemStore {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::io::Result<()> {
        let end = offset + buf.len();
        let src = self
            .bytes
            .get(offset..end)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> std::io::Result<()> {
        let end = offset + data.len();
        let dst = self
            .bytes
            .get_mut(offset..end)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
        dst.copy_from_slice(data);
        Ok(())
    }
}
