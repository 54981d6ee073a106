//! File-backed calibration store
//!
//! Stands in for the EEPROM a deployed clock would use: a small file
//! holding the oscillator trim record. Reads of a missing file fail,
//! which the caller treats like an unprogrammed EEPROM.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use wwvbrx::CalibStore;

#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl CalibStore for FileStore {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> std::io::Result<()> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.read_exact(buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.path)?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.write_all(data)
    }
}
