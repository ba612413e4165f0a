// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent page-number counter. Keeps pagination monotone across
// printer restarts so a fresh batch never reuses sequence numbers the
// scanner side may still be waiting on.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use ipops_core::error::{IpopsError, Result};
use ipops_core::paths::state_dir;

const STATE_APP: &str = "IPoPS-printer";
const COUNTER_FILE: &str = "starting_page_number";

/// Counter file holding a non-negative integer as minimal-length
/// big-endian bytes. Zero is an empty file; a missing file reads as zero.
pub struct PageCounter {
    path: PathBuf,
}

impl PageCounter {
    /// Counter at the conventional user-state location.
    pub fn open_default() -> Self {
        Self {
            path: state_dir(STATE_APP).join(COUNTER_FILE),
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<u64> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no counter file, starting at 0");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.len() > 8 {
            return Err(IpopsError::InvalidState(format!(
                "counter file {} holds {} bytes, more than a u64",
                self.path.display(),
                bytes.len()
            )));
        }
        let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        debug!(value, "counter loaded");
        Ok(value)
    }

    pub fn save(&self, value: u64) -> Result<()> {
        std::fs::write(&self.path, minimal_be_bytes(value))?;
        debug!(value, path = %self.path.display(), "counter saved");
        Ok(())
    }
}

/// Big-endian bytes with leading zero bytes stripped; zero encodes as no
/// bytes at all.
fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = value.leading_zeros() as usize / 8;
    bytes[skip..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn counter_in(dir: &TempDir) -> PageCounter {
        PageCounter::at(dir.path().join(COUNTER_FILE))
    }

    #[test]
    fn missing_file_reads_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(counter_in(&dir).load().unwrap(), 0);
    }

    #[test]
    fn reads_big_endian_bytes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(COUNTER_FILE), [0x01, 0x00]).unwrap();
        assert_eq!(counter_in(&dir).load().unwrap(), 256);
    }

    #[test]
    fn writes_minimal_big_endian_bytes() {
        let dir = TempDir::new().unwrap();
        let counter = counter_in(&dir);
        counter.save(259).unwrap();
        assert_eq!(
            std::fs::read(dir.path().join(COUNTER_FILE)).unwrap(),
            [0x01, 0x03]
        );
    }

    #[test]
    fn zero_is_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let counter = counter_in(&dir);
        counter.save(0).unwrap();
        assert!(std::fs::read(dir.path().join(COUNTER_FILE)).unwrap().is_empty());
        assert_eq!(counter.load().unwrap(), 0);
    }

    #[test]
    fn round_trips_large_values() {
        let dir = TempDir::new().unwrap();
        let counter = counter_in(&dir);
        for value in [1, 255, 256, 65_536, u64::MAX] {
            counter.save(value).unwrap();
            assert_eq!(counter.load().unwrap(), value);
        }
    }

    #[test]
    fn oversized_file_is_invalid_state() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(COUNTER_FILE), [1u8; 9]).unwrap();
        assert!(matches!(
            counter_in(&dir).load(),
            Err(IpopsError::InvalidState(_))
        ));
    }
}
