//! Checksum utilities for PipeDB
//!
//! CRC32C is used as the cheap digest for detecting configuration file
//! changes. Files are streamed through the calculator so large files are
//! never loaded whole.

use crate::error::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read size used when streaming a file through the calculator
pub const CHECKSUM_BUFFER_SIZE: usize = 1024;

/// Streaming CRC32C calculator
#[derive(Debug, Default, Clone)]
pub struct ChecksumCalculator {
    crc32c: u32,
}

impl ChecksumCalculator {
    /// Create a new calculator
    #[must_use]
    pub const fn new() -> Self {
        Self { crc32c: 0 }
    }

    /// Update the calculator with more data
    pub fn update(&mut self, data: &[u8]) {
        self.crc32c = crc32c::crc32c_append(self.crc32c, data);
    }

    /// Finalize and return the computed checksum
    #[must_use]
    pub const fn finalize(self) -> u32 {
        self.crc32c
    }
}

/// Quick CRC32C computation
#[inline]
#[must_use]
pub fn compute_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Compute the CRC32C of a file's contents.
///
/// Fails if the file cannot be opened or read.
pub fn file_checksum(path: impl AsRef<Path>) -> Result<u32> {
    let mut file = File::open(path.as_ref())?;
    let mut calc = ChecksumCalculator::new();
    let mut buffer = [0u8; CHECKSUM_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        calc.update(&buffer[..n]);
    }
    Ok(calc.finalize())
}
