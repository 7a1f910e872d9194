//! PipeDB Common - Shared types and utilities
//!
//! This crate provides the byte-reference value types, the status model
//! returned by every repository operation, error definitions, and checksum
//! utilities used across all PipeDB components.

pub mod block;
pub mod checksum;
pub mod chunk;
pub mod error;
pub mod key;
pub mod status;

pub use block::{InputBlock, OutputBlock};
pub use checksum::{ChecksumCalculator, compute_crc32c, file_checksum};
pub use chunk::Chunk;
pub use error::{Error, Result};
pub use key::{Key, PartitionWidth};
pub use status::Return;
