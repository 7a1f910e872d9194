//! PipeDB Store - Block repositories
//!
//! This crate defines the [`BlockRepository`] contract every PipeDB storage
//! backend implements, and two backends:
//! - [`RedbRepository`]: persistent store in a single redb database file
//! - [`MemoryRepository`]: in-process map, lost with the process

pub mod config;
pub mod error;
pub mod memory;
pub mod redb_repository;
pub mod repository;

pub use config::{BackendKind, RepositoryConfig, UnknownBackend};
pub use error::BackendError;
pub use memory::MemoryRepository;
pub use redb_repository::RedbRepository;
pub use repository::{BlockRepository, create_repository};

// Re-exports
pub use pipedb_common::{InputBlock, Key, OutputBlock, Return};
