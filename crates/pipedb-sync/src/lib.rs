//! PipeDB Sync - Concurrency primitives
//!
//! This crate provides the building blocks PipeDB layers on top of a block
//! repository:
//! - [`Gate`]: multiple readers / single writer lock
//! - [`Pipe`]: concurrent FIFO handing out weak observation handles
//! - [`ManagedTask`]: a background worker thread that may be started a
//!   bounded number of times and is stopped cooperatively

pub mod gate;
pub mod pipe;
pub mod task;

pub use gate::{Gate, ReadGuard, WriteGuard};
pub use pipe::Pipe;
pub use task::{ManagedTask, TaskSignal, Worker};
