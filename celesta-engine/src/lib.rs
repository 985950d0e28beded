//! # celesta-engine
//!
//! The scheduler for the Celesta virtual keyboard: a dedicated engine
//! thread owns the note arbiter and playback cursors, drains input and
//! control commands from crossbeam channels, and runs a fixed ~60 Hz tick
//! that advances playback, flushes deferred releases, and signals the
//! visualizer, in that order, so every source gets the same one-tick
//! debounce protection.

pub mod commands;
mod engine_thread;
pub mod handle;
pub mod transport;

pub use commands::{EngineCmd, TransposeStep};
pub use handle::EngineHandle;
pub use transport::{ManualTransport, Transport};
