//! # celesta-core
//!
//! Arbitration core for the Celesta virtual keyboard: the per-tone
//! claim/release state machine with its debounced release path and sustain
//! overlay, playback-to-transport synchronization, pointer glissando
//! tracking, configuration, and performance-file loading, independent of
//! any UI framework or audio backend.
//!
//! ## Module Overview
//!
//! - [`registry`] — per-tone arbitration records (`ToneState`,
//!   `ToneRegistry`)
//! - [`arbiter`] — `NoteArbiter`: claim/release, deferred turn-off,
//!   pedal overlay, panic-off
//! - [`playback`] — `PlaybackSync`: per-track cursors against the
//!   transport position
//! - [`pointer`] — one-tone-at-a-time glissando tracking
//! - [`sink`] — collaborator seams for audio and visual output
//! - [`config`] — TOML configuration (embedded defaults + user override)
//! - [`io`] — JSON performance loading

pub mod arbiter;
pub mod config;
pub mod io;
pub mod playback;
pub mod pointer;
pub mod registry;
pub mod sink;

pub use arbiter::{NoteArbiter, DEFAULT_VELOCITY};
pub use config::{Config, KeyboardConfig};
pub use playback::PlaybackSync;
pub use pointer::PointerTracker;
pub use registry::{ToneRegistry, ToneState};
pub use sink::{NullSound, NullVisual, SoundSink, VisualSink};
