//! Commands accepted by the engine thread.
//!
//! Live input goes over the priority channel; lifecycle and configuration
//! go over the control channel. Both are drained on the engine thread,
//! which serializes them with the periodic tick.

use std::sync::mpsc::Sender;

use celesta_types::{InvalidLayout, Performance};

/// Transpose adjustment steps for keyboard-sourced notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransposeStep {
    Up,
    Down,
    OctaveUp,
    OctaveDown,
    Reset,
}

#[derive(Debug)]
pub enum EngineCmd {
    // Live input (priority channel).
    /// Keyboard key press, as the keymap's base tone; the engine applies
    /// the transpose offset.
    KeyDown { tone: u8 },
    KeyUp { tone: u8 },
    /// Pointer press on a visible key index.
    PointerDown { key: usize },
    /// Pointer drag; `None` means the pointer left the keys.
    PointerMove { key: Option<usize> },
    PointerUp,
    PedalEngage,
    PedalRelease,
    PedalToggle,
    Transpose(TransposeStep),
    /// Force every tone off, from every source.
    AllNotesOff,
    /// The host lost input focus: release all live-input claims.
    FocusLost,

    // Control (normal channel).
    LoadPerformance(Performance),
    StopPlayback,
    /// Atomically replace the keyboard configuration. Rejected layouts
    /// leave everything untouched.
    Reconfigure {
        layout: String,
        key_count: usize,
        lowest_tone: u8,
        reply: Sender<Result<(), InvalidLayout>>,
    },
    Shutdown,
}
