//! Feedback messages from the engine thread to the host.

/// Notifications emitted by the engine thread, drained by the host on its
/// own schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFeedback {
    /// Per-tick refresh signal for the external visualizer.
    Refresh,
    /// Current transport position, sent while the transport is running.
    PlayheadPosition(u64),
    PedalChanged(bool),
    TransposeChanged(i32),
    /// A reconfiguration was accepted and all arbitration records rebuilt.
    Reconfigured,
}
