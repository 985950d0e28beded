//! Decoded multi-track performance data.
//!
//! A performance arrives already decoded into per-track, time-ordered event
//! sequences; file parsing happens upstream. Each track's events must be
//! sorted ascending by tick; that is a precondition of the playback
//! cursors, not something this crate enforces.

use serde::{Deserialize, Serialize};

use crate::ToneId;

/// One event inside a performance track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackEvent {
    /// Start sounding a tone. A velocity of zero is the conventional
    /// encoding of a note-off and is treated as one.
    NoteOn { tone: ToneId, velocity: u8 },
    NoteOff { tone: ToneId },
    /// Sustain-pedal control change.
    Sustain(bool),
}

/// A [`TrackEvent`] stamped with its transport tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub tick: u64,
    pub event: TrackEvent,
}

impl TimedEvent {
    pub fn new(tick: u64, event: TrackEvent) -> Self {
        Self { tick, event }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceTrack {
    pub events: Vec<TimedEvent>,
}

impl PerformanceTrack {
    pub fn new(events: Vec<TimedEvent>) -> Self {
        Self { events }
    }
}

/// A loaded multi-track performance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    pub tracks: Vec<PerformanceTrack>,
}

impl Performance {
    pub fn new(tracks: Vec<PerformanceTrack>) -> Self {
        Self { tracks }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }
}
