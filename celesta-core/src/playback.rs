//! Synchronizes a replayed performance against the transport position.
//!
//! The transport renders the performance's audio itself; the claims issued
//! here are inaudible and exist purely to keep the on-screen/arbitration
//! state consistent with what is audibly playing.

use celesta_types::{Performance, Source, SourceSet, TrackEvent};

use crate::arbiter::NoteArbiter;

/// Per-track cursors into a loaded performance.
///
/// Each cursor points at the next not-yet-dispatched event of its track and
/// only ever moves forward; events are dispatched exactly once and never
/// out of order. Track event sequences are assumed sorted ascending by
/// tick (a precondition of the decode step, not enforced here).
#[derive(Default)]
pub struct PlaybackSync {
    performance: Option<Performance>,
    cursors: Vec<usize>,
}

impl PlaybackSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.performance.is_some()
    }

    /// Install a performance with all cursors at the start. Any claims the
    /// previous performance still held are released first.
    pub fn load(&mut self, arbiter: &mut NoteArbiter, performance: Performance) {
        arbiter.all_off(SourceSet::of(Source::Playback));
        log::debug!(
            "performance loaded: {} tracks, {} events",
            performance.track_count(),
            performance.event_count()
        );
        self.cursors = vec![0; performance.tracks.len()];
        self.performance = Some(performance);
    }

    /// Dispatch every event that has become due at `transport_tick`. A
    /// stopped transport (or no loaded performance) freezes the cursors,
    /// ready to resume.
    pub fn advance(&mut self, arbiter: &mut NoteArbiter, transport_tick: u64, running: bool) {
        if !running {
            return;
        }
        let Some(performance) = &self.performance else {
            return;
        };

        for (track, cursor) in performance.tracks.iter().zip(self.cursors.iter_mut()) {
            while let Some(timed) = track.events.get(*cursor) {
                if timed.tick > transport_tick {
                    break;
                }
                match timed.event {
                    TrackEvent::NoteOn { tone, velocity: 0 } | TrackEvent::NoteOff { tone } => {
                        arbiter.release(tone, Source::Playback, false);
                    }
                    TrackEvent::NoteOn { tone, .. } => {
                        arbiter.claim(tone, Source::Playback, false);
                    }
                    TrackEvent::Sustain(true) => arbiter.pedal_engage(),
                    TrackEvent::Sustain(false) => arbiter.pedal_release(),
                }
                *cursor += 1;
            }
        }
    }

    /// Rewind every cursor and force all playback-sourced tones off.
    pub fn stop(&mut self, arbiter: &mut NoteArbiter) {
        for cursor in &mut self.cursors {
            *cursor = 0;
        }
        arbiter.all_off(SourceSet::of(Source::Playback));
    }
}
