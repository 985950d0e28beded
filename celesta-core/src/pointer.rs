//! Pointer glissando tracking.
//!
//! The pointer claims at most one tone at a time. Dragging across the
//! keyboard releases the previous tone and claims the one under the
//! pointer, which the arbiter's deferred-release path keeps free of
//! flicker when the two overlap within a tick.

use celesta_types::{Source, ToneId};

use crate::arbiter::NoteArbiter;

#[derive(Debug, Default)]
pub struct PointerTracker {
    held: Option<ToneId>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> Option<ToneId> {
        self.held
    }

    /// Press onto a key, or onto none (outside the keyboard).
    pub fn press(&mut self, arbiter: &mut NoteArbiter, tone: Option<ToneId>) {
        self.move_to(arbiter, tone);
    }

    /// Drag while pressed. Motion with the pointer up is ignored.
    pub fn slide(&mut self, arbiter: &mut NoteArbiter, tone: Option<ToneId>) {
        if self.held.is_some() {
            self.move_to(arbiter, tone);
        }
    }

    /// Lift the pointer (or leave the surface).
    pub fn lift(&mut self, arbiter: &mut NoteArbiter) {
        self.move_to(arbiter, None);
    }

    /// Drop the tracked tone without releasing its claim. Used when a sweep
    /// (focus loss, reconfiguration) already released everything.
    pub fn forget(&mut self) {
        self.held = None;
    }

    fn move_to(&mut self, arbiter: &mut NoteArbiter, target: Option<ToneId>) {
        if target == self.held {
            return;
        }
        if let Some(previous) = self.held {
            arbiter.release(previous, Source::Pointer, true);
        }
        if let Some(next) = target {
            arbiter.claim(next, Source::Pointer, true);
        }
        self.held = target;
    }
}
