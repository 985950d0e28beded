//! The per-tone claim/release state machine.
//!
//! Three independent sources (pointer, keyboard, playback) claim and
//! release tones asynchronously; the arbiter reconciles them into one
//! sounding/visual state per tone. A tone never goes silent synchronously
//! inside `claim`/`release`: the off is deferred to the scheduler's
//! [`NoteArbiter::flush_deferred`] with a one-tick grace period, so a tone
//! released and re-claimed within one tick never audibly or visually
//! toggles. The sustain pedal overlays this: a tone whose last claim is
//! released while the pedal is down keeps sounding until the pedal lifts.

use celesta_types::{Source, SourceSet, ToneId};

use crate::registry::{ToneRegistry, ToneState};
use crate::sink::{SoundSink, VisualSink};

/// Velocity used for live-input activations. Playback-sourced claims are
/// inaudible (the transport renders its own audio), so performance
/// velocities never reach the sound sink.
pub const DEFAULT_VELOCITY: u8 = 100;

pub struct NoteArbiter {
    registry: ToneRegistry,
    pedal: bool,
    sound: Box<dyn SoundSink>,
    visual: Box<dyn VisualSink>,
}

impl NoteArbiter {
    pub fn new(sound: Box<dyn SoundSink>, visual: Box<dyn VisualSink>) -> Self {
        Self {
            registry: ToneRegistry::new(),
            pedal: false,
            sound,
            visual,
        }
    }

    pub fn pedal_engaged(&self) -> bool {
        self.pedal
    }

    pub fn is_audible(&self, tone: ToneId) -> bool {
        self.registry.get(tone).is_audible()
    }

    pub fn state(&self, tone: ToneId) -> ToneState {
        self.registry.get(tone)
    }

    /// Claim `tone` for `source`. Idempotent when the source already holds
    /// the claim. A claim landing inside the deferred-release grace window
    /// cancels the pending off without re-triggering the on effects; the
    /// tone never stopped sounding.
    pub fn claim(&mut self, tone: ToneId, source: Source, audible: bool) {
        match self.registry.get(tone) {
            ToneState::Held {
                mut sources,
                sustain_armed,
            } => {
                sources.insert(source);
                self.registry.set(
                    tone,
                    ToneState::Held {
                        sources,
                        sustain_armed,
                    },
                );
            }
            ToneState::PendingRelease { sustain_armed, .. } => {
                self.registry.set(
                    tone,
                    ToneState::Held {
                        sources: SourceSet::of(source),
                        sustain_armed,
                    },
                );
            }
            ToneState::Idle | ToneState::Sustained => {
                // Fresh activation. A sustained tone re-strikes: its claim
                // set was empty, only the pedal kept it sounding.
                self.visual.key_pressed(tone, true);
                self.visual.note_on(tone);
                if audible {
                    self.sound.note_on(tone, DEFAULT_VELOCITY);
                }
                self.registry.set(
                    tone,
                    ToneState::Held {
                        sources: SourceSet::of(source),
                        sustain_armed: self.pedal,
                    },
                );
            }
        }
    }

    /// Release `source`'s claim on `tone`. A no-op when the source holds no
    /// claim. When the claim set empties, the tone enters the deferred
    /// release state instead of silencing immediately; `audible` is
    /// recorded there and gates the eventual sound-off.
    pub fn release(&mut self, tone: ToneId, source: Source, audible: bool) {
        if let ToneState::Held {
            mut sources,
            sustain_armed,
        } = self.registry.get(tone)
        {
            if !sources.contains(source) {
                return;
            }
            sources.remove(source);
            let next = if sources.is_empty() {
                ToneState::PendingRelease {
                    audible,
                    armed: true,
                    sustain_armed: sustain_armed || self.pedal,
                }
            } else {
                ToneState::Held {
                    sources,
                    sustain_armed,
                }
            };
            self.registry.set(tone, next);
        }
    }

    /// Act on deferred releases. Called once per scheduler tick, after the
    /// tick's playback events have been applied, iterating tones in index
    /// order.
    ///
    /// The first flush after a release only disarms the grace flag; the
    /// next one acts: the key highlight always clears, and the tone goes
    /// silent unless the pedal holds it, in which case it becomes
    /// [`ToneState::Sustained`].
    pub fn flush_deferred(&mut self) {
        for tone in ToneRegistry::tones() {
            if let ToneState::PendingRelease {
                audible,
                armed,
                sustain_armed,
            } = self.registry.get(tone)
            {
                if armed {
                    self.registry.set(
                        tone,
                        ToneState::PendingRelease {
                            audible,
                            armed: false,
                            sustain_armed,
                        },
                    );
                    continue;
                }
                self.visual.key_pressed(tone, false);
                if self.pedal {
                    self.registry.set(tone, ToneState::Sustained);
                } else {
                    self.visual.note_off(tone);
                    if audible {
                        self.sound.note_off(tone);
                    }
                    self.registry.set(tone, ToneState::Idle);
                }
            }
        }
    }

    /// Engage the pedal and pre-arm sustain on every currently held tone,
    /// so releasing them later while the pedal stays down does not silence
    /// them.
    pub fn pedal_engage(&mut self) {
        self.pedal = true;
        for tone in ToneRegistry::tones() {
            if let ToneState::Held { sources, .. } = self.registry.get(tone) {
                self.registry.set(
                    tone,
                    ToneState::Held {
                        sources,
                        sustain_armed: true,
                    },
                );
            }
        }
    }

    /// Disengage the pedal. Tones sounding only through the pedal are
    /// silenced immediately; tones still claimed by a live source keep
    /// sounding and merely lose their pre-arming. A tone sitting in its
    /// deferred-release window loses the pre-arming too and is silenced by
    /// the next acting flush.
    pub fn pedal_release(&mut self) {
        self.pedal = false;
        for tone in ToneRegistry::tones() {
            match self.registry.get(tone) {
                ToneState::Sustained => {
                    self.sound.note_off(tone);
                    self.visual.note_off(tone);
                    self.registry.set(tone, ToneState::Idle);
                }
                ToneState::Held {
                    sources,
                    sustain_armed: true,
                } => {
                    self.registry.set(
                        tone,
                        ToneState::Held {
                            sources,
                            sustain_armed: false,
                        },
                    );
                }
                ToneState::PendingRelease {
                    audible,
                    armed,
                    sustain_armed: true,
                } => {
                    self.registry.set(
                        tone,
                        ToneState::PendingRelease {
                            audible,
                            armed,
                            sustain_armed: false,
                        },
                    );
                }
                _ => {}
            }
        }
    }

    /// Release every claim matching `filter`, routing through the normal
    /// deferred path. The pedal is forced up first so sustain cannot mask
    /// the sweep.
    pub fn all_off(&mut self, filter: SourceSet) {
        self.pedal_release();
        for tone in ToneRegistry::tones() {
            let sources = self.registry.get(tone).sources();
            for source in sources.iter() {
                if filter.contains(source) {
                    self.release(tone, source, true);
                }
            }
        }
    }

    /// Panic path: force the pedal up and synchronously silence every
    /// non-idle tone. Used when the records are about to be discarded
    /// (live reconfiguration) and on engine shutdown, where a deferred off
    /// would never get its flush.
    pub fn silence_all(&mut self) {
        self.pedal = false;
        for tone in ToneRegistry::tones() {
            if self.registry.get(tone).is_audible() {
                self.visual.key_pressed(tone, false);
                self.visual.note_off(tone);
                self.sound.note_off(tone);
                self.registry.set(tone, ToneState::Idle);
            }
        }
    }

    /// Discard and rebuild every arbitration record. Callers silence first.
    pub fn reset_records(&mut self) {
        self.registry.reset();
    }
}
