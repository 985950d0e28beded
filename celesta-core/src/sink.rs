//! Collaborator seams for the audio output and the visual surfaces.
//!
//! The arbiter never talks to a device or a widget directly; it emits
//! effects through these traits. Hosts plug in real collaborators; the
//! null implementations keep the engine running in silent or headless
//! mode when a collaborator is unavailable.

use celesta_types::ToneId;

/// External audio collaborator.
pub trait SoundSink: Send {
    fn note_on(&mut self, tone: ToneId, velocity: u8);
    fn note_off(&mut self, tone: ToneId);
}

/// External visual collaborators: the key-highlight surface and the
/// separate visualizer.
pub trait VisualSink: Send {
    /// Highlight state of the on-screen key.
    fn key_pressed(&mut self, tone: ToneId, pressed: bool);
    fn note_on(&mut self, tone: ToneId);
    fn note_off(&mut self, tone: ToneId);
}

/// No-op audio sink; the engine degrades to visual-only mode.
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundSink for NullSound {
    fn note_on(&mut self, _tone: ToneId, _velocity: u8) {}
    fn note_off(&mut self, _tone: ToneId) {}
}

/// No-op visual sink.
#[derive(Debug, Default)]
pub struct NullVisual;

impl VisualSink for NullVisual {
    fn key_pressed(&mut self, _tone: ToneId, _pressed: bool) {}
    fn note_on(&mut self, _tone: ToneId) {}
    fn note_off(&mut self, _tone: ToneId) {}
}
