//! # celesta-types
//!
//! Shared type definitions for the Celesta virtual-keyboard engine.
//! This crate contains pure data used across celesta-core and celesta-engine:
//! tone identifiers, claim sources, validated key layouts, decoded
//! performance event sequences, and engine feedback messages.

pub mod feedback;
pub mod layout;
pub mod performance;

pub use feedback::EngineFeedback;
pub use layout::{InvalidLayout, KeyLayout, Tier};
pub use performance::{Performance, PerformanceTrack, TimedEvent, TrackEvent};

/// Number of addressable tones. The tone space is fixed; the visible
/// keyboard is a configurable window into it.
pub const TONE_RANGE: usize = 256;

/// Default transpose offset applied to keyboard-sourced note requests,
/// in semitones above the keymap's base tones.
pub const DEFAULT_TRANSPOSE: i32 = 36;

/// An addressable playable pitch. The `u8` representation keeps every
/// value inside the tone space, so range checks only happen at the edges
/// where wider arithmetic (transpose, key offsets) produces candidates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ToneId(u8);

impl ToneId {
    pub fn new(index: u8) -> Self {
        Self(index)
    }

    /// Bounds-checked construction from wider arithmetic. `None` means the
    /// candidate falls outside the tone space and the operation that
    /// produced it should be dropped.
    pub fn from_i32(index: i32) -> Option<Self> {
        u8::try_from(index).ok().map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Index into a per-tone arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ToneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The origin of a claim/release request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Source {
    Pointer,
    Keyboard,
    Playback,
}

impl Source {
    const fn bit(self) -> u8 {
        match self {
            Source::Pointer => 1,
            Source::Keyboard => 1 << 1,
            Source::Playback => 1 << 2,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::Pointer => "pointer",
            Source::Keyboard => "keyboard",
            Source::Playback => "playback",
        };
        write!(f, "{}", name)
    }
}

/// A set of claim sources. At most three members, so a plain byte suffices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SourceSet(u8);

impl SourceSet {
    pub const EMPTY: SourceSet = SourceSet(0);
    pub const ALL: SourceSet = SourceSet::of(Source::Pointer)
        .with(Source::Keyboard)
        .with(Source::Playback);
    /// The two live-input sources (everything except playback).
    pub const LIVE: SourceSet = SourceSet::of(Source::Pointer).with(Source::Keyboard);

    pub const fn of(source: Source) -> SourceSet {
        SourceSet(source.bit())
    }

    pub const fn with(self, source: Source) -> SourceSet {
        SourceSet(self.0 | source.bit())
    }

    pub fn contains(self, source: Source) -> bool {
        self.0 & source.bit() != 0
    }

    pub fn insert(&mut self, source: Source) {
        self.0 |= source.bit();
    }

    pub fn remove(&mut self, source: Source) {
        self.0 &= !source.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: SourceSet) -> bool {
        self.0 & other.0 != 0
    }

    /// Members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Source> {
        [Source::Pointer, Source::Keyboard, Source::Playback]
            .into_iter()
            .filter(move |s| self.contains(*s))
    }
}
