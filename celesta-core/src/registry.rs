//! Per-tone arbitration records.

use celesta_types::{SourceSet, ToneId, TONE_RANGE};

/// Arbitration state of a single tone.
///
/// The four variants are the only legal combinations of the underlying
/// facts (claim set, deferred release, sustain), so transitions that would
/// produce an inconsistent record cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneState {
    /// Silent and unclaimed.
    #[default]
    Idle,
    /// Claimed by at least one source.
    Held {
        sources: SourceSet,
        /// The pedal was engaged while the tone was held; releasing the
        /// last source will hand the tone to the pedal instead of
        /// silencing it.
        sustain_armed: bool,
    },
    /// The claim set just became empty; the actual turn-off is deferred to
    /// the scheduler's flush so a rapid re-claim never flickers.
    PendingRelease {
        /// Audible flag of the release that emptied the claim set; gates
        /// the eventual sound-off call.
        audible: bool,
        /// One-tick grace flag: the first flush after the release only
        /// clears this and takes no other action.
        armed: bool,
        /// Carries pedal pre-arming across a cancel/re-claim.
        sustain_armed: bool,
    },
    /// Unclaimed but still sounding because the pedal holds it.
    Sustained,
}

impl ToneState {
    /// The only externally observable projection: is the tone presently
    /// sounding / visually lit?
    pub fn is_audible(self) -> bool {
        !matches!(self, ToneState::Idle)
    }

    /// Sources currently claiming the tone.
    pub fn sources(self) -> SourceSet {
        match self {
            ToneState::Held { sources, .. } => sources,
            _ => SourceSet::EMPTY,
        }
    }
}

/// Arena of per-tone records covering the whole tone space, addressed by
/// [`ToneId`]. Indexing cannot fail: the id type is bounded by the arena
/// size.
#[derive(Debug)]
pub struct ToneRegistry {
    states: Vec<ToneState>,
}

impl ToneRegistry {
    pub fn new() -> Self {
        Self {
            states: vec![ToneState::Idle; TONE_RANGE],
        }
    }

    pub fn get(&self, tone: ToneId) -> ToneState {
        self.states[tone.index()]
    }

    pub fn set(&mut self, tone: ToneId, state: ToneState) {
        self.states[tone.index()] = state;
    }

    /// Discard every record, returning all tones to [`ToneState::Idle`].
    pub fn reset(&mut self) {
        self.states.fill(ToneState::Idle);
    }

    /// All tone ids in index order. Flush and sweep passes iterate in this
    /// order so per-tone processing is deterministic.
    pub fn tones() -> impl Iterator<Item = ToneId> {
        (0..TONE_RANGE).map(|i| ToneId::new(i as u8))
    }
}

impl Default for ToneRegistry {
    fn default() -> Self {
        Self::new()
    }
}
