//! The fixed-cadence engine loop.
//!
//! One thread owns the arbiter, the playback cursors, and the pointer
//! tracker; input callbacks and control surfaces only post commands. The
//! periodic tick applies, in strict order: playback synchronization, the
//! deferred-release flush, and the visual refresh signal. Playback events
//! land before the same tick's flush so a playback re-claim inside the
//! debounce grace window is protected exactly like pointer and keyboard
//! re-claims.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};

use celesta_core::config::KeyboardConfig;
use celesta_core::{NoteArbiter, PlaybackSync, PointerTracker};
use celesta_types::{
    EngineFeedback, InvalidLayout, KeyLayout, Source, SourceSet, ToneId, DEFAULT_TRANSPOSE,
};

use crate::commands::{EngineCmd, TransposeStep};
use crate::transport::Transport;

/// Scheduler cadence, ~60 Hz. Independent of any audio sample rate; the
/// debounce is measured in these ticks, not wall time.
pub(crate) const TICK_INTERVAL: Duration = Duration::from_micros(16_667);

/// Bound on commands drained per channel per loop pass, so an input burst
/// cannot starve the tick.
const DRAIN_LIMIT: usize = 128;

pub(crate) struct EngineThread {
    arbiter: NoteArbiter,
    playback: PlaybackSync,
    pointer: PointerTracker,
    transport: Box<dyn Transport>,
    config: KeyboardConfig,
    transpose: i32,
    priority_rx: Receiver<EngineCmd>,
    control_rx: Receiver<EngineCmd>,
    feedback_tx: Sender<EngineFeedback>,
    last_tick: Instant,
}

impl EngineThread {
    pub(crate) fn new(
        arbiter: NoteArbiter,
        transport: Box<dyn Transport>,
        config: KeyboardConfig,
        transpose: i32,
        priority_rx: Receiver<EngineCmd>,
        control_rx: Receiver<EngineCmd>,
        feedback_tx: Sender<EngineFeedback>,
    ) -> Self {
        Self {
            arbiter,
            playback: PlaybackSync::new(),
            pointer: PointerTracker::new(),
            transport,
            config,
            transpose,
            priority_rx,
            control_rx,
            feedback_tx,
            last_tick: Instant::now(),
        }
    }

    pub(crate) fn run(mut self) {
        log::debug!("engine thread started");
        loop {
            let remaining = TICK_INTERVAL.saturating_sub(self.last_tick.elapsed());

            crossbeam_channel::select! {
                recv(self.priority_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break, // Disconnected
                    }
                }
                recv(self.control_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break, // Disconnected
                    }
                }
                // Timeout - proceed with tick
                default(remaining) => {}
            }

            if self.drain_commands() {
                break;
            }

            let now = Instant::now();
            if now.duration_since(self.last_tick) >= TICK_INTERVAL {
                self.last_tick = now;
                self.tick();
            }
        }

        // Disabling the engine panics-off every tone and drops the pedal.
        self.arbiter.silence_all();
        log::debug!("engine thread stopped");
    }

    /// Drain pending commands, live input first. Returns true on shutdown.
    fn drain_commands(&mut self) -> bool {
        for _ in 0..DRAIN_LIMIT {
            match self.priority_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        for _ in 0..DRAIN_LIMIT {
            match self.control_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    /// One scheduler tick: playback advance, then the deferred-release
    /// flush, then the refresh signal.
    fn tick(&mut self) {
        let position = self.transport.position();
        let running = self.transport.is_running();
        self.playback.advance(&mut self.arbiter, position, running);
        self.arbiter.flush_deferred();
        if running {
            let _ = self
                .feedback_tx
                .send(EngineFeedback::PlayheadPosition(position));
        }
        let _ = self.feedback_tx.send(EngineFeedback::Refresh);
    }

    fn handle_cmd(&mut self, cmd: EngineCmd) -> bool {
        match cmd {
            EngineCmd::KeyDown { tone } => {
                if let Some(tone) = self.transposed(tone) {
                    self.arbiter.claim(tone, Source::Keyboard, true);
                }
            }
            EngineCmd::KeyUp { tone } => {
                if let Some(tone) = self.transposed(tone) {
                    self.arbiter.release(tone, Source::Keyboard, true);
                }
            }
            EngineCmd::PointerDown { key } => {
                if let Some(tone) = self.config.tone_for_key(key) {
                    self.pointer.press(&mut self.arbiter, Some(tone));
                } else {
                    log::trace!("pointer press outside key window: {}", key);
                }
            }
            EngineCmd::PointerMove { key } => {
                let target = key.and_then(|k| self.config.tone_for_key(k));
                self.pointer.slide(&mut self.arbiter, target);
            }
            EngineCmd::PointerUp => self.pointer.lift(&mut self.arbiter),
            EngineCmd::PedalEngage => self.set_pedal(true),
            EngineCmd::PedalRelease => self.set_pedal(false),
            EngineCmd::PedalToggle => self.set_pedal(!self.arbiter.pedal_engaged()),
            EngineCmd::Transpose(step) => {
                self.transpose = match step {
                    TransposeStep::Up => self.transpose + 1,
                    TransposeStep::Down => self.transpose - 1,
                    TransposeStep::OctaveUp => self.transpose + 12,
                    TransposeStep::OctaveDown => self.transpose - 12,
                    TransposeStep::Reset => DEFAULT_TRANSPOSE,
                };
                let _ = self
                    .feedback_tx
                    .send(EngineFeedback::TransposeChanged(self.transpose));
            }
            EngineCmd::AllNotesOff => self.arbiter.all_off(SourceSet::ALL),
            EngineCmd::FocusLost => {
                self.pointer.forget();
                self.arbiter.all_off(SourceSet::LIVE);
            }
            EngineCmd::LoadPerformance(performance) => {
                self.playback.load(&mut self.arbiter, performance);
            }
            EngineCmd::StopPlayback => self.playback.stop(&mut self.arbiter),
            EngineCmd::Reconfigure {
                layout,
                key_count,
                lowest_tone,
                reply,
            } => {
                let result = self.reconfigure(&layout, key_count, lowest_tone);
                let _ = reply.send(result);
            }
            EngineCmd::Shutdown => return true,
        }
        false
    }

    fn set_pedal(&mut self, engaged: bool) {
        if engaged == self.arbiter.pedal_engaged() {
            return;
        }
        if engaged {
            self.arbiter.pedal_engage();
        } else {
            self.arbiter.pedal_release();
        }
        let _ = self.feedback_tx.send(EngineFeedback::PedalChanged(engaged));
    }

    /// Validate, panic-off, rebuild the records, then swap the config. On
    /// a rejected layout nothing changes.
    fn reconfigure(
        &mut self,
        layout: &str,
        key_count: usize,
        lowest_tone: u8,
    ) -> Result<(), InvalidLayout> {
        let layout = KeyLayout::parse(layout)?;
        self.pointer.forget();
        self.arbiter.silence_all();
        self.arbiter.reset_records();
        self.config = KeyboardConfig {
            layout,
            key_count,
            lowest_tone,
        };
        log::debug!(
            "keyboard reconfigured: layout {}, {} keys from tone {}",
            self.config.layout,
            key_count,
            lowest_tone
        );
        let _ = self.feedback_tx.send(EngineFeedback::Reconfigured);
        Ok(())
    }

    /// Apply the transpose offset to a keymap base tone. Out-of-range
    /// results drop the request.
    fn transposed(&self, tone: u8) -> Option<ToneId> {
        let transposed = ToneId::from_i32(tone as i32 + self.transpose);
        if transposed.is_none() {
            log::trace!("dropping out-of-range tone {} + {}", tone, self.transpose);
        }
        transposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ManualTransport;
    use celesta_core::{NullSound, NullVisual};
    use celesta_types::{Performance, PerformanceTrack, TimedEvent, TrackEvent};
    use std::sync::mpsc;

    struct Fixture {
        engine: EngineThread,
        transport: ManualTransport,
        feedback_rx: mpsc::Receiver<EngineFeedback>,
        _priority_tx: crossbeam_channel::Sender<EngineCmd>,
        _control_tx: crossbeam_channel::Sender<EngineCmd>,
    }

    /// Engine thread state driven directly, without spawning the thread.
    fn fixture() -> Fixture {
        let (priority_tx, priority_rx) = crossbeam_channel::unbounded();
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();
        let transport = ManualTransport::new();
        let arbiter = NoteArbiter::new(Box::new(NullSound), Box::new(NullVisual));
        let engine = EngineThread::new(
            arbiter,
            Box::new(transport.clone()),
            KeyboardConfig::default(),
            DEFAULT_TRANSPOSE,
            priority_rx,
            control_rx,
            feedback_tx,
        );
        Fixture {
            engine,
            transport,
            feedback_rx,
            _priority_tx: priority_tx,
            _control_tx: control_tx,
        }
    }

    fn performance_with(events: Vec<TimedEvent>) -> Performance {
        Performance::new(vec![PerformanceTrack::new(events)])
    }

    #[test]
    fn key_commands_apply_transpose() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::KeyDown { tone: 8 });
        let tone = ToneId::new(8 + DEFAULT_TRANSPOSE as u8);
        assert!(f.engine.arbiter.is_audible(tone));

        f.engine.handle_cmd(EngineCmd::KeyUp { tone: 8 });
        f.engine.arbiter.flush_deferred();
        f.engine.arbiter.flush_deferred();
        assert!(!f.engine.arbiter.is_audible(tone));
    }

    #[test]
    fn out_of_range_transpose_drops_the_note() {
        let mut f = fixture();
        for _ in 0..20 {
            f.engine.handle_cmd(EngineCmd::Transpose(TransposeStep::OctaveUp));
        }
        f.engine.handle_cmd(EngineCmd::KeyDown { tone: 100 });
        // Nothing claimed anywhere.
        assert!(celesta_core::ToneRegistry::tones().all(|t| !f.engine.arbiter.is_audible(t)));
    }

    #[test]
    fn transpose_reset_restores_default() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::Transpose(TransposeStep::Up));
        f.engine
            .handle_cmd(EngineCmd::Transpose(TransposeStep::OctaveDown));
        f.engine.handle_cmd(EngineCmd::Transpose(TransposeStep::Reset));
        assert_eq!(f.engine.transpose, DEFAULT_TRANSPOSE);
        let changes: Vec<EngineFeedback> = f.feedback_rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                EngineFeedback::TransposeChanged(DEFAULT_TRANSPOSE + 1),
                EngineFeedback::TransposeChanged(DEFAULT_TRANSPOSE - 11),
                EngineFeedback::TransposeChanged(DEFAULT_TRANSPOSE),
            ]
        );
    }

    #[test]
    fn pointer_commands_map_through_key_window() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::PointerDown { key: 0 });
        assert!(f.engine.arbiter.is_audible(ToneId::new(21)));

        f.engine.handle_cmd(EngineCmd::PointerMove { key: Some(1) });
        assert!(f.engine.arbiter.is_audible(ToneId::new(22)));

        f.engine.handle_cmd(EngineCmd::PointerUp);
        f.engine.arbiter.flush_deferred();
        f.engine.arbiter.flush_deferred();
        assert!(!f.engine.arbiter.is_audible(ToneId::new(21)));
        assert!(!f.engine.arbiter.is_audible(ToneId::new(22)));
    }

    #[test]
    fn tick_applies_playback_before_flush() {
        let mut f = fixture();
        // The performance releases and immediately re-strikes tone 60 at
        // tick 5. Applied before the flush, the re-claim lands inside the
        // grace window and the tone never goes silent.
        f.engine.handle_cmd(EngineCmd::LoadPerformance(performance_with(vec![
            TimedEvent::new(
                0,
                TrackEvent::NoteOn {
                    tone: ToneId::new(60),
                    velocity: 90,
                },
            ),
            TimedEvent::new(5, TrackEvent::NoteOff { tone: ToneId::new(60) }),
            TimedEvent::new(
                5,
                TrackEvent::NoteOn {
                    tone: ToneId::new(60),
                    velocity: 90,
                },
            ),
        ])));
        f.transport.set_running(true);

        f.transport.set_position(0);
        f.engine.tick();
        assert!(f.engine.arbiter.is_audible(ToneId::new(60)));

        f.transport.set_position(5);
        f.engine.tick();
        f.transport.set_position(6);
        f.engine.tick();
        f.engine.tick();
        assert!(f.engine.arbiter.is_audible(ToneId::new(60)));
    }

    #[test]
    fn tick_emits_refresh_and_playhead_feedback() {
        let mut f = fixture();
        f.engine.tick();
        let quiet: Vec<EngineFeedback> = f.feedback_rx.try_iter().collect();
        assert_eq!(quiet, vec![EngineFeedback::Refresh]);

        f.transport.set_running(true);
        f.transport.set_position(42);
        f.engine.tick();
        let running: Vec<EngineFeedback> = f.feedback_rx.try_iter().collect();
        assert_eq!(
            running,
            vec![
                EngineFeedback::PlayheadPosition(42),
                EngineFeedback::Refresh,
            ]
        );
    }

    #[test]
    fn stop_playback_releases_and_rewinds() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::LoadPerformance(performance_with(vec![
            TimedEvent::new(
                0,
                TrackEvent::NoteOn {
                    tone: ToneId::new(70),
                    velocity: 90,
                },
            ),
        ])));
        f.transport.set_running(true);
        f.engine.tick();
        assert!(f.engine.arbiter.is_audible(ToneId::new(70)));

        f.transport.set_running(false);
        f.engine.handle_cmd(EngineCmd::StopPlayback);
        f.engine.tick();
        f.engine.tick();
        assert!(!f.engine.arbiter.is_audible(ToneId::new(70)));
    }

    #[test]
    fn reconfigure_rejects_invalid_layout_and_keeps_state() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::KeyDown { tone: 8 });
        let tone = ToneId::new(8 + DEFAULT_TRANSPOSE as u8);

        let (reply_tx, reply_rx) = mpsc::channel();
        f.engine.handle_cmd(EngineCmd::Reconfigure {
            layout: "22".to_string(),
            key_count: 44,
            lowest_tone: 12,
            reply: reply_tx,
        });
        assert!(reply_rx.recv().unwrap().is_err());
        // Prior state retained: config untouched, tone still sounding.
        assert_eq!(f.engine.config, KeyboardConfig::default());
        assert!(f.engine.arbiter.is_audible(tone));
    }

    #[test]
    fn reconfigure_panics_off_and_rebuilds() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::PointerDown { key: 0 });
        f.engine.handle_cmd(EngineCmd::PedalEngage);

        let (reply_tx, reply_rx) = mpsc::channel();
        f.engine.handle_cmd(EngineCmd::Reconfigure {
            layout: "12".to_string(),
            key_count: 44,
            lowest_tone: 12,
            reply: reply_tx,
        });
        assert!(reply_rx.recv().unwrap().is_ok());
        assert_eq!(f.engine.config.layout.as_str(), "12");
        assert!(!f.engine.arbiter.pedal_engaged());
        assert_eq!(f.engine.pointer.held(), None);
        assert!(celesta_core::ToneRegistry::tones().all(|t| !f.engine.arbiter.is_audible(t)));
        // The new window maps keys from the new lowest tone.
        f.engine.handle_cmd(EngineCmd::PointerDown { key: 0 });
        assert!(f.engine.arbiter.is_audible(ToneId::new(12)));
    }

    #[test]
    fn focus_lost_releases_live_sources_but_not_playback() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::LoadPerformance(performance_with(vec![
            TimedEvent::new(
                0,
                TrackEvent::NoteOn {
                    tone: ToneId::new(70),
                    velocity: 90,
                },
            ),
        ])));
        f.transport.set_running(true);
        f.engine.tick();
        f.engine.handle_cmd(EngineCmd::PointerDown { key: 0 });
        f.engine.handle_cmd(EngineCmd::KeyDown { tone: 8 });

        f.engine.handle_cmd(EngineCmd::FocusLost);
        f.engine.tick();
        f.engine.tick();
        assert!(!f.engine.arbiter.is_audible(ToneId::new(21)));
        assert!(!f.engine.arbiter.is_audible(ToneId::new(8 + DEFAULT_TRANSPOSE as u8)));
        assert!(f.engine.arbiter.is_audible(ToneId::new(70)));
    }

    #[test]
    fn pedal_toggle_round_trips_with_feedback() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::PedalToggle);
        assert!(f.engine.arbiter.pedal_engaged());
        f.engine.handle_cmd(EngineCmd::PedalToggle);
        assert!(!f.engine.arbiter.pedal_engaged());
        let changes: Vec<EngineFeedback> = f.feedback_rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![
                EngineFeedback::PedalChanged(true),
                EngineFeedback::PedalChanged(false),
            ]
        );
    }

    #[test]
    fn redundant_pedal_command_emits_no_feedback() {
        let mut f = fixture();
        f.engine.handle_cmd(EngineCmd::PedalRelease);
        assert!(f.feedback_rx.try_iter().next().is_none());
    }

    #[test]
    fn shutdown_command_stops_the_loop() {
        let mut f = fixture();
        assert!(f.engine.handle_cmd(EngineCmd::Shutdown));
        assert!(!f.engine.handle_cmd(EngineCmd::PointerUp));
    }
}
