//! Main-thread handle to the engine.

use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;

use celesta_core::config::KeyboardConfig;
use celesta_core::io::{load_performance, PerformanceLoadError};
use celesta_core::{NoteArbiter, SoundSink, VisualSink};
use celesta_types::{EngineFeedback, InvalidLayout, Performance};

use crate::commands::{EngineCmd, TransposeStep};
use crate::engine_thread::EngineThread;
use crate::transport::Transport;

/// Owns the engine thread and wraps its channels with typed methods.
/// Dropping the handle shuts the engine down, panicking-off every tone.
pub struct EngineHandle {
    priority_tx: crossbeam_channel::Sender<EngineCmd>,
    control_tx: crossbeam_channel::Sender<EngineCmd>,
    feedback_rx: mpsc::Receiver<EngineFeedback>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Spawn the engine thread with the given collaborators.
    pub fn spawn(
        transport: Box<dyn Transport>,
        sound: Box<dyn SoundSink>,
        visual: Box<dyn VisualSink>,
        config: KeyboardConfig,
        transpose: i32,
    ) -> std::io::Result<Self> {
        let (priority_tx, priority_rx) = crossbeam_channel::unbounded();
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();

        let arbiter = NoteArbiter::new(sound, visual);
        let thread = std::thread::Builder::new()
            .name("celesta-engine".to_string())
            .spawn(move || {
                EngineThread::new(
                    arbiter,
                    transport,
                    config,
                    transpose,
                    priority_rx,
                    control_rx,
                    feedback_tx,
                )
                .run();
            })?;

        Ok(Self {
            priority_tx,
            control_tx,
            feedback_rx,
            thread: Some(thread),
        })
    }

    pub fn key_down(&self, tone: u8) {
        self.send_priority(EngineCmd::KeyDown { tone });
    }

    pub fn key_up(&self, tone: u8) {
        self.send_priority(EngineCmd::KeyUp { tone });
    }

    pub fn pointer_down(&self, key: usize) {
        self.send_priority(EngineCmd::PointerDown { key });
    }

    pub fn pointer_move(&self, key: Option<usize>) {
        self.send_priority(EngineCmd::PointerMove { key });
    }

    pub fn pointer_up(&self) {
        self.send_priority(EngineCmd::PointerUp);
    }

    pub fn pedal_engage(&self) {
        self.send_priority(EngineCmd::PedalEngage);
    }

    pub fn pedal_release(&self) {
        self.send_priority(EngineCmd::PedalRelease);
    }

    pub fn pedal_toggle(&self) {
        self.send_priority(EngineCmd::PedalToggle);
    }

    pub fn transpose(&self, step: TransposeStep) {
        self.send_priority(EngineCmd::Transpose(step));
    }

    pub fn all_notes_off(&self) {
        self.send_priority(EngineCmd::AllNotesOff);
    }

    pub fn focus_lost(&self) {
        self.send_priority(EngineCmd::FocusLost);
    }

    pub fn load_performance(&self, performance: Performance) {
        self.send_control(EngineCmd::LoadPerformance(performance));
    }

    /// Read a performance file and hand it to the engine.
    pub fn load_performance_file(&self, path: &Path) -> Result<(), PerformanceLoadError> {
        let performance = load_performance(path)?;
        self.load_performance(performance);
        Ok(())
    }

    pub fn stop_playback(&self) {
        self.send_control(EngineCmd::StopPlayback);
    }

    /// Atomically replace the keyboard configuration. Blocks until the
    /// engine has applied or rejected it; a rejected layout leaves the
    /// engine exactly as it was.
    pub fn reconfigure(
        &self,
        layout: &str,
        key_count: usize,
        lowest_tone: u8,
    ) -> Result<(), InvalidLayout> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let cmd = EngineCmd::Reconfigure {
            layout: layout.to_string(),
            key_count,
            lowest_tone,
            reply: reply_tx,
        };
        if self.control_tx.send(cmd).is_err() {
            log::warn!("reconfigure ignored: engine thread is gone");
            return Ok(());
        }
        // A dropped reply means the engine stopped mid-request; there is
        // no keyboard left to misconfigure.
        reply_rx.recv().unwrap_or(Ok(()))
    }

    /// Feedback accumulated since the last drain.
    pub fn drain_feedback(&self) -> Vec<EngineFeedback> {
        self.feedback_rx.try_iter().collect()
    }

    /// Stop the engine. Equivalent to dropping the handle.
    pub fn shutdown(self) {}

    fn send_priority(&self, cmd: EngineCmd) {
        let _ = self.priority_tx.send(cmd);
    }

    fn send_control(&self, cmd: EngineCmd) {
        let _ = self.control_tx.send(cmd);
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.control_tx.send(EngineCmd::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
