//! Transport boundary: the external player that owns the performance clock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The moving position over a loaded performance. Implementations must be
/// cheap to poll; the engine reads them once per tick.
pub trait Transport: Send {
    /// Current position in performance ticks, monotonically advancing
    /// while running.
    fn position(&self) -> u64;
    fn is_running(&self) -> bool;
}

/// A transport driven by the host: a shared tick counter and running flag.
/// Cloning yields another handle onto the same clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTransport {
    inner: Arc<TransportState>,
}

#[derive(Debug, Default)]
struct TransportState {
    tick: AtomicU64,
    running: AtomicBool,
}

impl ManualTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, tick: u64) {
        self.inner.tick.store(tick, Ordering::Relaxed);
    }

    pub fn advance(&self, ticks: u64) {
        self.inner.tick.fetch_add(ticks, Ordering::Relaxed);
    }

    pub fn set_running(&self, running: bool) {
        self.inner.running.store(running, Ordering::Relaxed);
    }
}

impl Transport for ManualTransport {
    fn position(&self) -> u64 {
        self.inner.tick.load(Ordering::Relaxed)
    }

    fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Relaxed)
    }
}
