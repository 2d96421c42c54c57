//! Cross-thread continuation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "keep operating" flag.
///
/// The driver owns the lifecycle: it raises the flag after a successful
/// handshake and checks it before every blocking read. The protocol engine
/// only lowers it (on ERROR or on the DISCONNECT receipt). Clones share the
/// same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new(running: bool) -> Self {
        Self(Arc::new(AtomicBool::new(running)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn start(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}
