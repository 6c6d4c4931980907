//! Signal handling: SIGINT/SIGTERM request a graceful stop.
//!
//! Uses the `signal-hook` crate for safe signal registration. The sweeper
//! polls the flag before each directory rather than blocking on signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe interrupt state shared between the signal handler and the sweep.
///
/// `Ordering::Relaxed` is enough: the flag is polled and no other memory
/// is published through it.
#[derive(Clone, Debug)]
pub struct SignalHandler {
    interrupt_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register SIGINT/SIGTERM hooks.
    ///
    /// Registration is best-effort; failures are reported to stderr but not fatal.
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    /// Handler whose flag only flips through [`Self::request_interrupt`].
    pub fn unregistered() -> Self {
        Self {
            interrupt_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether an interrupt has been requested.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt_flag.load(Ordering::Relaxed)
    }

    /// Programmatically request a stop.
    pub fn request_interrupt(&self) {
        self.interrupt_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.interrupt_flag)) {
            eprintln!("[PYS-SIGNAL] failed to register SIGINT: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.interrupt_flag)) {
            eprintln!("[PYS-SIGNAL] failed to register SIGTERM: {e}");
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
