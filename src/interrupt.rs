//! Operator interrupt (Ctrl+C) tracking.
//!
//! SIGINT is captured into a flag instead of terminating the process, so an
//! interrupted wait unwinds as [`VkError::Interrupted`] and every open
//! configuration session still restores the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::{Result, VkError};

/// Shared flag set when the operator presses Ctrl+C.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Create a flag that is not wired to any signal (tests, library use).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag raised by SIGINT.
    ///
    /// Falls back to an unwired flag if the handler cannot be registered.
    #[must_use]
    pub fn install() -> Self {
        let flag = Self::new();
        match signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag.raised)) {
            Ok(_) => debug!("SIGINT handler registered"),
            Err(e) => warn!(error = %e, "Failed to register SIGINT handler"),
        }
        flag
    }

    /// Raise the flag manually.
    pub fn trigger(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Fail with [`VkError::Interrupted`] once the flag is raised.
    pub fn check(&self) -> Result<()> {
        if self.is_raised() {
            Err(VkError::Interrupted)
        } else {
            Ok(())
        }
    }
}
