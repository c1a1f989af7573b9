//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is a shared flag handed to every blocking
//! primitive. Primitives poll it at defined points (once per step for
//! direct-pulse motors, before every relay or motor command, between pause
//! slices) and fail with [`Error::Cancelled`] once it is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared operator-stop flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the cleared state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the stop flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the stop flag (start of a recipe run).
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Check whether a stop was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Poll point: fail with [`Error::Cancelled`] if a stop was requested.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// A handle that can only request a stop.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.clone(),
        }
    }
}

/// Cloneable, `Send` handle given to the host UI for its stop button.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Request an operator stop.
    pub fn stop(&self) {
        tracing::warn!("Stop requested");
        self.token.cancel();
    }

    /// Check whether a stop is pending.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}
