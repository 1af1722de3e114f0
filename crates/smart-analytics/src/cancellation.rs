//! Cooperative cancellation for long-running model fits.
//!
//! A caller that runs detection on a background thread keeps a clone of the
//! token and calls [`CancellationToken::cancel`] to stop the fit early:
//!
//! ```rust,ignore
//! use smart_analytics::{AnomalyDetector, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let handle = token.clone();
//!
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     handle.cancel();
//! });
//!
//! let outcome = AnomalyDetector::new(0.05)?
//!     .with_cancellation_token(token)
//!     .detect(&dataset);
//! ```

use crate::error::{AnalyticsError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe flag shared between a fit and whoever may abort it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// Tokens are handed to worker threads.
static_assertions::assert_impl_all!(CancellationToken: Send, Sync);

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Return `Err(Cancelled)` if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AnalyticsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(token.check().unwrap_err().is_cancelled());

        token.reset();
        assert!(!clone.is_cancelled());
        assert!(clone.check().is_ok());
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let token = CancellationToken::new();
        let handle = token.clone();
        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
