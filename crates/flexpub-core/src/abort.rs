//! Cancellation for a running publish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Handle for cancelling a publish.
///
/// Clones share one flag: any clone can trigger the abort and every other
/// clone observes it. The orchestrator checks it between stages, and the
/// optimizer invoker polls it while the external process runs.
///
/// # Example
///
/// ```
/// use flexpub_core::AbortHandle;
///
/// let handle = AbortHandle::new();
/// let ui_side = handle.clone();
///
/// assert!(!handle.is_aborted());
/// ui_side.abort();
/// assert!(handle.is_aborted());
/// ```
#[derive(Clone, Default, Debug)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Create a new abort handle.
    pub fn new() -> Self {
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Request abort.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Return [`Error::Aborted`] if abort has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_flag() {
        let handle = AbortHandle::new();
        let other = handle.clone();
        assert!(handle.check().is_ok());

        other.abort();
        assert!(handle.is_aborted());
        assert!(matches!(handle.check(), Err(Error::Aborted)));
    }
}
