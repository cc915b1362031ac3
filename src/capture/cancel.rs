use crate::foundation::error::{CaptureError, CaptureResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation shared between a host and a running export.
///
/// The export checks the flag at frame boundaries (before prepare, capture and encode), so a
/// cancelled export stops between frames and never leaves a half-encoded frame behind.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an un-cancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelFlag::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(CaptureError::Cancelled)` once cancelled.
    pub fn check(&self) -> CaptureResult<()> {
        if self.is_cancelled() {
            Err(CaptureError::Cancelled)
        } else {
            Ok(())
        }
    }
}
