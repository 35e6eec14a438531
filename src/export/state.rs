//! Observable busy/error state of an exporter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Busy flag and last error of an exporter, shared with whoever displays
/// them.
///
/// Overlapping export calls are not coordinated: each call resets the state
/// on entry and the last call to finish wins.
#[derive(Debug, Default)]
pub struct ExportState {
    exporting: AtomicBool,
    error: Mutex<Option<String>>,
}

impl ExportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an export call is running.
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    /// Message of the last failed export, until cleared or the next call.
    pub fn export_error(&self) -> Option<String> {
        self.lock_error().clone()
    }

    /// Dismiss the last error.
    pub fn clear_error(&self) {
        *self.lock_error() = None;
    }

    /// Mark a call as started. The flag drops back when the guard does.
    pub(crate) fn begin(&self) -> BusyGuard<'_> {
        *self.lock_error() = None;
        self.exporting.store(true, Ordering::SeqCst);
        BusyGuard { state: self }
    }

    pub(crate) fn fail(&self, message: impl Into<String>) {
        *self.lock_error() = Some(message.into());
    }

    fn lock_error(&self) -> MutexGuard<'_, Option<String>> {
        match self.error.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Clears the busy flag on every exit path.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a> {
    state: &'a ExportState,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.exporting.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_sets_busy_and_resets_error() {
        let state = ExportState::new();
        state.fail("old");
        {
            let _busy = state.begin();
            assert!(state.is_exporting());
            assert_eq!(state.export_error(), None);
        }
        assert!(!state.is_exporting());
    }

    #[test]
    fn test_busy_flag_clears_on_panic_unwind() {
        let state = ExportState::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _busy = state.begin();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!state.is_exporting());
    }

    #[test]
    fn test_clear_error_dismisses_message() {
        let state = ExportState::new();
        state.fail("SVG content missing");
        assert_eq!(state.export_error().as_deref(), Some("SVG content missing"));
        state.clear_error();
        assert_eq!(state.export_error(), None);
    }
}
