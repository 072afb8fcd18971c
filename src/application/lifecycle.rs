//! Loading flag shared between a form and its in-flight submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

#[derive(Debug, Default)]
pub struct FormLifecycle {
    loading: AtomicBool,
    unmounted: AtomicBool,
}

impl FormLifecycle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.unmounted.store(true, Ordering::Release);
    }

    /// Set the loading flag unless a submission already holds it or the form
    /// is gone. The flag is released when the returned guard drops.
    pub fn try_begin(self: &Arc<Self>) -> Option<LoadingGuard> {
        if !self.is_mounted() {
            return None;
        }
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(LoadingGuard {
            lifecycle: Arc::clone(self),
            armed: true,
        })
    }

    fn finish(&self) {
        if !self.is_mounted() {
            debug!("form unmounted before submission finished; loading flag left untouched");
            return;
        }
        self.loading.store(false, Ordering::Release);
    }
}

/// Holds the loading flag for one submission attempt.
#[derive(Debug)]
#[must_use = "dropping the guard clears the loading flag"]
pub struct LoadingGuard {
    lifecycle: Arc<FormLifecycle>,
    armed: bool,
}

impl LoadingGuard {
    /// Clear the loading flag now.
    pub fn release(self) {
        drop(self);
    }

    /// Give up the guard without clearing the flag. The form stays in its
    /// loading state until it is dropped.
    pub fn leak(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.armed {
            self.lifecycle.finish();
        }
    }
}
