//! Cancellable progress reporting for long-running passes.
//!
//! Every long pass in this crate accepts an `Option<&ProgressCallback>`.
//! The callback receives a monotonically non-decreasing fraction in
//! `[0.0, 1.0]` and returns `true` to continue or `false` to request
//! cancellation. A cancelled pass returns [`FanError::Cancelled`] and its
//! output is discarded.
//!
//! # Example
//!
//! ```
//! use mesh_fans::progress::ProgressCallback;
//!
//! let callback: ProgressCallback = Box::new(|fraction| {
//!     println!("{:.0}%", fraction * 100.0);
//!     true // keep going
//! });
//! assert!(callback(0.5));
//! ```
//!
//! [`FanError::Cancelled`]: crate::FanError::Cancelled

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Callback invoked with a fraction of completed work in `[0.0, 1.0]`.
///
/// Returns `false` to request cancellation.
pub type ProgressCallback = Box<dyn Fn(f64) -> bool + Send + Sync>;

/// Reports `fraction` to the callback if one is present.
///
/// Returns `false` if the callback requested cancellation.
pub(crate) fn report(progress: Option<&ProgressCallback>, fraction: f64) -> bool {
    progress.map_or(true, |callback| callback(fraction))
}

/// Shared work counter that maps completed items into a `[lo, hi]`
/// progress sub-range.
///
/// Safe to bump from multiple rayon workers: reported fractions stay
/// monotone because only a worker that advances the latched permille
/// value invokes the callback, and a cancellation latches a flag that
/// every worker observes on its next bump.
pub(crate) struct ProgressCounter<'a> {
    progress: Option<&'a ProgressCallback>,
    done: AtomicUsize,
    total: usize,
    reported_permille: AtomicUsize,
    cancelled: AtomicBool,
    lo: f64,
    hi: f64,
}

impl<'a> ProgressCounter<'a> {
    /// Granularity of cooperative cancellation checks, in work items.
    pub const CHECK_EVERY: usize = 1024;

    pub fn new(progress: Option<&'a ProgressCallback>, total: usize, lo: f64, hi: f64) -> Self {
        Self {
            progress,
            done: AtomicUsize::new(0),
            total: total.max(1),
            reported_permille: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            lo,
            hi,
        }
    }

    /// Records `items` completed work items, reporting progress at a
    /// coarse granularity. Returns `false` once cancellation was
    /// requested by any worker.
    pub fn add(&self, items: usize) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return false;
        }
        let Some(callback) = self.progress else {
            return true;
        };
        let done = self.done.fetch_add(items, Ordering::Relaxed) + items;
        let permille = done.min(self.total) * 1000 / self.total;
        let prev = self.reported_permille.fetch_max(permille, Ordering::Relaxed);
        if permille > prev {
            let fraction = self.lo + (self.hi - self.lo) * permille as f64 / 1000.0;
            if !callback(fraction) {
                self.cancelled.store(true, Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
