//! Progress reporting and cancellation for long-running decompositions.
//!
//! The orchestrator reports a beat before each stage and each cell. Callbacks
//! return `bool`: `true` to continue, `false` to request cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A progress snapshot passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Current progress value.
    pub current: u64,
    /// Total expected value.
    pub total: u64,
    /// Human-readable description of the current step.
    pub message: String,
    /// Time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, if computable.
    pub estimated_remaining: Option<Duration>,
}

impl Progress {
    /// Create a new progress snapshot.
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            elapsed: Duration::ZERO,
            estimated_remaining: None,
        }
    }

    /// Progress as a fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.current as f64 / self.total as f64).min(1.0)
    }

    /// Progress as a percentage in [0, 100].
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Whether the operation has reached its total.
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Callback invoked with progress updates.
///
/// Return `true` to continue, `false` to cancel the operation.
pub type ProgressCallback = Box<dyn Fn(&Progress) -> bool + Send + Sync>;

/// Thread-safe progress tracker with throttled callback dispatch.
///
/// Tracks a monotonically increasing counter toward a fixed total, a
/// cancellation flag, and the last time a callback fired so updates are
/// rate-limited to the callback interval (100 ms by default).
#[derive(Debug)]
pub struct ProgressTracker {
    current: AtomicU64,
    total: u64,
    cancelled: AtomicBool,
    start_time: Instant,
    last_callback_time: Mutex<Instant>,
    callback_interval: Duration,
}

impl ProgressTracker {
    /// Create a tracker with the default 100 ms callback interval.
    pub fn new(total: u64) -> Self {
        Self::with_interval(total, Duration::from_millis(100))
    }

    /// Create a tracker with a custom callback interval.
    ///
    /// Use `Duration::ZERO` in tests to make every update fire.
    pub fn with_interval(total: u64, callback_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            current: AtomicU64::new(0),
            total,
            cancelled: AtomicBool::new(false),
            start_time: now,
            // Backdate so the first update always fires.
            last_callback_time: Mutex::new(now.checked_sub(callback_interval).unwrap_or(now)),
            callback_interval,
        }
    }

    /// Advance progress by one unit.
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Advance progress by `n` units.
    pub fn increment_by(&self, n: u64) {
        self.current.fetch_add(n, Ordering::Relaxed);
    }

    /// Set progress to an absolute value.
    pub fn set(&self, value: u64) {
        self.current.store(value, Ordering::Relaxed);
    }

    /// Current progress value.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    /// Total expected value.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Progress as a fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.current() as f64 / self.total as f64).min(1.0)
    }

    /// Time elapsed since the tracker was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Estimate remaining time from the observed rate.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let fraction = self.fraction();
        if fraction <= 0.0 || fraction >= 1.0 {
            return None;
        }
        let elapsed = self.elapsed().as_secs_f64();
        let remaining = elapsed * (1.0 - fraction) / fraction;
        Some(Duration::from_secs_f64(remaining))
    }

    /// Build a progress snapshot with the given message.
    pub fn snapshot(&self, message: impl Into<String>) -> Progress {
        Progress {
            current: self.current(),
            total: self.total,
            message: message.into(),
            elapsed: self.elapsed(),
            estimated_remaining: self.estimated_remaining(),
        }
    }

    /// Invoke the callback if the throttle interval has passed.
    ///
    /// Returns `false` when the operation should stop (the callback returned
    /// `false` now or earlier). Throttled updates return `true` without
    /// invoking the callback; completion updates always fire.
    pub fn maybe_callback(&self, callback: Option<&ProgressCallback>, message: String) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let Some(cb) = callback else {
            return true;
        };

        let now = Instant::now();
        {
            let mut last = self.last_callback_time.lock().unwrap();
            let complete = self.current() >= self.total;
            if !complete && now.duration_since(*last) < self.callback_interval {
                return true;
            }
            *last = now;
        }

        let snapshot = self.snapshot(message);
        if !cb(&snapshot) {
            self.cancel();
            return false;
        }
        true
    }
}

/// A progress tracker that can be shared across threads.
pub type SharedProgressTracker = Arc<ProgressTracker>;

/// Create a shared progress tracker.
pub fn shared_tracker(total: u64) -> SharedProgressTracker {
    Arc::new(ProgressTracker::new(total))
}
