//! Process-wide crawl state shared by all workers
//!
//! Small thread-safe wrappers around the mutable state of a run: the
//! visited set, the page counter with its progress threshold, and the
//! stop event. Each hides its locking discipline behind a minimal API so
//! lookup-then-insert races cannot leak out.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Raw URLs already dispatched to a worker during this run
///
/// Membership is process-local; durable dedup across runs lives in the
/// metadata cache at the content level.
pub struct VisitedSet {
    inner: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashSet::new()),
        }
    }

    /// Atomically records a URL; returns true if it was not yet present
    ///
    /// The single critical section makes lookup-then-insert safe: exactly
    /// one worker wins for a given URL.
    pub fn insert(&self, url: &str) -> bool {
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        let set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(url)
    }

    pub fn len(&self) -> usize {
        let set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-writer, multi-reader stop flag
///
/// Workers observe the flag on every loop iteration, so a set becomes
/// visible within one frontier-pop timeout.
pub struct StopEvent {
    flag: AtomicBool,
}

impl StopEvent {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for StopEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of asking the counter to admit one more page
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    /// Admitted; carries the running page count
    Admitted(u64),
    /// The configured budget is exhausted
    BudgetHit,
}

struct CounterInner {
    visited: u64,
    next_report: u64,
}

/// Shared page counter with budget and progress-report bookkeeping
///
/// The count and the next-report threshold advance under the same lock,
/// so progress lines are emitted exactly once per threshold no matter how
/// many workers race past it.
pub struct PageCounter {
    inner: Mutex<CounterInner>,
    max_pages: u64,
    report_every: u64,
}

impl PageCounter {
    /// Creates a counter; `max_pages` of zero disables the budget
    pub fn new(max_pages: u64, report_every: u64) -> Self {
        Self {
            inner: Mutex::new(CounterInner {
                visited: 0,
                next_report: report_every,
            }),
            max_pages,
            report_every,
        }
    }

    /// Admits one page, or reports the budget as hit
    ///
    /// A budget hit does not advance the count, so the summary reflects
    /// only pages actually dispatched.
    pub fn record(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if self.max_pages > 0 && inner.visited >= self.max_pages {
            return Admission::BudgetHit;
        }
        inner.visited += 1;
        Admission::Admitted(inner.visited)
    }

    /// Returns the page count when a report threshold has been crossed
    ///
    /// Advances the threshold as a side effect; the caller logs the line.
    pub fn take_report(&self) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.visited >= inner.next_report {
            inner.next_report += self.report_every;
            Some(inner.visited)
        } else {
            None
        }
    }

    /// Pages dispatched so far
    pub fn count(&self) -> u64 {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.visited
    }
}
