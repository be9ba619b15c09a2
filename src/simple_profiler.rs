//! Simple profiling counters using thread-local storage
//!
//! Lightweight timing of the decision pipeline without changing function signatures.
//! Enable with environment variable: BATTLESNAKE_PROFILE=1
//!
//! Guards record into thread-local slots; call [`merge_thread_local`] on the thread that
//! did the work to fold its counts into the global totals before [`print_report`].

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

const CATEGORIES: [&str; 6] = [
    "candidate_gen",
    "strategy",
    "prediction",
    "scoring",
    "flood_fill",
    "astar",
];

const LABELS: [&str; 6] = [
    "Candidate Generation",
    "Strategy Analysis",
    "Enemy Prediction",
    "Move Scoring",
    "Flood Fill",
    "A* Search",
];

thread_local! {
    static TIMES: RefCell<[u64; 6]> = RefCell::new([0; 6]);
    static COUNTS: RefCell<[usize; 6]> = RefCell::new([0; 6]);
    static DEADLINE_ABORTS: RefCell<usize> = RefCell::new(0);
}

// Global aggregators
static GLOBAL_TIMES: [AtomicU64; 6] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static GLOBAL_COUNTS: [AtomicUsize; 6] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];
static GLOBAL_DEADLINE_ABORTS: AtomicUsize = AtomicUsize::new(0);

#[inline]
pub fn is_profiling_enabled() -> bool {
    std::env::var("BATTLESNAKE_PROFILE").is_ok()
}

fn category_index(category: &str) -> Option<usize> {
    CATEGORIES.iter().position(|&c| c == category)
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        if let Some(idx) = category_index(self.category) {
            TIMES.with(|t| t.borrow_mut()[idx] += elapsed_ns);
            COUNTS.with(|c| c.borrow_mut()[idx] += 1);
        }
    }
}

/// Counts a turn whose candidate scoring stopped at the deadline
#[inline]
pub fn record_deadline_abort() {
    if is_profiling_enabled() {
        DEADLINE_ABORTS.with(|c| *c.borrow_mut() += 1);
    }
}

/// Folds this thread's counters into the global totals and clears them
pub fn merge_thread_local() {
    TIMES.with(|t| {
        let mut times = t.borrow_mut();
        for (global, local) in GLOBAL_TIMES.iter().zip(times.iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    COUNTS.with(|c| {
        let mut counts = c.borrow_mut();
        for (global, local) in GLOBAL_COUNTS.iter().zip(counts.iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    DEADLINE_ABORTS.with(|c| {
        let mut aborts = c.borrow_mut();
        GLOBAL_DEADLINE_ABORTS.fetch_add(*aborts, Ordering::Relaxed);
        *aborts = 0;
    });
}

/// Global (time in ns, call count) for a category
pub fn totals(category: &str) -> Option<(u64, usize)> {
    category_index(category).map(|idx| {
        (
            GLOBAL_TIMES[idx].load(Ordering::Relaxed),
            GLOBAL_COUNTS[idx].load(Ordering::Relaxed),
        )
    })
}

pub fn print_report(total_time_ms: u64) {
    let total_ns = total_time_ms.saturating_mul(1_000_000);

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("PROFILING REPORT ({}ms total)", total_time_ms);
    eprintln!("═══════════════════════════════════════════════════════════\n");

    for (idx, label) in LABELS.iter().enumerate() {
        let time = GLOBAL_TIMES[idx].load(Ordering::Relaxed);
        let count = GLOBAL_COUNTS[idx].load(Ordering::Relaxed);
        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!(
            "  {:<22} {:>9.2}ms ({:>5.1}%) - {} calls, {:.2}µs avg",
            label, ms, pct, count, avg_us
        );
    }

    eprintln!(
        "\n  Deadline aborts:       {}",
        GLOBAL_DEADLINE_ABORTS.load(Ordering::Relaxed)
    );
    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_label() {
        assert_eq!(CATEGORIES.len(), LABELS.len());
        assert_eq!(category_index("astar"), Some(5));
        assert_eq!(category_index("alpha_beta"), None);
    }

    #[test]
    fn test_guard_records_and_merges() {
        // Drop a guard directly so the test does not depend on the environment
        {
            let _guard = ProfileGuard {
                start: Instant::now(),
                category: "prediction",
            };
        }
        let local = COUNTS.with(|c| c.borrow()[2]);
        assert!(local >= 1);

        merge_thread_local();
        assert_eq!(COUNTS.with(|c| c.borrow()[2]), 0);
        let (_, count) = totals("prediction").expect("known category");
        assert!(count >= 1);
    }
}
