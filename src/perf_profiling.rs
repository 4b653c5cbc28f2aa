//! Optional frame profiling.
//!
//! This module provides:
//! - Timing wrappers (`console.time`/`console.timeEnd` on WASM, `Instant` natively)
//! - Periodic logging of frame statistics
//! - A runtime toggle, off by default
//!
//! All profiling is controlled via `set_profiling_enabled()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::morph::MorphState;

/// Global flag to enable/disable performance profiling.
static PROFILING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Frame counter for periodic logging.
static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How often to log frame statistics.
const STATS_LOG_INTERVAL: u64 = 300; // ~5 seconds at 60fps

pub fn is_profiling_enabled() -> bool {
    PROFILING_ENABLED.load(Ordering::Relaxed)
}

pub fn set_profiling_enabled(enabled: bool) {
    PROFILING_ENABLED.store(enabled, Ordering::Relaxed);
    if enabled {
        log::info!("Performance profiling ENABLED");
    } else {
        log::info!("Performance profiling DISABLED");
    }
}

/// Increment frame counter and return true if this frame's stats should be logged.
pub fn should_log_stats() -> bool {
    if !is_profiling_enabled() {
        return false;
    }
    let frame = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    frame % STATS_LOG_INTERVAL == 0
}

pub fn reset_frame_counter() {
    FRAME_COUNTER.store(0, Ordering::Relaxed);
}

#[cfg(target_arch = "wasm32")]
mod timing {
    use super::is_profiling_enabled;
    use web_sys::console;

    /// Execute a closure with console timing around it.
    pub fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
        if is_profiling_enabled() {
            console::time_with_label(label);
            let result = f();
            console::time_end_with_label(label);
            result
        } else {
            f()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod timing {
    use super::is_profiling_enabled;
    use std::time::Instant;

    /// Execute a closure and log how long it took.
    pub fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
        if is_profiling_enabled() {
            let start = Instant::now();
            let result = f();
            let elapsed = start.elapsed();
            log::info!("[PERF] {}: {:.2}ms", label, elapsed.as_secs_f64() * 1000.0);
            result
        } else {
            f()
        }
    }
}

pub use timing::timed;

/// Snapshot of one frame's workload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub state: MorphState,
    pub progress: f32,
    pub eased: f32,
    /// (class name, instance count) for every mesh class.
    pub instances: Vec<(&'static str, usize)>,
    pub dust_points: usize,
}

impl FrameStats {
    /// Total particles recomputed per frame.
    pub fn total_particles(&self) -> usize {
        self.instances.iter().map(|(_, n)| n).sum::<usize>() + self.dust_points
    }

    pub fn log(&self) {
        let classes = self
            .instances
            .iter()
            .map(|(name, n)| format!("{}={}", name, n))
            .collect::<Vec<_>>()
            .join(", ");
        log::info!(
            "[PERF] Frame {} ({}): progress={:.4} eased={:.4} | {} dust={} total={}",
            self.frame,
            self.state,
            self.progress,
            self.eased,
            classes,
            self.dust_points,
            self.total_particles()
        );
    }
}

/// Time a block of code under a label.
/// Usage: `perf_time!("label", { expensive_operation() })`
#[macro_export]
macro_rules! perf_time {
    ($label:expr, $body:expr) => {
        $crate::perf_profiling::timed($label, || $body)
    };
}
