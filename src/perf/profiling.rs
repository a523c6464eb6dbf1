/// Triangle and sample counters for the tile workers.
///
/// The `count_*` macros compile to nothing unless the `profiling` feature is
/// on, so the counters stay at zero in normal builds.
use std::sync::atomic::{AtomicU64, Ordering};

/// Totals since the last [`FunctionCounters::reset`]. Relaxed ordering; read
/// them only after a draw has returned.
pub struct FunctionCounters {
    // mesh setup
    pub triangles_submitted: AtomicU64,
    pub triangles_clipped: AtomicU64,
    pub triangles_binned: AtomicU64,

    // tile workers
    pub triangles_culled: AtomicU64,
    pub tiles_rendered: AtomicU64,

    // per sample
    pub samples_tested: AtomicU64,
    pub depth_passed: AtomicU64,
    pub depth_failed: AtomicU64,
    pub fragments_discarded: AtomicU64,

    pub framebuffer_clears: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            triangles_submitted: AtomicU64::new(0),
            triangles_clipped: AtomicU64::new(0),
            triangles_binned: AtomicU64::new(0),
            triangles_culled: AtomicU64::new(0),
            tiles_rendered: AtomicU64::new(0),
            samples_tested: AtomicU64::new(0),
            depth_passed: AtomicU64::new(0),
            depth_failed: AtomicU64::new(0),
            fragments_discarded: AtomicU64::new(0),
            framebuffer_clears: AtomicU64::new(0),
        }
    }

    pub fn reset(&self) {
        self.triangles_submitted.store(0, Ordering::Relaxed);
        self.triangles_clipped.store(0, Ordering::Relaxed);
        self.triangles_binned.store(0, Ordering::Relaxed);
        self.triangles_culled.store(0, Ordering::Relaxed);
        self.tiles_rendered.store(0, Ordering::Relaxed);
        self.samples_tested.store(0, Ordering::Relaxed);
        self.depth_passed.store(0, Ordering::Relaxed);
        self.depth_failed.store(0, Ordering::Relaxed);
        self.fragments_discarded.store(0, Ordering::Relaxed);
        self.framebuffer_clears.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            triangles_submitted: self.triangles_submitted.load(Ordering::Relaxed),
            triangles_clipped: self.triangles_clipped.load(Ordering::Relaxed),
            triangles_binned: self.triangles_binned.load(Ordering::Relaxed),
            triangles_culled: self.triangles_culled.load(Ordering::Relaxed),
            tiles_rendered: self.tiles_rendered.load(Ordering::Relaxed),
            samples_tested: self.samples_tested.load(Ordering::Relaxed),
            depth_passed: self.depth_passed.load(Ordering::Relaxed),
            depth_failed: self.depth_failed.load(Ordering::Relaxed),
            fragments_discarded: self.fragments_discarded.load(Ordering::Relaxed),
            framebuffer_clears: self.framebuffer_clears.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the counters, for logging or comparing two frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterSnapshot {
    pub triangles_submitted: u64,
    pub triangles_clipped: u64,
    pub triangles_binned: u64,
    pub triangles_culled: u64,
    pub tiles_rendered: u64,
    pub samples_tested: u64,
    pub depth_passed: u64,
    pub depth_failed: u64,
    pub fragments_discarded: u64,
    pub framebuffer_clears: u64,
}

impl CounterSnapshot {
    /// One info line per counter plus the depth-test pass rate.
    pub fn log_report(&self) {
        log::info!("=== Rasterizer counters ===");
        log::info!("  triangles submitted:   {:12}", self.triangles_submitted);
        log::info!("  triangles clipped:     {:12}", self.triangles_clipped);
        log::info!("  triangles binned:      {:12}", self.triangles_binned);
        log::info!("  triangles culled:      {:12}", self.triangles_culled);
        log::info!("  tiles rendered:        {:12}", self.tiles_rendered);
        log::info!("  samples tested:        {:12}", self.samples_tested);
        log::info!("  depth test passed:     {:12}", self.depth_passed);
        log::info!("  depth test failed:     {:12}", self.depth_failed);
        if self.samples_tested > 0 {
            let pass_rate = (self.depth_passed as f64 / self.samples_tested as f64) * 100.0;
            log::info!("  depth test pass rate:  {:11.2}%", pass_rate);
        }
        log::info!("  fragments discarded:   {:12}", self.fragments_discarded);
        log::info!("  framebuffer clears:    {:12}", self.framebuffer_clears);
    }
}

pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// `counter += 1` under `profiling`.
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// `counter += value` under `profiling`.
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value as u64, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_stores_and_reset() {
        let counters = FunctionCounters::new();
        counters.samples_tested.fetch_add(10, Ordering::Relaxed);
        counters.depth_passed.fetch_add(4, Ordering::Relaxed);

        let snap = counters.snapshot();
        assert_eq!(snap.samples_tested, 10);
        assert_eq!(snap.depth_passed, 4);

        counters.reset();
        let snap = counters.snapshot();
        assert_eq!(snap.samples_tested, 0);
        assert_eq!(snap.depth_passed, 0);
    }
}
