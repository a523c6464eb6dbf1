/// Rasterizer instrumentation.
///
/// [`StageTimer`] measures one pipeline stage (shadow pass, resolve) and
/// reports it through `log` when it goes out of scope. The sample and
/// triangle counters live in [`profiling`].
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

/// Wall-clock timer for a named stage, logged at debug level on drop.
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    #[inline]
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        log::debug!(target: "tile_raster::perf", "{} took {:.2?}", self.stage, self.elapsed());
    }
}

/// Time the rest of the enclosing block as stage `$stage`.
#[macro_export]
macro_rules! time_stage {
    ($stage:expr) => {
        let _stage_timer = $crate::perf::StageTimer::start($stage);
    };
}
