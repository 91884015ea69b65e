use instant::Instant;

use crate::backend::gpu::GpuBackend;
use crate::backend::scalar::ScalarBackend;
use crate::cache::PatternCache;
use crate::clock::AnimationClock;
use crate::compose;
use crate::config::{PatternMode, PatternOptions};
use crate::field::{PatternField, ViewportBounds};
use crate::trail::TrailTracker;

/// Trail sweep cadence in frames (~0.5s at 60fps).
const TRAIL_SWEEP_INTERVAL: u64 = 30;

/// The pattern synthesis engine. One instance per drawing surface; not
/// designed for concurrent external mutation.
///
/// Per frame: `tick()` advances pattern time, then `generate()` returns the
/// sparse cell map for the current viewport. `generate` never blocks and
/// never fails — the worst case is a lower-resolution scalar field.
pub struct PatternEngine {
    /// Live configuration, read (and sanitized) each frame.
    pub options: PatternOptions,
    clock: AnimationClock,
    cache: PatternCache,
    scalar: ScalarBackend,
    /// Dropped permanently on the first accelerator failure.
    gpu: Option<GpuBackend>,
    trail: TrailTracker,
    epoch: Instant,
    frame_count: u64,
}

impl PatternEngine {
    /// Engine with the accelerated backend if a usable adapter exists.
    pub fn new() -> Self {
        Self::with_backend(GpuBackend::new())
    }

    /// Scalar-only engine; useful headless and in tests.
    pub fn without_accelerator() -> Self {
        Self::with_backend(None)
    }

    fn with_backend(gpu: Option<GpuBackend>) -> Self {
        Self {
            options: PatternOptions::default(),
            clock: AnimationClock::new(),
            cache: PatternCache::new(),
            scalar: ScalarBackend::new(),
            gpu,
            trail: TrailTracker::new(),
            epoch: Instant::now(),
            frame_count: 0,
        }
    }

    pub fn has_accelerator(&self) -> bool {
        self.gpu.is_some()
    }

    /// Current pattern time.
    pub fn pattern_time(&self) -> f32 {
        self.clock.time()
    }

    /// Advance the engine by one display frame. While disabled the clock is
    /// fully suspended — a disabled pattern costs nothing per frame — but the
    /// last cached field is preserved for a cheap re-enable.
    pub fn tick(&mut self) {
        let opts = self.options.sanitized();
        if opts.enabled && opts.mode == PatternMode::Active {
            self.clock.advance(opts.speed);
        }

        self.frame_count += 1;
        if self.frame_count % TRAIL_SWEEP_INTERVAL == 0 {
            let now = self.now_ms();
            self.trail.purge_expired(now, opts.trail_fade_duration_ms);
        }
    }

    /// Feed a pointer position in world coordinates. Ignored while trails are
    /// off; jitter below the movement threshold is dropped by the tracker.
    pub fn report_pointer_position(&mut self, x: f32, y: f32) {
        let opts = self.options.sanitized();
        if !opts.trails_enabled {
            return;
        }
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let now = self.now_ms();
        self.trail.report(
            x,
            y,
            now,
            opts.trail_intensity,
            opts.trail_fade_duration_ms,
        );
    }

    /// The per-frame query: the sparse cell map for `bounds`, with the trail
    /// blended in. Disabled engine or malformed bounds give an empty map.
    pub fn generate(&mut self, bounds: ViewportBounds, accent_hex: &str) -> PatternField {
        let opts = self.options.sanitized();
        if !opts.enabled || opts.mode == PatternMode::Disabled {
            return PatternField::new();
        }
        if bounds.is_empty() {
            return PatternField::new();
        }

        let time = self.clock.time();
        let now = self.now_ms();
        let grid = self
            .cache
            .get_current(bounds, time, opts.complexity, &self.scalar, &mut self.gpu);
        compose::compose(grid, &self.trail, &opts, accent_hex, time, now)
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}
