use crate::backend::gpu::{GpuBackend, ReadbackPoll};
use crate::backend::scalar::ScalarBackend;
use crate::field::{NoiseGrid, ViewportBounds};

/// Holds the last authoritative noise grid and arbitrates between the
/// accelerated and scalar backends. Never blocks: a frame always leaves with
/// a usable grid, even if it's the scalar bridge or yesterday's field.
pub struct PatternCache {
    grid: NoiseGrid,
    /// Bounds and pattern time of the last completed evaluation.
    stamp: Option<(ViewportBounds, f32)>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self {
            grid: NoiseGrid::empty(),
            stamp: None,
        }
    }

    /// Install a resolved accelerated readback, but only if its bounds still
    /// match what the caller wants now. Stale resolutions (superseded by a
    /// newer bounds request while in flight) are dropped — latest wins, no
    /// backlog. Returns whether the grid was replaced.
    fn apply_resolution(
        &mut self,
        resolved: ViewportBounds,
        time: f32,
        values: Vec<f32>,
        requested: ViewportBounds,
    ) -> bool {
        if resolved != requested {
            log::debug!("discarding stale pattern readback for {resolved:?}");
            return false;
        }
        // Wholesale replacement; readers never see a half-written grid.
        self.grid = NoiseGrid {
            bounds: resolved,
            values,
        };
        self.stamp = Some((resolved, time));
        true
    }

    /// The per-frame read path. Drains the accelerator's result slot, then
    /// serves a grid for `bounds`:
    ///
    /// - exact hit (same bounds, same time): the cached grid, unchanged;
    /// - same bounds, stale time: kick a dispatch and keep serving the cached
    ///   grid until the readback lands;
    /// - new bounds (or no accelerator): scalar bridge, synchronously, so the
    ///   caller is never stalled.
    ///
    /// A `Failed` poll or refused dispatch permanently downgrades the engine:
    /// `gpu` is taken and never rebuilt.
    pub fn get_current(
        &mut self,
        bounds: ViewportBounds,
        time: f32,
        complexity: f32,
        scalar: &ScalarBackend,
        gpu: &mut Option<GpuBackend>,
    ) -> &NoiseGrid {
        if let Some(backend) = gpu.as_mut() {
            match backend.poll() {
                ReadbackPoll::Ready {
                    bounds: resolved,
                    time: resolved_time,
                    values,
                } => {
                    self.apply_resolution(resolved, resolved_time, values, bounds);
                }
                ReadbackPoll::Failed => {
                    log::warn!("accelerated pattern backend lost; scalar-only from here on");
                    *gpu = None;
                }
                ReadbackPoll::Idle | ReadbackPoll::Pending => {}
            }
        }

        if self.stamp == Some((bounds, time)) {
            return &self.grid;
        }

        if let Some(backend) = gpu.as_mut() {
            if !backend.is_busy() {
                if let Err(e) = backend.dispatch(bounds, time, complexity) {
                    log::warn!("pattern dispatch refused ({e}); scalar-only from here on");
                    *gpu = None;
                }
            }
            // Same bounds at a newer time: the previous field is coherent
            // enough to show until the in-flight readback replaces it.
            if gpu.is_some() && self.stamp.is_some_and(|(b, _)| b == bounds) {
                return &self.grid;
            }
        }

        // Bounds changed or no accelerator: scalar bridge for this frame.
        self.grid = scalar.evaluate(bounds, time, complexity);
        self.stamp = Some((bounds, time));
        &self.grid
    }
}
