use crate::field::{NoiseGrid, ViewportBounds};
use crate::noise;

/// Synchronous single-threaded evaluator. Always available; completes within
/// the calling frame and keeps no internal state.
///
/// Doubles as the bridge for every frame in which the accelerated backend has
/// not yet produced a result for the current bounds.
pub struct ScalarBackend;

impl ScalarBackend {
    pub fn new() -> Self {
        Self
    }

    /// Subsampling stride: evaluate every Nth cell and replicate to the N×N
    /// block, trading resolution for frame cost.
    fn stride(complexity: f32) -> usize {
        (3.0 - complexity * 2.0).floor().max(1.0) as usize
    }

    pub fn evaluate(&self, bounds: ViewportBounds, time: f32, complexity: f32) -> NoiseGrid {
        if bounds.is_empty() {
            return NoiseGrid::empty();
        }
        let w = bounds.width() as usize;
        let h = bounds.height() as usize;
        let step = Self::stride(complexity);

        let mut values = vec![0.0f32; w * h];
        for by in (0..h).step_by(step) {
            for bx in (0..w).step_by(step) {
                let v = noise::sample(
                    (bounds.min_x + bx as i32) as f32,
                    (bounds.min_y + by as i32) as f32,
                    time,
                    complexity,
                );
                // Replicate into the block, clipped to the grid edge.
                for dy in 0..step.min(h - by) {
                    let row = (by + dy) * w;
                    for dx in 0..step.min(w - bx) {
                        values[row + bx + dx] = v;
                    }
                }
            }
        }
        NoiseGrid { bounds, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_synchronously_and_non_empty() {
        let backend = ScalarBackend::new();
        let grid = backend.evaluate(ViewportBounds::new(0, 0, 10, 10), 0.0, 1.0);
        assert_eq!(grid.values.len(), 121);
        assert!(grid.values.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn empty_bounds_yield_empty_grid() {
        let backend = ScalarBackend::new();
        let grid = backend.evaluate(ViewportBounds::EMPTY, 1.0, 1.0);
        assert!(grid.values.is_empty());
        assert!(grid.bounds.is_empty());
    }

    #[test]
    fn stride_follows_complexity() {
        assert_eq!(ScalarBackend::stride(0.05), 2);
        assert_eq!(ScalarBackend::stride(0.5), 2);
        assert_eq!(ScalarBackend::stride(1.0), 1);
        assert_eq!(ScalarBackend::stride(3.0), 1);
    }

    #[test]
    fn low_complexity_replicates_blocks() {
        let backend = ScalarBackend::new();
        let bounds = ViewportBounds::new(0, 0, 7, 7);
        let grid = backend.evaluate(bounds, 1.5, 0.3); // stride 2
        for y in (0..8).step_by(2) {
            for x in (0..8).step_by(2) {
                let v = grid.at(x, y);
                assert_eq!(grid.at(x + 1, y), v);
                assert_eq!(grid.at(x, y + 1), v);
                assert_eq!(grid.at(x + 1, y + 1), v);
            }
        }
    }

    #[test]
    fn full_resolution_matches_kernel_directly() {
        let backend = ScalarBackend::new();
        let bounds = ViewportBounds::new(-3, -3, 3, 3);
        let grid = backend.evaluate(bounds, 2.0, 1.0); // stride 1
        for y in -3..=3 {
            for x in -3..=3 {
                let expected = noise::sample(x as f32, y as f32, 2.0, 1.0);
                assert_eq!(grid.at(x, y).to_bits(), expected.to_bits());
            }
        }
    }
}
