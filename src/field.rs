use std::collections::HashMap;

/// Rectangular world-grid region requested for evaluation. The cache key.
///
/// Inverted bounds (`min > max`) are the canonical "empty" value; anything
/// derived from non-finite input collapses to empty instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ViewportBounds {
    pub const EMPTY: Self = Self {
        min_x: 0,
        min_y: 0,
        max_x: -1,
        max_y: -1,
    };

    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build bounds from world-space floats (camera-derived). Non-finite
    /// values produce the empty bounds rather than an error.
    pub fn from_world(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return Self::EMPTY;
        }
        Self {
            min_x: min_x.floor() as i32,
            min_y: min_y.floor() as i32,
            max_x: max_x.floor() as i32,
            max_y: max_y.floor() as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Width in cells (inclusive bounds).
    pub fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) as u32
        }
    }

    /// Height in cells (inclusive bounds).
    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_y - self.min_y + 1) as u32
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// One visible cell of the composed pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub glyph: char,
    /// Hex color string, `#rrggbb` or `#rrggbbaa` for trail cells.
    pub color: String,
    /// Final intensity in [0, 1].
    pub intensity: f32,
}

/// Sparse per-cell output keyed by integer world coordinates.
/// A missing key means "no visible pattern here", not zero intensity.
pub type PatternField = HashMap<(i32, i32), Cell>;

/// Dense raw noise intensities for one bounds, row-major.
/// Replaced wholesale by a completed backend evaluation, never patched.
#[derive(Debug, Clone)]
pub struct NoiseGrid {
    pub bounds: ViewportBounds,
    pub values: Vec<f32>,
}

impl NoiseGrid {
    pub fn empty() -> Self {
        Self {
            bounds: ViewportBounds::EMPTY,
            values: Vec::new(),
        }
    }

    /// Raw intensity at a world cell; 0.0 outside the grid.
    pub fn at(&self, x: i32, y: i32) -> f32 {
        if !self.bounds.contains(x, y) {
            return 0.0;
        }
        let w = self.bounds.width() as usize;
        let idx = (y - self.bounds.min_y) as usize * w + (x - self.bounds.min_x) as usize;
        self.values.get(idx).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_bounds_are_empty() {
        let b = ViewportBounds::new(5, 0, 0, 5);
        assert!(b.is_empty());
        assert_eq!(b.width(), 0);
        assert_eq!(b.cell_count(), 0);
    }

    #[test]
    fn non_finite_world_bounds_collapse_to_empty() {
        assert!(ViewportBounds::from_world(f32::NAN, 0.0, 10.0, 10.0).is_empty());
        assert!(ViewportBounds::from_world(0.0, 0.0, f32::INFINITY, 10.0).is_empty());
    }

    #[test]
    fn inclusive_dimensions() {
        let b = ViewportBounds::new(0, 0, 10, 10);
        assert_eq!(b.width(), 11);
        assert_eq!(b.height(), 11);
        assert_eq!(b.cell_count(), 121);
        assert!(b.contains(10, 10));
        assert!(!b.contains(11, 10));
    }

    #[test]
    fn grid_lookup_outside_is_zero() {
        let bounds = ViewportBounds::new(0, 0, 1, 1);
        let grid = NoiseGrid {
            bounds,
            values: vec![0.1, 0.2, 0.3, 0.4],
        };
        assert_eq!(grid.at(1, 0), 0.2);
        assert_eq!(grid.at(0, 1), 0.3);
        assert_eq!(grid.at(2, 0), 0.0);
        assert_eq!(grid.at(-1, -1), 0.0);
    }
}
