//! glowgrid — ambient procedural pattern field for an infinite canvas.
//!
//! Synthesizes a deterministic animated noise field over a world-coordinate
//! grid, offloads evaluation to a wgpu compute pipeline when one is available
//! (with a synchronous scalar fallback that never stalls a frame), and blends
//! in a decaying glow trail behind the pointer. The engine owns no surface
//! and performs no I/O; each frame it returns a sparse map of visible cells
//! for the caller to draw.
//!
//! ```no_run
//! use glowgrid::{PatternEngine, ViewportBounds};
//!
//! let mut engine = PatternEngine::new();
//! // once per display frame:
//! engine.tick();
//! engine.report_pointer_position(12.0, 4.0);
//! let field = engine.generate(ViewportBounds::new(0, 0, 80, 24), "#64c8ff");
//! for ((x, y), cell) in &field {
//!     // draw cell.glyph in cell.color at (x, y)
//! }
//! ```

mod backend;
mod cache;
mod clock;
mod compose;
mod config;
mod engine;
mod field;
mod noise;
mod trail;

pub use config::{PatternMode, PatternOptions};
pub use engine::PatternEngine;
pub use field::{Cell, PatternField, ViewportBounds};
