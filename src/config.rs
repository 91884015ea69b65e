/// Engine mode. `Disabled` suspends the clock and all dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Disabled,
    Active,
}

/// Live-mutable pattern configuration, read each frame.
///
/// Out-of-range values are clamped at read time (see `sanitized`), never
/// rejected — a bad config degrades the visual, it can't crash a frame.
#[derive(Debug, Clone)]
pub struct PatternOptions {
    pub enabled: bool,
    pub mode: PatternMode,
    /// Pattern time advance multiplier per frame.
    pub speed: f32,
    /// Spatial density of the noise; also widens trails.
    pub complexity: f32,
    /// Hue rotation applied to noise cell colors, degrees.
    pub color_shift: f32,
    pub trails_enabled: bool,
    /// Base intensity of newly admitted trail points.
    pub trail_intensity: f32,
    /// Age at which a trail point stops contributing entirely.
    pub trail_fade_duration_ms: u64,
}

/// Clamp ranges. Speed/complexity floors keep the animation from degenerating
/// to a frozen or zero-frequency field.
const SPEED_RANGE: (f32, f32) = (0.05, 8.0);
const COMPLEXITY_RANGE: (f32, f32) = (0.05, 3.0);
const TRAIL_INTENSITY_RANGE: (f32, f32) = (0.05, 1.0);
const TRAIL_FADE_RANGE_MS: (u64, u64) = (100, 60_000);

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PatternMode::Active,
            speed: 1.0,
            complexity: 0.5,
            color_shift: 0.0,
            trails_enabled: true,
            trail_intensity: 0.8,
            trail_fade_duration_ms: 2_000,
        }
    }
}

impl PatternOptions {
    /// Copy with every numeric field forced into its valid range.
    /// NaN collapses to the range minimum.
    pub fn sanitized(&self) -> Self {
        let clamp = |v: f32, (lo, hi): (f32, f32)| if v.is_finite() { v.clamp(lo, hi) } else { lo };
        Self {
            enabled: self.enabled,
            mode: self.mode,
            speed: clamp(self.speed, SPEED_RANGE),
            complexity: clamp(self.complexity, COMPLEXITY_RANGE),
            color_shift: if self.color_shift.is_finite() {
                self.color_shift.rem_euclid(360.0)
            } else {
                0.0
            },
            trails_enabled: self.trails_enabled,
            trail_intensity: clamp(self.trail_intensity, TRAIL_INTENSITY_RANGE),
            trail_fade_duration_ms: self
                .trail_fade_duration_ms
                .clamp(TRAIL_FADE_RANGE_MS.0, TRAIL_FADE_RANGE_MS.1),
        }
    }
}
