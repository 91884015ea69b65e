use glam::Vec2;

/// Minimum pointer travel (world cells) before a new point is admitted.
/// Swallows sub-cell jitter so a resting pointer can't flood the path.
const MIN_MOVE_DISTANCE: f32 = 1.0;
/// Vertical compression of the distance metric — rendered cells are roughly
/// twice as tall as wide, so a circle in cell space is an ellipse in world space.
const VERTICAL_SCALE: f32 = 0.5;
/// Admission intensity jitter fraction (±20%).
const INTENSITY_JITTER: f32 = 0.2;
/// Fade weight of the oldest segment; the newest approaches 1.0.
const TAIL_FLOOR: f32 = 0.3;
/// Base half-width of the glow around a segment, widened by complexity.
const BASE_WIDTH: f32 = 0.8;
/// How much a segment narrows over its lifetime.
const WIDTH_AGE_SHRINK: f32 = 0.6;

/// One admitted pointer sample. Immutable once created, only ever removed.
#[derive(Debug, Clone, Copy)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub admitted_at_ms: u64,
    /// In (0, base intensity]; randomized at admission.
    pub intensity: f32,
}

/// Decaying pointer path. Points are ordered oldest-first; admission order is
/// the temporal order, so expired points always form a prefix.
pub struct TrailTracker {
    points: Vec<TrailPoint>,
    rng: fastrand::Rng,
}

impl TrailTracker {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            rng: fastrand::Rng::new(),
        }
    }

    #[cfg(test)]
    fn with_seed(seed: u64) -> Self {
        Self {
            points: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Admit a pointer position. Returns true if a new point was recorded.
    ///
    /// A point is only admitted when movement since the last recorded point
    /// exceeds `MIN_MOVE_DISTANCE`; the first report always admits.
    pub fn report(
        &mut self,
        x: f32,
        y: f32,
        now_ms: u64,
        base_intensity: f32,
        fade_ms: u64,
    ) -> bool {
        self.purge_expired(now_ms, fade_ms);

        let pos = Vec2::new(x, y);
        if let Some(last) = self.points.last() {
            if last.pos.distance(pos) < MIN_MOVE_DISTANCE {
                return false;
            }
        }

        let jitter = 1.0 + (self.rng.f32() * 2.0 - 1.0) * INTENSITY_JITTER;
        // Invariant: intensity stays in (0, base].
        let intensity = (base_intensity * jitter).clamp(1e-4, base_intensity);
        self.points.push(TrailPoint {
            pos,
            admitted_at_ms: now_ms,
            intensity,
        });
        true
    }

    /// Drop points older than the fade duration. Called on admission, from the
    /// engine's periodic sweep, and implicitly (by skipping) on every query,
    /// so the path stays bounded even when rendering stops.
    pub fn purge_expired(&mut self, now_ms: u64, fade_ms: u64) {
        self.points
            .retain(|p| now_ms.saturating_sub(p.admitted_at_ms) <= fade_ms);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trail intensity at a world cell, in [0, 1].
    ///
    /// Walks consecutive point pairs as path segments, projects the cell onto
    /// each with a clamped parametric projection under the anisotropic metric,
    /// and keeps the **maximum** segment contribution — overlapping segments
    /// must not sum into overdriven brightness.
    pub fn intensity_at(
        &self,
        x: f32,
        y: f32,
        now_ms: u64,
        complexity: f32,
        fade_ms: u64,
    ) -> f32 {
        // Expired points are a prefix (oldest-first); skip them without mutating.
        let start = match self
            .points
            .iter()
            .position(|p| now_ms.saturating_sub(p.admitted_at_ms) <= fade_ms)
        {
            Some(i) => i,
            None => return 0.0,
        };
        let live = &self.points[start..];
        if live.len() < 2 {
            return 0.0;
        }

        let fade = fade_ms as f32;
        let path_len = live.len() as f32;
        let pc = Vec2::new(x, y * VERTICAL_SCALE);

        let mut best = 0.0f32;
        for (i, pair) in live.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            // Segment age from its newer endpoint — the tightest bound since
            // admission times are ordered.
            let age = now_ms.saturating_sub(b.admitted_at_ms) as f32;
            if age > fade {
                continue;
            }
            let age_frac = age / fade;

            let pa = Vec2::new(a.pos.x, a.pos.y * VERTICAL_SCALE);
            let pb = Vec2::new(b.pos.x, b.pos.y * VERTICAL_SCALE);
            let seg = pb - pa;
            let len_sq = seg.length_squared();
            let t = if len_sq > 1e-6 {
                ((pc - pa).dot(seg) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let dist = pc.distance(pa + seg * t);

            // Glow narrows as the segment ages, widens with complexity.
            let width = (BASE_WIDTH + complexity) * (1.0 - WIDTH_AGE_SHRINK * age_frac);
            if width <= 0.0 || dist >= width {
                continue;
            }

            let distance_fade = 1.0 - dist / width;
            let age_fade = 1.0 - age_frac;
            let tail_fade = TAIL_FLOOR + (1.0 - TAIL_FLOOR) * (i as f32 / path_len);

            best = best.max(distance_fade * age_fade * tail_fade * b.intensity);
        }
        best.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FADE: u64 = 2_000;

    #[test]
    fn first_report_always_admits() {
        let mut trail = TrailTracker::with_seed(7);
        assert!(trail.report(0.0, 0.0, 0, 0.8, FADE));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn jitter_is_ignored_below_threshold() {
        let mut trail = TrailTracker::with_seed(7);
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        assert!(!trail.report(0.3, 0.2, 10, 0.8, FADE));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn big_step_admits_exactly_one_point() {
        let mut trail = TrailTracker::with_seed(7);
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        assert!(trail.report(5.0, 0.0, 16, 0.8, FADE));
        assert_eq!(trail.len(), 2);

        // Cell on the segment glows immediately...
        let now = 16;
        assert!(trail.intensity_at(2.0, 0.0, now, 1.0, FADE) > 0.0);
        // ...and contributes exactly zero once both points have aged out.
        assert_eq!(trail.intensity_at(2.0, 0.0, now + FADE + 1, 1.0, FADE), 0.0);
    }

    #[test]
    fn admitted_intensity_never_exceeds_base() {
        let mut trail = TrailTracker::with_seed(1234);
        for i in 0..50 {
            trail.report(i as f32 * 3.0, 0.0, i, 0.8, 60_000);
        }
        for p in &trail.points {
            assert!(p.intensity > 0.0 && p.intensity <= 0.8);
        }
    }

    #[test]
    fn overlapping_segments_take_max_not_sum() {
        let mut trail = TrailTracker::with_seed(7);
        // Out-and-back path: both segments pass through (2, 0).
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        trail.report(4.0, 0.0, 10, 0.8, FADE);
        trail.report(0.5, 0.0, 20, 0.8, FADE);

        let combined = trail.intensity_at(2.0, 0.0, 20, 1.0, FADE);

        // Strongest single segment is the newest one at full distance fade.
        // If contributions summed, combined would exceed the base intensity
        // cap well before clamping; with max it stays at one segment's worth.
        let newest = trail.points[2].intensity;
        assert!(combined <= newest + 1e-6, "{combined} > {newest}");
        assert!(combined > 0.0);
    }

    #[test]
    fn purge_drops_expired_prefix() {
        let mut trail = TrailTracker::with_seed(7);
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        trail.report(5.0, 0.0, 100, 0.8, FADE);
        trail.report(10.0, 0.0, 200, 0.8, FADE);
        // At FADE+150 the first two points have aged out, the last survives.
        trail.purge_expired(FADE + 150, FADE);
        assert_eq!(trail.len(), 1);

        trail.purge_expired(2 * FADE + 300, FADE);
        assert_eq!(trail.len(), 0);
    }

    #[test]
    fn expired_points_skip_lazily_without_mutation() {
        let mut trail = TrailTracker::with_seed(7);
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        trail.report(5.0, 0.0, 10, 0.8, FADE);
        let len_before = trail.len();
        assert_eq!(trail.intensity_at(2.0, 0.0, FADE + 1_000, 1.0, FADE), 0.0);
        assert_eq!(trail.len(), len_before);
    }

    #[test]
    fn vertical_distance_counts_half() {
        let mut trail = TrailTracker::with_seed(7);
        trail.report(0.0, 0.0, 0, 0.8, FADE);
        trail.report(10.0, 0.0, 10, 0.8, FADE);

        // One cell past the segment end (pure horizontal distance 1.0) and two
        // cells above it (vertical distance 2.0, compressed to 1.0) must
        // measure identically under the anisotropic metric.
        let past_end = trail.intensity_at(11.0, 0.0, 10, 1.0, FADE);
        let above = trail.intensity_at(5.0, 2.0, 10, 1.0, FADE);
        assert!(past_end > 0.0);
        assert!((past_end - above).abs() < 1e-5);
    }
}
