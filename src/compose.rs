//! Merges the raw noise grid with the trail contribution into the final
//! sparse cell map. Per cell: `final = max(noise, trail)`; anything dimmer
//! than the cutoff is omitted entirely.

use crate::config::PatternOptions;
use crate::field::{Cell, NoiseGrid, PatternField};
use crate::trail::TrailTracker;

/// Cells below this final intensity are left out of the field.
const MIN_VISIBLE: f32 = 0.05;
/// Intensity-ordered glyph ramp, five buckets from near-blank to solid.
const GLYPH_RAMP: [char; 5] = ['·', '∘', '•', '▓', '█'];
/// Accent used when the caller's hex string doesn't parse.
const FALLBACK_ACCENT: (u8, u8, u8) = (0x64, 0xc8, 0xff);

/// Glyph bucket for a final intensity in [0, 1].
fn glyph_for(intensity: f32) -> char {
    let idx = (intensity * GLYPH_RAMP.len() as f32) as usize;
    GLYPH_RAMP[idx.min(GLYPH_RAMP.len() - 1)]
}

/// Parse `#rgb` / `#rrggbb` (leading `#` optional). Bad input falls back to
/// the default accent — color is cosmetic, never an error.
fn parse_hex_color(s: &str) -> (u8, u8, u8) {
    let hex = s.trim().trim_start_matches('#');
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let parsed = (nibble(bytes[0]), nibble(bytes[1]), nibble(bytes[2]));
            if let (Some(r), Some(g), Some(b)) = parsed {
                (r * 17, g * 17, b * 17)
            } else {
                FALLBACK_ACCENT
            }
        }
        6 => {
            let byte = |i: usize| match (nibble(bytes[i]), nibble(bytes[i + 1])) {
                (Some(hi), Some(lo)) => Some(hi * 16 + lo),
                _ => None,
            };
            if let (Some(r), Some(g), Some(b)) = (byte(0), byte(2), byte(4)) {
                (r, g, b)
            } else {
                FALLBACK_ACCENT
            }
        }
        _ => FALLBACK_ACCENT,
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Color of a noise-dominated cell: hue drifts with the raw noise value,
/// pattern time, and the configured shift.
fn noise_color(raw: f32, time: f32, color_shift: f32) -> String {
    let hue = raw * 140.0 + time * 9.0 + color_shift;
    let (r, g, b) = hsl_to_rgb(hue, 0.45, 0.30 + raw * 0.25);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Color of a trail-dominated cell: the accent, alpha-weighted by trail strength.
fn trail_color(accent: (u8, u8, u8), strength: f32) -> String {
    let a = (strength.clamp(0.0, 1.0) * 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}{:02x}", accent.0, accent.1, accent.2, a)
}

/// Build the sparse field for the grid's bounds.
pub fn compose(
    grid: &NoiseGrid,
    trail: &TrailTracker,
    opts: &PatternOptions,
    accent_hex: &str,
    time: f32,
    now_ms: u64,
) -> PatternField {
    let bounds = grid.bounds;
    if bounds.is_empty() {
        return PatternField::new();
    }
    let accent = parse_hex_color(accent_hex);
    // Sparse output; in practice well under half the viewport lights up.
    let mut field = PatternField::with_capacity(bounds.cell_count() / 2);

    let query_trail = opts.trails_enabled && !trail.is_empty();
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let noise = grid.at(x, y);
            let trail_i = if query_trail {
                trail.intensity_at(
                    x as f32,
                    y as f32,
                    now_ms,
                    opts.complexity,
                    opts.trail_fade_duration_ms,
                )
            } else {
                0.0
            };

            let final_i = noise.max(trail_i);
            if final_i < MIN_VISIBLE {
                continue;
            }

            let color = if trail_i > noise {
                trail_color(accent, trail_i)
            } else {
                noise_color(noise, time, opts.color_shift)
            };
            field.insert(
                (x, y),
                Cell {
                    glyph: glyph_for(final_i),
                    color,
                    intensity: final_i,
                },
            );
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ViewportBounds;

    fn flat_grid(bounds: ViewportBounds, v: f32) -> NoiseGrid {
        NoiseGrid {
            bounds,
            values: vec![v; bounds.cell_count()],
        }
    }

    #[test]
    fn dim_cells_are_omitted_entirely() {
        let bounds = ViewportBounds::new(0, 0, 3, 3);
        let grid = flat_grid(bounds, 0.04);
        let field = compose(
            &grid,
            &TrailTracker::new(),
            &PatternOptions::default().sanitized(),
            "#ffffff",
            0.0,
            0,
        );
        assert!(field.is_empty());
    }

    #[test]
    fn bright_cells_fill_the_viewport() {
        let bounds = ViewportBounds::new(-1, -1, 1, 1);
        let grid = flat_grid(bounds, 0.9);
        let field = compose(
            &grid,
            &TrailTracker::new(),
            &PatternOptions::default().sanitized(),
            "#ffffff",
            0.0,
            0,
        );
        assert_eq!(field.len(), 9);
        let cell = &field[&(0, 0)];
        assert_eq!(cell.glyph, GLYPH_RAMP[4]);
        assert!((cell.intensity - 0.9).abs() < 1e-6);
    }

    #[test]
    fn glyph_ramp_is_monotonic() {
        let glyphs: Vec<char> = [0.05, 0.25, 0.45, 0.65, 0.95]
            .iter()
            .map(|&i| glyph_for(i))
            .collect();
        assert_eq!(glyphs, GLYPH_RAMP.to_vec());
        assert_eq!(glyph_for(1.0), GLYPH_RAMP[4]);
    }

    #[test]
    fn trail_dominated_cells_use_accent_alpha() {
        let bounds = ViewportBounds::new(0, 0, 6, 0);
        let grid = flat_grid(bounds, 0.0);
        let opts = PatternOptions::default().sanitized();

        let mut trail = TrailTracker::new();
        trail.report(0.0, 0.0, 0, opts.trail_intensity, opts.trail_fade_duration_ms);
        trail.report(6.0, 0.0, 10, opts.trail_intensity, opts.trail_fade_duration_ms);

        let field = compose(&grid, &trail, &opts, "#ff8800", 0.0, 10);
        assert!(!field.is_empty());
        for cell in field.values() {
            assert!(cell.color.starts_with("#ff8800"), "got {}", cell.color);
            assert_eq!(cell.color.len(), 9); // #rrggbbaa
        }
    }

    #[test]
    fn trails_disabled_means_noise_only() {
        let bounds = ViewportBounds::new(0, 0, 6, 0);
        let grid = flat_grid(bounds, 0.0);
        let opts = PatternOptions {
            trails_enabled: false,
            ..Default::default()
        }
        .sanitized();

        let mut trail = TrailTracker::new();
        trail.report(0.0, 0.0, 0, 0.8, 2_000);
        trail.report(6.0, 0.0, 10, 0.8, 2_000);

        let field = compose(&grid, &trail, &opts, "#ff8800", 0.0, 10);
        assert!(field.is_empty());
    }

    #[test]
    fn hex_parsing_variants() {
        assert_eq!(parse_hex_color("#ff8800"), (0xff, 0x88, 0x00));
        assert_eq!(parse_hex_color("ff8800"), (0xff, 0x88, 0x00));
        assert_eq!(parse_hex_color("#f80"), (0xff, 0x88, 0x00));
        assert_eq!(parse_hex_color("not a color"), FALLBACK_ACCENT);
        assert_eq!(parse_hex_color(""), FALLBACK_ACCENT);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }
}
