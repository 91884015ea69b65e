//! Deterministic scalar noise kernel.
//!
//! Every constant here is mirrored verbatim in `backend/shaders/pattern.wgsl`;
//! the scalar and accelerated backends must produce the same field from the
//! same inputs so a backend switch never shows a visible seam. The sine
//! pseudo-hash replaces the classic permutation table so both sides can
//! reproduce gradients independently with no shared lookup state. Its
//! distribution is imperfect and can band slightly; that texture is part of
//! the look, so don't swap in a permutation table.

/// Base spatial frequency of the pattern.
const BASE_SCALE: f32 = 0.11;
/// How far the flow samples displace the final sampling coordinate.
const WARP_STRENGTH: f32 = 1.6;

/// Quintic fade curve `u^3(u(6u - 15) + 10)`.
fn fade(u: f32) -> f32 {
    u * u * u * (u * (u * 6.0 - 15.0) + 10.0)
}

/// Sine pseudo-hash over lattice coordinates, result in 0..256.
/// Inputs are pre-wrapped to 0..256 so the sine argument stays small enough
/// for CPU and GPU `sin` to agree.
fn lattice_hash(ix: i32, iy: i32) -> u32 {
    let i = (ix + iy * 57) as f32;
    (((i * 12.9898).sin().abs() * 43758.5453).floor() as u32) % 256
}

/// Dot product of the hashed corner gradient with the offset vector.
/// The low 2 hash bits select one of the four diagonal gradients.
fn grad_dot(h: u32, dx: f32, dy: f32) -> f32 {
    match h & 3 {
        0 => dx + dy,
        1 => dy - dx,
        2 => dx - dy,
        _ => -dx - dy,
    }
}

/// Raw gradient noise, roughly [-1, 1]: bilinear interpolation of the four
/// lattice-corner gradient dots under the quintic fade.
fn gradient(x: f32, y: f32) -> f32 {
    let xf = x.floor();
    let yf = y.floor();
    let ix = (xf as i32).rem_euclid(256);
    let iy = (yf as i32).rem_euclid(256);
    let dx = x - xf;
    let dy = y - yf;

    let u = fade(dx);
    let v = fade(dy);

    let n00 = grad_dot(lattice_hash(ix, iy), dx, dy);
    let n10 = grad_dot(lattice_hash((ix + 1) % 256, iy), dx - 1.0, dy);
    let n01 = grad_dot(lattice_hash(ix, (iy + 1) % 256), dx, dy - 1.0);
    let n11 = grad_dot(lattice_hash((ix + 1) % 256, (iy + 1) % 256), dx - 1.0, dy - 1.0);

    let nx0 = n00 + u * (n10 - n00);
    let nx1 = n01 + u * (n11 - n01);
    nx0 + v * (nx1 - nx0)
}

/// Pattern intensity at a world cell, in [0, 1]. Pure: no state, no RNG.
///
/// Two domain-warped flow samples distort the sampling coordinate before the
/// final sample (organic drift); a slow sinusoidal wave modulates the result
/// for a gentle global pulse.
pub fn sample(x: f32, y: f32, t: f32, complexity: f32) -> f32 {
    let freq = BASE_SCALE * (0.6 + complexity * 0.8);
    let sx = x * freq;
    // Cells render ~2x taller than wide; halve the vertical frequency.
    let sy = y * freq * 0.5;

    let flow_x = gradient(sx * 0.7 + t * 0.30, sy * 0.7 - t * 0.12);
    let flow_y = gradient(sx * 0.7 - t * 0.18 + 37.0, sy * 0.7 + t * 0.26 + 61.0);
    let wx = sx + flow_x * WARP_STRENGTH;
    let wy = sy + flow_y * WARP_STRENGTH;

    let n = gradient(wx + t * 0.15, wy);
    let base = (n * 0.5 + 0.5).clamp(0.0, 1.0);

    let wave = 0.85 + 0.15 * (t * 0.35 + (x + y) * 0.01).sin();
    (base * wave).clamp(0.0, 1.0)
}
