//! Placement warping
//!
//! Two independent perturbations applied on top of the tiled position:
//! a random per-axis jitter and a deterministic bowl-shaped lift.

use glam::Vec3;
use rand::Rng;

use crate::consts::MAX_WARP_RANGE;

/// Usable half-span for a configured range: non-negative, finite and capped.
/// NaN disables the axis.
pub fn clamp_warp_span(range: f32) -> f32 {
    if range.is_nan() { 0.0 } else { range.abs().min(MAX_WARP_RANGE) }
}

/// Random offset along forward/right/up, each axis drawn from `[-range, range]`
/// (ranges pass through [`clamp_warp_span`]).
///
/// Draws exactly three values (forward, right, up) from `rng` in that order,
/// even for zero ranges, so call order stays stable across configurations.
pub fn directional_warp<R: Rng + ?Sized>(rng: &mut R, ranges: Vec3, forward: Vec3, right: Vec3) -> Vec3 {
    let ranges = Vec3::new(
        clamp_warp_span(ranges.x),
        clamp_warp_span(ranges.y),
        clamp_warp_span(ranges.z),
    );
    let along_forward = rng.random_range(-ranges.x..=ranges.x);
    let along_right = rng.random_range(-ranges.y..=ranges.y);
    let along_up = rng.random_range(-ranges.z..=ranges.z);
    forward * along_forward + right * along_right + Vec3::new(0.0, 0.0, along_up)
}

/// Concavity lift for cell (`col`, `row`) of an index grid with midpoints
/// (`col_mid`, `row_mid`).
///
/// Both axis terms are normalized by `row_mid`; the factor is zero on the
/// midlines and reaches `strength` toward the corners.
pub fn concavity_warp(col_mid: i32, row_mid: i32, col: i32, row: i32, strength: f32, direction: Vec3) -> Vec3 {
    let denom = row_mid.max(1) as f32;
    let col_t = ((col - col_mid).abs() as f32 / denom).clamp(0.0, 1.0);
    let row_t = ((row - row_mid).abs() as f32 / denom).clamp(0.0, 1.0);
    let factor = (lerp(0.0, 1.0, col_t) * lerp(0.0, 1.0, row_t)).clamp(0.0, 1.0);
    direction * (strength * factor)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
