//! Arena Generator - procedural arenas from modular pieces
//!
//! Core modules:
//! - `arena`: Deterministic generation (parameter derivation, section building, session state)
//! - `sink`: Interfaces to the host renderer/spawner, plus an in-memory sink
//! - `settings`: Generator configuration and JSON persistence

pub mod arena;
pub mod settings;
pub mod sink;

pub use arena::{ArenaGenerator, BuildReport};
pub use settings::{ArenaConfig, GeneratorSettings};

use glam::Vec3;

/// Generator limits
pub mod consts {
    /// Upper bound for polygon sides
    pub const MAX_SIDES: u32 = 120;
    /// Polygons need at least a triangle
    pub const MIN_SIDES: u32 = 3;
    /// Upper bound for tiles along one polygon side
    pub const MAX_TILES_PER_SIDE_ROW: u32 = 100;
    /// Upper bound for grid rows/cols (guards against huge loops from tiny meshes)
    pub const MAX_GRID_DIMENSIONS: u32 = 256;

    /// Yaw possibility bounds when used as a divisor
    pub const MIN_YAW_POSSIBILITIES: u32 = 2;
    pub const MAX_YAW_POSSIBILITIES: u32 = 720;

    /// Tolerance added before flooring tile counts (absorbs f32 noise like 2.9999998)
    pub const TILE_COUNT_EPSILON: f32 = 1e-3;

    /// Largest warp half-span (also caps scale warp); keeps sampled spans finite
    pub const MAX_WARP_RANGE: f32 = 1.0e6;

    /// Smallest grid a radius-led floor may produce
    pub const MIN_RADIUS_LED_DIMENSIONS: u32 = 2;
}

/// `length * cos(angle)`.
///
/// Named after how the arena math uses it (half a polygon side from the
/// vertex radius), not after strict trigonometric convention.
#[inline]
pub fn opposite(length: f32, angle_degrees: f32) -> f32 {
    length * angle_degrees.to_radians().cos()
}

/// `length * sin(angle)` (apothem from the vertex radius)
#[inline]
pub fn adjacent(length: f32, angle_degrees: f32) -> f32 {
    length * angle_degrees.to_radians().sin()
}

/// Unit vector in the XY plane pointing along `yaw` (degrees, Z up)
#[inline]
pub fn forward_vector_from_yaw(yaw_degrees: f32) -> Vec3 {
    let yaw = yaw_degrees.to_radians();
    Vec3::new(yaw.cos(), yaw.sin(), 0.0)
}

/// Right-hand partner of [`forward_vector_from_yaw`] (yaw + 90°)
#[inline]
pub fn right_vector_from_yaw(yaw_degrees: f32) -> Vec3 {
    forward_vector_from_yaw(yaw_degrees + 90.0)
}
