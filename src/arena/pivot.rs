//! Pivot corrections for asymmetric mesh origins
//!
//! Instanced meshes rotate about their local pivot, not their geometric
//! center. A mesh whose pivot sits on a corner swings out of its cell when
//! rotated, so every placement adds one of the corrections below.
//!
//! Mesh-local extents per pivot (X, Y):
//! - `XyPositive`: [0, X] x [0, Y]
//! - `XyNegative`: [-X, 0] x [-Y, 0]
//! - `XPositiveYNegative`: [0, X] x [-Y, 0]
//! - `XNegativeYPositive`: [-X, 0] x [0, Y]
//! - `Center`: centered on both axes

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which corner of the mesh bounds coincides with its local origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PivotPlacement {
    #[default]
    XyPositive,
    XyNegative,
    XPositiveYNegative,
    XNegativeYPositive,
    Center,
}

/// Shift, as spans of mesh X/Y, that brings a mesh rotated by `90° * index`
/// back into the positive quadrant. Entries are (x span, y span) where a span
/// of `X` means "one mesh length along X".
#[derive(Debug, Clone, Copy, PartialEq)]
enum Span {
    Zero,
    X,
    Y,
}

/// (shift along first axis, shift along second axis)
type QuarterShift = (Span, Span);

/// Quarter-turn correction table, indexed by rotation step (0..=3)
fn quarter_table(pivot: PivotPlacement) -> Option<[QuarterShift; 4]> {
    use Span::{X, Y, Zero};
    match pivot {
        PivotPlacement::XyPositive => Some([(Zero, Zero), (Y, Zero), (X, Y), (Zero, X)]),
        PivotPlacement::XyNegative => Some([(X, Y), (Zero, X), (Zero, Zero), (Y, Zero)]),
        PivotPlacement::XPositiveYNegative => Some([(Zero, Y), (Zero, Zero), (X, Zero), (Y, X)]),
        PivotPlacement::XNegativeYPositive => Some([(X, Zero), (Y, X), (Zero, Y), (Zero, Zero)]),
        PivotPlacement::Center => None,
    }
}

fn span_length(span: Span, mesh_size: Vec3) -> f32 {
    match span {
        Span::Zero => 0.0,
        Span::X => mesh_size.x,
        Span::Y => mesh_size.y,
    }
}

/// Axis-aligned correction after rotating a mesh by `90° * rotation_index`
/// so it still spans the positive quadrant from its placement point.
/// `Center` pivots never need one.
pub fn rotated_offset(pivot: PivotPlacement, mesh_size: Vec3, rotation_index: u32) -> Vec3 {
    offset_along_directions(Vec3::X, Vec3::Y, pivot, mesh_size, rotation_index)
}

/// [`rotated_offset`] expressed along an arbitrary forward/right frame
/// (polygon sides are not axis-aligned)
pub fn offset_along_directions(
    forward: Vec3,
    right: Vec3,
    pivot: PivotPlacement,
    mesh_size: Vec3,
    rotation_index: u32,
) -> Vec3 {
    let Some(table) = quarter_table(pivot) else {
        return Vec3::ZERO;
    };
    let (along_forward, along_right) = table[(rotation_index % 4) as usize];
    forward * span_length(along_forward, mesh_size) + right * span_length(along_right, mesh_size)
}

/// Where the mesh center sits relative to its pivot, as a fraction of mesh size
pub fn origin_offset_scalar(pivot: PivotPlacement) -> Vec3 {
    match pivot {
        PivotPlacement::XyPositive => Vec3::new(0.5, 0.5, 0.0),
        PivotPlacement::XyNegative => Vec3::new(-0.5, -0.5, 0.0),
        PivotPlacement::XPositiveYNegative => Vec3::new(0.5, -0.5, 0.0),
        PivotPlacement::XNegativeYPositive => Vec3::new(-0.5, 0.5, 0.0),
        PivotPlacement::Center => Vec3::ZERO,
    }
}

/// Translation that keeps the mesh center in place while the mesh turns
/// `angle_degrees` about its pivot: `center - rotated center`.
pub fn recenter_after_rotation(pivot: PivotPlacement, mesh_size: Vec3, angle_degrees: f32) -> Vec3 {
    if pivot == PivotPlacement::Center {
        return Vec3::ZERO;
    }
    let to_center = origin_offset_scalar(pivot) * mesh_size;
    let rotated = Quat::from_rotation_z(angle_degrees.to_radians()) * to_center;
    to_center - rotated
}

/// Quarter-turn step for a yaw, if the yaw is (numerically) a multiple of 90°
pub fn quarter_turn_index(yaw_degrees: f32) -> Option<u32> {
    let wrapped = yaw_degrees.rem_euclid(360.0);
    let steps = (wrapped / 90.0).round();
    if (wrapped - steps * 90.0).abs() < 1e-3 {
        Some(steps as u32 % 4)
    } else {
        None
    }
}
