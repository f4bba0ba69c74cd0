//! Arena parameter derivation
//!
//! Turns high-level targets (radius, sides, tile counts, grid dimensions) into
//! one consistent set of geometry under a build-order policy. The same policy
//! also decides where each section's origin sits, so both lookups live here.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::config::{AssetKind, Catalog, SectionBuildRules, SectionType};
use super::report::ArenaError;
use crate::consts::*;
use crate::settings::GeneratorSettings;
use crate::{adjacent, opposite};

/// Which quantity is authoritative; everything else is derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildOrderPolicy {
    /// Grid dimensions are the target
    #[default]
    GridLeadsByDimensions,
    /// Target radius fixes the grid
    GridLeadsByRadius,
    /// Target tiles per side fixes the ring
    PolygonLeadByDimensions,
    /// Target radius fixes tiles per side
    PolygonLeadByRadius,
}

/// Which arrangement the others line up to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leader {
    Grid,
    Polygon,
}

impl BuildOrderPolicy {
    pub fn leader(self) -> Leader {
        match self {
            BuildOrderPolicy::GridLeadsByDimensions | BuildOrderPolicy::GridLeadsByRadius => Leader::Grid,
            BuildOrderPolicy::PolygonLeadByDimensions | BuildOrderPolicy::PolygonLeadByRadius => {
                Leader::Polygon
            }
        }
    }
}

/// Requested values; which ones matter depends on the policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTargets {
    pub inscribed_radius: f32,
    pub polygon_sides: i32,
    pub tiles_per_side: i32,
    pub grid_dimensions: i32,
}

impl Default for BuildTargets {
    fn default() -> Self {
        Self {
            inscribed_radius: 2000.0,
            polygon_sides: 8,
            tiles_per_side: 5,
            grid_dimensions: 10,
        }
    }
}

/// Where the arena sits relative to the generator origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArenaOriginPlacement {
    /// Arena center on the origin
    #[default]
    Center,
    /// Arena extends into +X/+Y
    XyPositive,
    /// Arena extends into -X/-Y
    XyNegative,
    XPositiveYNegative,
    XNegativeYPositive,
}

impl ArenaOriginPlacement {
    /// Direction from the generator origin to the arena center, per axis
    fn center_direction(self) -> Vec2 {
        match self {
            ArenaOriginPlacement::Center => Vec2::ZERO,
            ArenaOriginPlacement::XyPositive => Vec2::new(1.0, 1.0),
            ArenaOriginPlacement::XyNegative => Vec2::new(-1.0, -1.0),
            ArenaOriginPlacement::XPositiveYNegative => Vec2::new(1.0, -1.0),
            ArenaOriginPlacement::XNegativeYPositive => Vec2::new(-1.0, 1.0),
        }
    }
}

/// Clamps applied while deriving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_sides: u32,
    pub max_tiles_per_side_row: u32,
    pub max_grid_dimensions: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sides: MAX_SIDES,
            max_tiles_per_side_row: MAX_TILES_PER_SIDE_ROW,
            max_grid_dimensions: MAX_GRID_DIMENSIONS,
        }
    }
}

impl From<&GeneratorSettings> for Limits {
    fn from(settings: &GeneratorSettings) -> Self {
        Self {
            max_sides: settings.max_sides.max(MIN_SIDES),
            max_tiles_per_side_row: settings.max_tiles_per_side_row.max(1),
            max_grid_dimensions: settings.max_grid_dimensions.max(1),
        }
    }
}

impl Limits {
    pub fn clamp_tiles(&self, raw: f32) -> u32 {
        floor_count(raw).clamp(1, self.max_tiles_per_side_row.max(1))
    }

    pub fn clamp_dimensions(&self, dims: u32) -> u32 {
        dims.clamp(1, self.max_grid_dimensions.max(1))
    }
}

/// Floor with a small tolerance; NaN and negatives become 0, infinities saturate
fn floor_count(raw: f32) -> u32 {
    (raw + TILE_COUNT_EPSILON).floor() as u32
}

/// Ceil with the same tolerance in the other direction
fn ceil_count(raw: f32) -> u32 {
    (raw - TILE_COUNT_EPSILON).ceil() as u32
}

/// Meshes the derivation is measured against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusGroups {
    pub grid: (AssetKind, usize),
    pub polygon: (AssetKind, usize),
}

/// First grid rule and first polygon rule in a list, falling back to group 0
pub fn find_focus_groups(rules: &[SectionBuildRules]) -> FocusGroups {
    let focus = |section_type: SectionType| {
        rules
            .iter()
            .find(|r| r.section_type == section_type)
            .map(|r| (r.asset_kind, usize::try_from(r.group_index).unwrap_or(0)))
            .unwrap_or((AssetKind::StaticMeshes, 0))
    };
    FocusGroups {
        grid: focus(SectionType::HorizontalGrid),
        polygon: focus(SectionType::Polygon),
    }
}

/// Derived geometry for one section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaParameters {
    pub policy: BuildOrderPolicy,
    pub arena_sides: u32,
    pub interior_angle: f32,
    pub exterior_angle: f32,
    /// Center to vertex
    pub inscribed_radius: f32,
    /// Center to side midpoint
    pub apothem: f32,
    pub side_length: f32,
    pub tiles_per_arena_side: u32,
    /// Grid rows == cols
    pub arena_dimensions: u32,
    pub grid_mesh_size: Vec3,
    pub polygon_mesh_size: Vec3,
}

/// Derive geometry from targets and the two reference mesh sizes
pub fn derive_parameters(
    policy: BuildOrderPolicy,
    targets: &BuildTargets,
    grid_mesh_size: Vec3,
    polygon_mesh_size: Vec3,
    limits: &Limits,
) -> ArenaParameters {
    let arena_sides = (targets.polygon_sides.max(0) as u32).clamp(MIN_SIDES, limits.max_sides.max(MIN_SIDES));
    let sides = arena_sides as f32;
    let interior_angle = (sides - 2.0) * 180.0 / sides;
    let exterior_angle = 360.0 / sides;
    let half_interior = interior_angle / 2.0;

    let grid_x = grid_mesh_size.x;
    let poly_x = polygon_mesh_size.x;

    let (inscribed_radius, side_length, tiles_per_arena_side, arena_dimensions) = match policy {
        BuildOrderPolicy::GridLeadsByDimensions => {
            let dims = limits.clamp_dimensions(targets.grid_dimensions.max(1) as u32);
            let radius = grid_x * dims as f32 / 2.0;
            let side = 2.0 * opposite(radius, half_interior);
            (radius, side, limits.clamp_tiles(side / poly_x), dims)
        }
        BuildOrderPolicy::GridLeadsByRadius => {
            let radius = targets.inscribed_radius.max(0.0);
            let dims = limits.clamp_dimensions(floor_count(2.0 * radius / grid_x).max(MIN_RADIUS_LED_DIMENSIONS));
            let side = 2.0 * opposite(radius, half_interior);
            (radius, side, limits.clamp_tiles(side / poly_x), dims)
        }
        BuildOrderPolicy::PolygonLeadByDimensions | BuildOrderPolicy::PolygonLeadByRadius => {
            let tiles = if policy == BuildOrderPolicy::PolygonLeadByDimensions {
                (targets.tiles_per_side.max(1) as u32).clamp(1, limits.max_tiles_per_side_row.max(1))
            } else {
                let target = targets.inscribed_radius.max(0.0);
                limits.clamp_tiles(2.0 * opposite(target, half_interior) / poly_x)
            };
            let side = poly_x * tiles as f32;
            let radius = (side / 2.0) / (90.0 - half_interior).to_radians().sin();
            let dims = limits.clamp_dimensions(ceil_count(2.0 * radius / grid_x));
            (radius, side, tiles, dims)
        }
    };

    let apothem = adjacent(inscribed_radius, half_interior).abs();

    ArenaParameters {
        policy,
        arena_sides,
        interior_angle,
        exterior_angle,
        inscribed_radius,
        apothem,
        side_length,
        tiles_per_arena_side,
        arena_dimensions,
        grid_mesh_size,
        polygon_mesh_size,
    }
}

/// Resolve the focus meshes of `rules` in `catalog` and derive geometry.
///
/// Fails when the catalog a focus rule needs is empty or its mesh has no
/// positive footprint, before anything is placed.
pub fn calculate_section_parameters(
    policy: BuildOrderPolicy,
    targets: &BuildTargets,
    rules: &[SectionBuildRules],
    catalog: &Catalog<'_>,
    limits: &Limits,
) -> Result<ArenaParameters, ArenaError> {
    if catalog.mesh_groups.is_empty() && rules.iter().all(|r| r.asset_kind == AssetKind::StaticMeshes) {
        return Err(ArenaError::EmptyMeshCatalog);
    }

    let focus = find_focus_groups(rules);
    let grid = focus_footprint(catalog, focus.grid)?;
    let polygon = focus_footprint(catalog, focus.polygon)?;

    let params = derive_parameters(policy, targets, grid, polygon, limits);
    log::debug!(
        "{:?}: sides={} radius={:.2} apothem={:.2} side={:.2} tiles/side={} dims={}",
        params.policy,
        params.arena_sides,
        params.inscribed_radius,
        params.apothem,
        params.side_length,
        params.tiles_per_arena_side,
        params.arena_dimensions
    );
    Ok(params)
}

fn focus_footprint(catalog: &Catalog<'_>, (kind, group): (AssetKind, usize)) -> Result<Vec3, ArenaError> {
    let count = catalog.group_count(kind);
    if count == 0 {
        return Err(match kind {
            AssetKind::StaticMeshes => ArenaError::EmptyMeshCatalog,
            AssetKind::Actors => ArenaError::EmptyActorCatalog,
        });
    }
    let group = if group < count { group } else { 0 };
    let size = catalog.footprint(kind, group).unwrap_or(Vec3::ZERO);
    if size.x > 0.0 && size.y > 0.0 {
        Ok(size)
    } else {
        Err(ArenaError::DegenerateMeshSize { kind, group, size })
    }
}

impl ArenaParameters {
    /// Half the arena's bounding square, measured the way the leader sees it
    pub fn half_extent(&self) -> f32 {
        match self.policy.leader() {
            Leader::Grid => self.arena_dimensions as f32 * self.grid_mesh_size.x / 2.0,
            Leader::Polygon => self.inscribed_radius,
        }
    }

    /// Grid dimensions for a section tiled with `mesh_x`-long pieces
    pub fn section_dimensions(&self, mesh_x: f32, mesh_changed: bool, limits: &Limits) -> u32 {
        if !mesh_changed {
            return self.arena_dimensions;
        }
        let span = self.arena_dimensions as f32 * self.grid_mesh_size.x;
        limits.clamp_dimensions(ceil_count(span / mesh_x))
    }

    /// Tiles per side for a section tiled with `mesh_x`-long pieces
    pub fn section_tiles_per_side(&self, mesh_x: f32, mesh_changed: bool, limits: &Limits) -> u32 {
        if !mesh_changed {
            return self.tiles_per_arena_side;
        }
        limits.clamp_tiles(2.0 * opposite(self.inscribed_radius, self.interior_angle / 2.0) / mesh_x)
    }

    /// XY start of a section relative to the generator origin.
    ///
    /// Grid sections return their min corner. Polygon sections return the
    /// first vertex of a ring whose sides are `tiles * mesh_size.x` long and
    /// run counter-clockwise starting along +X.
    pub fn section_origin(
        &self,
        placement: ArenaOriginPlacement,
        section_type: SectionType,
        mesh_size: Vec3,
        dimensions: u32,
        tiles_per_side: u32,
    ) -> Vec2 {
        let center = placement.center_direction() * self.half_extent();

        match (section_type, self.policy.leader()) {
            (SectionType::HorizontalGrid, _) => {
                center - Vec2::new(mesh_size.x, mesh_size.y) * dimensions as f32 / 2.0
            }
            (SectionType::Polygon, Leader::Polygon) => {
                let built = tiles_per_side as f32 * mesh_size.x;
                let half_angle = (180.0 / self.arena_sides as f32).to_radians();
                let apothem = built / (2.0 * half_angle.tan());
                center + Vec2::new(-built / 2.0, -apothem)
            }
            (SectionType::Polygon, Leader::Grid) => {
                let built = tiles_per_side as f32 * mesh_size.x;
                // Ring shrinks to the whole tiles that fit the geometric side
                let coverage = if self.side_length > 0.0 {
                    built / self.side_length
                } else {
                    1.0
                };
                center + Vec2::new(-built / 2.0, -self.apothem * coverage)
            }
        }
    }
}
