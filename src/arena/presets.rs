//! Ready-made arena layouts
//!
//! [`ThreePieceArena`] is the classic floor / walls / roof arena: a square
//! floor grid, a polygon ring of walls standing on it and a polygon roof ring
//! on top of the walls. It expands into one [`ArenaSection`] with three rules.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::config::{ArenaSection, GroupMesh, MeshGroupConfig, PitchLean, Rotator, RotationRule, SectionBuildRules};
use super::params::{BuildOrderPolicy, BuildTargets};
use super::pivot::PivotPlacement;
use crate::settings::{ArenaConfig, GeneratorSettings};

/// Extra Z scale a warped floor tile may get
pub const FLOOR_SCALE_WARP: f32 = 0.25;

/// Pitch of each roof level when the roof is built as a cone
pub const CONE_PITCH: f32 = 45.0;

/// Mesh group slots the preset writes
pub const FLOOR_GROUP: i32 = 0;
pub const WALL_GROUP: i32 = 1;
pub const ROOF_GROUP: i32 = 2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorRules {
    /// Random quarter turns
    pub rotates: bool,
    pub warp_placement: bool,
    pub warp_range: Vec3,
    pub concavity_strength: f32,
    /// Random extra thickness per tile
    pub warp_scale: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WallRules {
    pub warp_placement: bool,
    pub warp_range: Vec3,
    /// Added to every wall piece's rotation
    pub rotation: Rotator,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoofRules {
    /// Start the roof one wall thickness inward
    pub bring_forward: bool,
    /// Step every level inward by one roof depth
    pub increments_forward_each_level: bool,
    /// Lean every level inward by [`CONE_PITCH`] (unless `lean` is set)
    pub build_as_cone: bool,
    /// Random half turns
    pub rotates: bool,
    /// Turn every roof piece around
    pub flip_meshes: bool,
    pub warp_placement: bool,
    pub warp_range: Vec3,
    pub concavity_strength: f32,
    pub lean: Option<PitchLean>,
}

/// Floor, walls and roof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreePieceArena {
    pub seed: u64,
    pub policy: BuildOrderPolicy,
    pub targets: BuildTargets,

    // === Pieces ===
    pub floor: MeshGroupConfig,
    pub wall: MeshGroupConfig,
    pub roof: MeshGroupConfig,

    // === Heights ===
    /// Wall levels (0 leaves the walls out)
    pub side_tile_height: i32,
    /// Roof levels (0 leaves the roof out)
    pub roof_tile_height: i32,

    // === Rules ===
    pub floor_rules: FloorRules,
    pub wall_rules: WallRules,
    pub roof_rules: RoofRules,
}

fn single_mesh(name: &str, dimensions: Vec3) -> MeshGroupConfig {
    MeshGroupConfig::new(
        dimensions,
        vec![GroupMesh {
            pivot: PivotPlacement::XyPositive,
            mesh: name.to_string(),
        }],
    )
}

impl Default for ThreePieceArena {
    fn default() -> Self {
        Self {
            seed: 0,
            policy: BuildOrderPolicy::GridLeadsByDimensions,
            targets: BuildTargets {
                inscribed_radius: 2000.0,
                polygon_sides: 8,
                tiles_per_side: 5,
                grid_dimensions: 10,
            },

            floor: single_mesh("Floor", Vec3::new(500.0, 500.0, 50.0)),
            wall: single_mesh("Wall", Vec3::new(500.0, 50.0, 500.0)),
            roof: single_mesh("Roof", Vec3::new(500.0, 500.0, 500.0)),

            side_tile_height: 1,
            roof_tile_height: 1,

            floor_rules: FloorRules::default(),
            wall_rules: WallRules::default(),
            roof_rules: RoofRules::default(),
        }
    }
}

impl ThreePieceArena {
    pub fn floor_rule(&self) -> SectionBuildRules {
        let rules = &self.floor_rules;
        SectionBuildRules {
            rotation_rule: if rules.rotates {
                RotationRule::RotateByYawPossibilities
            } else {
                RotationRule::None
            },
            yaw_possibilities: 4,
            warp_enabled: rules.warp_placement,
            warp_range: rules.warp_range,
            warp_concavity_strength: rules.concavity_strength,
            scale_warp: if rules.warp_scale { FLOOR_SCALE_WARP } else { 0.0 },
            // Walls stand on top of the floor
            updates_origin_offset_height: true,
            ..SectionBuildRules::grid(FLOOR_GROUP)
        }
    }

    pub fn wall_rule(&self) -> SectionBuildRules {
        let rules = &self.wall_rules;
        SectionBuildRules {
            repeat_count: self.side_tile_height,
            default_rotation: rules.rotation,
            warp_enabled: rules.warp_placement,
            warp_range: rules.warp_range,
            updates_origin_offset_height: true,
            ..SectionBuildRules::polygon(WALL_GROUP)
        }
    }

    pub fn roof_rule(&self) -> SectionBuildRules {
        let rules = &self.roof_rules;
        let roof_depth = self.roof.footprint().y;

        let init_offset_by_width_scalar = if rules.bring_forward && roof_depth > 0.0 {
            self.wall.footprint().y / roof_depth
        } else {
            0.0
        };

        let lean = rules.lean.or(rules.build_as_cone.then_some(PitchLean {
            starting_pitch: CONE_PITCH,
            adjust_every_levels: 1,
            lean_per_step: 0.0,
            adjust_placement_to_lean: true,
        }));

        SectionBuildRules {
            repeat_count: self.roof_tile_height,
            default_rotation: if rules.flip_meshes {
                Rotator::new(0.0, 180.0, 0.0)
            } else {
                Rotator::ZERO
            },
            rotation_rule: if rules.rotates {
                RotationRule::RotateByYawPossibilities
            } else {
                RotationRule::None
            },
            yaw_possibilities: 2,
            warp_enabled: rules.warp_placement,
            warp_range: rules.warp_range,
            warp_concavity_strength: rules.concavity_strength,
            init_offset_by_width_scalar,
            offset_by_width_increment: if rules.increments_forward_each_level { 1.0 } else { 0.0 },
            lean,
            ..SectionBuildRules::polygon(ROOF_GROUP)
        }
    }

    /// The single section this arena builds
    pub fn to_section(&self) -> ArenaSection {
        let mut rules = vec![self.floor_rule()];
        if self.side_tile_height > 0 {
            rules.push(self.wall_rule());
        }
        if self.roof_tile_height > 0 {
            rules.push(self.roof_rule());
        }
        ArenaSection::new(self.policy, self.targets, rules)
    }

    pub fn to_config(&self) -> ArenaConfig {
        ArenaConfig {
            settings: GeneratorSettings {
                seed: self.seed,
                ..Default::default()
            },
            mesh_groups: vec![self.floor.clone(), self.wall.clone(), self.roof.clone()],
            actor_groups: Vec::new(),
            sections: vec![self.to_section()],
        }
    }
}
