//! Catalog and build-rule data model
//!
//! Everything here is plain configuration: owned by the host, immutable during
//! a generation pass, and (de)serializable so arenas can be authored as JSON.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::params::{BuildOrderPolicy, BuildTargets};
use super::pivot::PivotPlacement;

/// Pitch/yaw/roll in degrees (Z up, yaw about Z)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Copy with `degrees` added to yaw
    pub fn add_yaw(self, degrees: f32) -> Self {
        Self {
            yaw: self.yaw + degrees,
            ..self
        }
    }

    /// Yaw, then pitch, then roll
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }
}

/// One mesh inside a group, with the corner its pivot sits on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMesh {
    #[serde(default)]
    pub pivot: PivotPlacement,
    /// Asset reference understood by the host renderer
    pub mesh: String,
}

/// A family of interchangeable meshes sharing one footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGroupConfig {
    #[serde(default = "default_mesh_dimensions")]
    pub mesh_dimensions: Vec3,
    #[serde(default = "default_scale")]
    pub mesh_scale: Vec3,
    #[serde(default)]
    pub group_meshes: Vec<GroupMesh>,
}

impl MeshGroupConfig {
    pub fn new(mesh_dimensions: Vec3, group_meshes: Vec<GroupMesh>) -> Self {
        Self {
            mesh_dimensions,
            mesh_scale: Vec3::ONE,
            group_meshes,
        }
    }

    /// Space one piece occupies once scaled
    pub fn footprint(&self) -> Vec3 {
        self.mesh_dimensions * self.mesh_scale
    }
}

/// A family of spawnable object classes sharing one footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorGroupConfig {
    #[serde(default = "default_mesh_dimensions")]
    pub actor_dimensions: Vec3,
    #[serde(default = "default_scale")]
    pub actor_scale: Vec3,
    #[serde(default)]
    pub spawnable_classes: Vec<String>,
}

impl ActorGroupConfig {
    pub fn footprint(&self) -> Vec3 {
        self.actor_dimensions * self.actor_scale
    }
}

fn default_mesh_dimensions() -> Vec3 {
    Vec3::new(500.0, 500.0, 500.0)
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// Arrangement a section lays its pieces out in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SectionType {
    #[default]
    HorizontalGrid,
    Polygon,
}

/// What a section places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetKind {
    #[default]
    StaticMeshes,
    Actors,
}

/// How each piece's yaw is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationRule {
    /// Default rotation as-is
    #[default]
    None,
    /// Quantized: 360/n steps
    RotateByYawPossibilities,
    /// Any yaw in [0, 360)
    RotateYawRandomly,
}

/// Progressive pitch for leaning stacks (domes, sloped roofs)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchLean {
    pub starting_pitch: f32,
    /// Pitch changes once every this many levels (values < 1 act as 1)
    pub adjust_every_levels: u32,
    pub lean_per_step: f32,
    /// Follow the lean: pull each level in over the tops of the ones below
    pub adjust_placement_to_lean: bool,
}

impl PitchLean {
    /// Pitch for a given height level
    pub fn pitch_for_level(&self, level: u32) -> f32 {
        let step = level / self.adjust_every_levels.max(1);
        self.starting_pitch + self.lean_per_step * step as f32
    }
}

/// One placement instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBuildRules {
    pub section_type: SectionType,
    /// Height levels; values below 1 build one level
    pub repeat_count: i32,
    pub asset_kind: AssetKind,
    /// Negative or out-of-range values fall back to group 0
    pub group_index: i32,
    pub default_rotation: Rotator,
    pub rotation_rule: RotationRule,
    pub yaw_possibilities: u32,
    pub warp_enabled: bool,
    pub warp_range: Vec3,
    pub warp_concavity_strength: f32,
    pub init_offset_by_width_scalar: f32,
    pub offset_by_width_increment: f32,
    pub init_offset_by_height_scalar: f32,
    pub offset_by_height_increment: f32,
    pub updates_origin_offset_height: bool,
    /// Max extra Z scale per piece (0 disables)
    pub scale_warp: f32,
    pub lean: Option<PitchLean>,
}

impl Default for SectionBuildRules {
    fn default() -> Self {
        Self {
            section_type: SectionType::HorizontalGrid,
            repeat_count: 1,
            asset_kind: AssetKind::StaticMeshes,
            group_index: 0,
            default_rotation: Rotator::ZERO,
            rotation_rule: RotationRule::None,
            yaw_possibilities: 4,
            warp_enabled: false,
            warp_range: Vec3::ZERO,
            warp_concavity_strength: 0.0,
            init_offset_by_width_scalar: 0.0,
            offset_by_width_increment: 0.0,
            init_offset_by_height_scalar: 0.0,
            offset_by_height_increment: 1.0,
            updates_origin_offset_height: false,
            scale_warp: 0.0,
            lean: None,
        }
    }
}

impl SectionBuildRules {
    pub fn grid(group_index: i32) -> Self {
        Self {
            section_type: SectionType::HorizontalGrid,
            group_index,
            ..Default::default()
        }
    }

    pub fn polygon(group_index: i32) -> Self {
        Self {
            section_type: SectionType::Polygon,
            group_index,
            ..Default::default()
        }
    }

    /// Number of height levels actually built
    pub fn levels(&self) -> u32 {
        self.repeat_count.max(1) as u32
    }

    /// Divisor used by the quantized rotation rule
    pub fn clamped_yaw_possibilities(&self) -> u32 {
        self.yaw_possibilities.clamp(
            crate::consts::MIN_YAW_POSSIBILITIES,
            crate::consts::MAX_YAW_POSSIBILITIES,
        )
    }

    /// Height a full build of this rule adds to the running origin
    pub fn stack_height(&self, mesh_size: Vec3) -> f32 {
        mesh_size.z * self.levels() as f32 * self.offset_by_height_increment
    }
}

/// A group of build rules sharing one build-order policy and target set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArenaSection {
    #[serde(default)]
    pub policy: BuildOrderPolicy,
    #[serde(default)]
    pub targets: BuildTargets,
    #[serde(default)]
    pub rules: Vec<SectionBuildRules>,
}

impl ArenaSection {
    pub fn new(policy: BuildOrderPolicy, targets: BuildTargets, rules: Vec<SectionBuildRules>) -> Self {
        Self {
            policy,
            targets,
            rules,
        }
    }
}

/// Mesh and actor catalogs a pass reads from
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    pub mesh_groups: &'a [MeshGroupConfig],
    pub actor_groups: &'a [ActorGroupConfig],
}

impl<'a> Catalog<'a> {
    pub fn new(mesh_groups: &'a [MeshGroupConfig], actor_groups: &'a [ActorGroupConfig]) -> Self {
        Self {
            mesh_groups,
            actor_groups,
        }
    }

    pub fn group_count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::StaticMeshes => self.mesh_groups.len(),
            AssetKind::Actors => self.actor_groups.len(),
        }
    }

    /// Footprint of a group (index must already be resolved)
    pub fn footprint(&self, kind: AssetKind, group: usize) -> Option<Vec3> {
        match kind {
            AssetKind::StaticMeshes => self.mesh_groups.get(group).map(MeshGroupConfig::footprint),
            AssetKind::Actors => self.actor_groups.get(group).map(ActorGroupConfig::footprint),
        }
    }

    /// Scale a placed piece carries
    pub fn scale(&self, kind: AssetKind, group: usize) -> Vec3 {
        match kind {
            AssetKind::StaticMeshes => self.mesh_groups.get(group).map(|g| g.mesh_scale),
            AssetKind::Actors => self.actor_groups.get(group).map(|g| g.actor_scale),
        }
        .unwrap_or(Vec3::ONE)
    }

    /// Entries (meshes or classes) inside a group
    pub fn entry_count(&self, kind: AssetKind, group: usize) -> usize {
        match kind {
            AssetKind::StaticMeshes => self.mesh_groups.get(group).map_or(0, |g| g.group_meshes.len()),
            AssetKind::Actors => self
                .actor_groups
                .get(group)
                .map_or(0, |g| g.spawnable_classes.len()),
        }
    }

    /// Pivot of an entry; spawned actors are treated as centered
    pub fn pivot(&self, kind: AssetKind, group: usize, entry: usize) -> PivotPlacement {
        match kind {
            AssetKind::StaticMeshes => self
                .mesh_groups
                .get(group)
                .and_then(|g| g.group_meshes.get(entry))
                .map_or(PivotPlacement::Center, |m| m.pivot),
            AssetKind::Actors => PivotPlacement::Center,
        }
    }
}

/// Output unit handed to the sinks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementTransform {
    pub rotation: Rotator,
    pub location: Vec3,
    pub scale: Vec3,
    pub kind: AssetKind,
    /// Catalog group index (after fallback)
    pub group: usize,
    /// Mesh or class index inside the group
    pub item: usize,
}

impl PlacementTransform {
    /// Same placement moved by `offset` (local -> world)
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            location: self.location + offset,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_coerced() {
        let mut rule = SectionBuildRules::grid(0);
        rule.repeat_count = 0;
        assert_eq!(rule.levels(), 1);
        rule.repeat_count = -4;
        assert_eq!(rule.levels(), 1);
        rule.repeat_count = 3;
        assert_eq!(rule.levels(), 3);
    }

    #[test]
    fn test_yaw_possibilities_clamped() {
        let mut rule = SectionBuildRules::grid(0);
        rule.yaw_possibilities = 0;
        assert_eq!(rule.clamped_yaw_possibilities(), 2);
        rule.yaw_possibilities = 5000;
        assert_eq!(rule.clamped_yaw_possibilities(), 720);
    }

    #[test]
    fn test_pitch_lean_steps() {
        let lean = PitchLean {
            starting_pitch: 10.0,
            adjust_every_levels: 2,
            lean_per_step: 5.0,
            adjust_placement_to_lean: false,
        };
        assert_eq!(lean.pitch_for_level(0), 10.0);
        assert_eq!(lean.pitch_for_level(1), 10.0);
        assert_eq!(lean.pitch_for_level(2), 15.0);
        assert_eq!(lean.pitch_for_level(5), 20.0);
    }

    #[test]
    fn test_footprint_uses_scale() {
        let mut group = MeshGroupConfig::new(Vec3::new(100.0, 200.0, 10.0), Vec::new());
        group.mesh_scale = Vec3::new(2.0, 1.0, 3.0);
        assert_eq!(group.footprint(), Vec3::new(200.0, 200.0, 30.0));
    }

    #[test]
    fn test_rotator_yaw_quat() {
        let q = Rotator::new(0.0, 90.0, 0.0).to_quat();
        let v = q * Vec3::X;
        assert!((v - Vec3::Y).length() < 1e-5);
    }
}
