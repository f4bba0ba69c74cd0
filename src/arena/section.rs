//! Section builder
//!
//! Walks one build rule's index space (grid rows x cols, or polygon
//! sides x tiles x levels), computes a full transform per cell and hands it to
//! the sinks. Per cell the location is the tiled base position plus height and
//! width offsets, a pivot correction and the optional warps.

use glam::Vec3;
use rand::Rng;

use super::config::{AssetKind, Catalog, PlacementTransform, Rotator, RotationRule, SectionBuildRules, SectionType};
use super::params::{ArenaOriginPlacement, ArenaParameters, Limits};
use super::pivot::{
    PivotPlacement, offset_along_directions, origin_offset_scalar, quarter_turn_index, recenter_after_rotation,
};
use super::report::{ArenaError, BuildReport};
use super::state::BuildContext;
use super::warp::{clamp_warp_span, concavity_warp, directional_warp};
use crate::sink::{BucketHandle, InstanceSink, SpawnKind, SpawnSink};
use crate::{forward_vector_from_yaw, right_vector_from_yaw};

/// Read-only inputs shared by every rule of a section
#[derive(Debug, Clone, Copy)]
pub struct SectionEnv<'a> {
    pub catalog: Catalog<'a>,
    pub params: &'a ArenaParameters,
    pub limits: Limits,
    pub placement: ArenaOriginPlacement,
}

/// Placement frame: `forward` runs along the row/side, `right` across it
#[derive(Debug, Clone, Copy)]
struct Frame {
    forward: Vec3,
    right: Vec3,
}

impl Frame {
    const AXES: Frame = Frame {
        forward: Vec3::X,
        right: Vec3::Y,
    };

    fn from_yaw(yaw: f32) -> Self {
        Self {
            forward: forward_vector_from_yaw(yaw),
            right: right_vector_from_yaw(yaw),
        }
    }
}

/// Resolved group a rule places from
#[derive(Debug, Clone, Copy)]
struct Target {
    kind: AssetKind,
    group: usize,
    entries: usize,
    size: Vec3,
    scale: Vec3,
    bucket: Option<BucketHandle>,
}

/// Build one rule on top of `ctx`.
///
/// Configuration problems skip the whole rule; per-cell sink failures skip
/// only that cell. Either way the problem lands in the returned report.
pub fn build_section<S>(ctx: &mut BuildContext, env: &SectionEnv<'_>, rule: &SectionBuildRules, sink: &mut S) -> BuildReport
where
    S: InstanceSink + SpawnSink + ?Sized,
{
    let mut report = BuildReport::default();

    let Some(target) = resolve_target(ctx, env, rule, sink, &mut report) else {
        return report;
    };

    let ratio = ctx.mesh_scale_ratio(target.size);
    let mesh_changed = (ratio - 1.0).abs() > f32::EPSILON;

    match rule.section_type {
        SectionType::HorizontalGrid => {
            let dims = env.params.section_dimensions(target.size.x, mesh_changed, &env.limits);
            let origin = env
                .params
                .section_origin(env.placement, SectionType::HorizontalGrid, target.size, dims, 0);
            ctx.origin_offset.x = origin.x;
            ctx.origin_offset.y = origin.y;
            log::debug!(
                "grid section: group {} dims {} levels {} origin {}",
                target.group,
                dims,
                rule.levels(),
                ctx.origin_offset
            );
            build_grid(ctx, env, rule, &target, dims, sink, &mut report);
        }
        SectionType::Polygon => {
            let tiles = env
                .params
                .section_tiles_per_side(target.size.x, mesh_changed, &env.limits);
            let origin = env
                .params
                .section_origin(env.placement, SectionType::Polygon, target.size, 0, tiles);
            ctx.origin_offset.x = origin.x;
            ctx.origin_offset.y = origin.y;
            log::debug!(
                "polygon section: group {} sides {} tiles/side {} levels {} origin {}",
                target.group,
                env.params.arena_sides,
                tiles,
                rule.levels(),
                ctx.origin_offset
            );
            build_polygon(ctx, env, rule, &target, tiles, sink, &mut report);
            ctx.previous_tiles_per_side = Some(tiles);
        }
    }

    if rule.updates_origin_offset_height {
        ctx.origin_offset.z += rule.stack_height(target.size);
    }
    ctx.previous_mesh_size = Some(target.size);

    report
}

/// Group fallback, footprint checks and bucket registration
fn resolve_target<S>(
    ctx: &mut BuildContext,
    env: &SectionEnv<'_>,
    rule: &SectionBuildRules,
    sink: &mut S,
    report: &mut BuildReport,
) -> Option<Target>
where
    S: InstanceSink + SpawnSink + ?Sized,
{
    let kind = rule.asset_kind;
    let count = env.catalog.group_count(kind);
    if count == 0 {
        report.error(match kind {
            AssetKind::StaticMeshes => ArenaError::EmptyMeshCatalog,
            AssetKind::Actors => ArenaError::EmptyActorCatalog,
        });
        return None;
    }

    let group = match usize::try_from(rule.group_index) {
        Ok(g) if g < count => g,
        _ => {
            report.warn(ArenaError::GroupIndexFallback {
                kind,
                requested: rule.group_index,
            });
            0
        }
    };

    let size = env.catalog.footprint(kind, group).unwrap_or(Vec3::ZERO);
    if !(size.x > 0.0 && size.y > 0.0) {
        report.error(ArenaError::DegenerateMeshSize { kind, group, size });
        return None;
    }

    let entries = env.catalog.entry_count(kind, group);
    if entries == 0 {
        report.error(ArenaError::EmptyGroup { kind, group });
        return None;
    }

    let bucket = match kind {
        AssetKind::StaticMeshes => {
            let slot = match ctx.used_groups.reroute_index(group) {
                Some(slot) => slot,
                None => {
                    let bucket = sink.register_group(group, &env.catalog.mesh_groups[group]);
                    ctx.used_groups.insert(group, bucket)
                }
            };
            ctx.used_groups.bucket(slot)
        }
        AssetKind::Actors => None,
    };

    Some(Target {
        kind,
        group,
        entries,
        size,
        scale: env.catalog.scale(kind, group),
        bucket,
    })
}

fn build_grid<S>(
    ctx: &mut BuildContext,
    env: &SectionEnv<'_>,
    rule: &SectionBuildRules,
    target: &Target,
    dims: u32,
    sink: &mut S,
    report: &mut BuildReport,
) where
    S: InstanceSink + SpawnSink + ?Sized,
{
    let size = target.size;
    let base = ctx.origin_offset;
    let mid = (dims / 2) as i32;

    for level in 0..rule.levels() {
        let height = size.z * (level as f32 * rule.offset_by_height_increment + rule.init_offset_by_height_scalar);
        for row in 0..dims {
            for col in 0..dims {
                let item = pick_item(&mut ctx.rng, target.entries);
                let rotation = resolve_rotation(&mut ctx.rng, rule);
                let scale = warp_scale(&mut ctx.rng, rule, target.scale);
                let pivot = env.catalog.pivot(target.kind, target.group, item);

                let mut location = base
                    + Vec3::new(row as f32 * size.x, col as f32 * size.y, height)
                    + pivot_correction(pivot, size, Frame::AXES, rotation.yaw);

                if rule.warp_enabled {
                    if rule.warp_concavity_strength != 0.0 {
                        location +=
                            concavity_warp(mid, mid, col as i32, row as i32, rule.warp_concavity_strength, Vec3::Z);
                    }
                    location += directional_warp(&mut ctx.rng, rule.warp_range, Vec3::X, Vec3::Y);
                }

                let transform = PlacementTransform {
                    rotation,
                    location,
                    scale,
                    kind: target.kind,
                    group: target.group,
                    item,
                };
                emit(ctx, target, transform, sink, report);
            }
        }
    }
}

fn build_polygon<S>(
    ctx: &mut BuildContext,
    env: &SectionEnv<'_>,
    rule: &SectionBuildRules,
    target: &Target,
    tiles: u32,
    sink: &mut S,
    report: &mut BuildReport,
) where
    S: InstanceSink + SpawnSink + ?Sized,
{
    let size = target.size;
    let sides = env.params.arena_sides;
    let exterior = env.params.exterior_angle;
    let levels = level_offsets(rule, size);
    let col_mid = (tiles / 2) as i32;
    let row_mid = (rule.levels() / 2) as i32;

    let mut side_start = ctx.origin_offset;
    for side in 0..sides {
        let side_yaw = exterior * side as f32;
        if side > 0 {
            side_start += forward_vector_from_yaw(exterior * (side - 1) as f32) * size.x * tiles as f32;
        }
        let frame = Frame::from_yaw(side_yaw);

        let mut cached = side_start;
        for tile in 0..tiles {
            if tile > 0 {
                cached += frame.forward * size.x;
            }
            for (level, offsets) in levels.iter().enumerate() {
                let item = pick_item(&mut ctx.rng, target.entries);
                let mut rotation = resolve_rotation(&mut ctx.rng, rule);
                let scale = warp_scale(&mut ctx.rng, rule, target.scale);
                let pivot = env.catalog.pivot(target.kind, target.group, item);

                let correction = pivot_correction(pivot, size, frame, rotation.yaw);
                rotation.yaw += side_yaw;
                rotation.pitch += offsets.pitch;

                let width = size.y * (rule.init_offset_by_width_scalar + level as f32 * rule.offset_by_width_increment)
                    + offsets.inward;

                let mut location = cached + Vec3::new(0.0, 0.0, offsets.height) + frame.right * width + correction;

                if rule.warp_enabled {
                    if rule.warp_concavity_strength != 0.0 {
                        location += concavity_warp(
                            col_mid,
                            row_mid,
                            tile as i32,
                            level as i32,
                            rule.warp_concavity_strength,
                            frame.right,
                        );
                    }
                    location += directional_warp(&mut ctx.rng, rule.warp_range, frame.forward, frame.right);
                }

                let transform = PlacementTransform {
                    rotation,
                    location,
                    scale,
                    kind: target.kind,
                    group: target.group,
                    item,
                };
                emit(ctx, target, transform, sink, report);
            }
        }
    }
}

/// Per-level height, inward shift and pitch for a polygon stack
#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelOffsets {
    height: f32,
    inward: f32,
    pitch: f32,
}

fn level_offsets(rule: &SectionBuildRules, size: Vec3) -> Vec<LevelOffsets> {
    let init_height = size.z * rule.init_offset_by_height_scalar;
    let step = size.z * rule.offset_by_height_increment;

    let mut height = init_height;
    let mut inward = 0.0;
    (0..rule.levels())
        .map(|level| {
            let Some(lean) = rule.lean else {
                return LevelOffsets {
                    height: init_height + step * level as f32,
                    inward: 0.0,
                    pitch: 0.0,
                };
            };
            let pitch = lean.pitch_for_level(level);
            if !lean.adjust_placement_to_lean {
                return LevelOffsets {
                    height: init_height + step * level as f32,
                    inward: 0.0,
                    pitch,
                };
            }
            let offsets = LevelOffsets { height, inward, pitch };
            // Next level starts on top of this one's leaning face
            height += step * pitch.to_radians().cos();
            inward += step * pitch.to_radians().sin();
            offsets
        })
        .collect()
}

fn pick_item<R: Rng + ?Sized>(rng: &mut R, entries: usize) -> usize {
    if entries > 1 { rng.random_range(0..entries) } else { 0 }
}

/// Default rotation plus whatever yaw the rule adds
fn resolve_rotation<R: Rng + ?Sized>(rng: &mut R, rule: &SectionBuildRules) -> Rotator {
    match rule.rotation_rule {
        RotationRule::None => rule.default_rotation,
        RotationRule::RotateByYawPossibilities => {
            let possibilities = rule.clamped_yaw_possibilities();
            let step = rng.random_range(0..possibilities);
            rule.default_rotation
                .add_yaw(360.0 / possibilities as f32 * step as f32)
        }
        RotationRule::RotateYawRandomly => rule.default_rotation.add_yaw(rng.random_range(0.0..360.0)),
    }
}

fn warp_scale<R: Rng + ?Sized>(rng: &mut R, rule: &SectionBuildRules, scale: Vec3) -> Vec3 {
    if rule.scale_warp > 0.0 {
        scale + Vec3::new(0.0, 0.0, rng.random_range(0.0..=clamp_warp_span(rule.scale_warp)))
    } else {
        scale
    }
}

/// Translation that makes a mesh turned by `yaw` (relative to `frame`) fill
/// the cell spanning `size.x` along forward and `size.y` along right.
fn pivot_correction(pivot: PivotPlacement, size: Vec3, frame: Frame, yaw: f32) -> Vec3 {
    match quarter_turn_index(yaw) {
        Some(step) => {
            let nudge = if pivot == PivotPlacement::Center {
                frame.forward * size.x / 2.0 + frame.right * size.y / 2.0
            } else {
                Vec3::ZERO
            };
            offset_along_directions(frame.forward, frame.right, pivot, size, step) + nudge
        }
        None => {
            let local = recenter_after_rotation(pivot, size, yaw) - origin_offset_scalar(pivot) * size;
            frame.forward * (size.x / 2.0 + local.x) + frame.right * (size.y / 2.0 + local.y)
        }
    }
}

fn emit<S>(ctx: &mut BuildContext, target: &Target, transform: PlacementTransform, sink: &mut S, report: &mut BuildReport)
where
    S: InstanceSink + SpawnSink + ?Sized,
{
    let placed = match target.kind {
        AssetKind::StaticMeshes => {
            let added = target
                .bucket
                .is_some_and(|bucket| sink.add_instance(bucket, transform.item, &transform));
            if !added {
                report.error(ArenaError::MissingBucket { group: target.group });
            }
            added
        }
        AssetKind::Actors => {
            let kind = SpawnKind::Actor {
                group: target.group,
                class_index: transform.item,
            };
            match sink.spawn(kind, &transform) {
                Some(handle) => {
                    ctx.spawned_objects.push(handle);
                    true
                }
                None => {
                    report.error(ArenaError::SpawnFailed {
                        kind: target.kind,
                        group: target.group,
                        item: transform.item,
                    });
                    false
                }
            }
        }
    };

    if placed {
        ctx.total_instances += 1;
        ctx.previous_last_position = Some(transform.location);
        report.placed += 1;
    } else {
        report.skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::config::{ActorGroupConfig, GroupMesh, MeshGroupConfig, PitchLean};
    use crate::arena::params::{BuildOrderPolicy, BuildTargets, derive_parameters};
    use crate::sink::MemorySink;

    const FLOOR: Vec3 = Vec3::new(500.0, 500.0, 50.0);
    const WALL: Vec3 = Vec3::new(500.0, 50.0, 500.0);

    fn group(size: Vec3, pivot: PivotPlacement) -> MeshGroupConfig {
        MeshGroupConfig::new(
            size,
            vec![GroupMesh {
                pivot,
                mesh: "Tile".into(),
            }],
        )
    }

    fn catalog_groups() -> Vec<MeshGroupConfig> {
        vec![group(FLOOR, PivotPlacement::XyPositive), group(WALL, PivotPlacement::XyPositive)]
    }

    fn params(policy: BuildOrderPolicy, targets: BuildTargets) -> ArenaParameters {
        derive_parameters(policy, &targets, FLOOR, WALL, &Limits::default())
    }

    fn env<'a>(meshes: &'a [MeshGroupConfig], params: &'a ArenaParameters) -> SectionEnv<'a> {
        SectionEnv {
            catalog: Catalog::new(meshes, &[]),
            params,
            limits: Limits::default(),
            placement: ArenaOriginPlacement::Center,
        }
    }

    fn small_grid() -> BuildTargets {
        BuildTargets {
            grid_dimensions: 4,
            polygon_sides: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_grid_height_stacks() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            repeat_count: 3,
            updates_origin_offset_height: true,
            offset_by_height_increment: 1.0,
            ..SectionBuildRules::grid(0)
        };
        let before = ctx.origin_offset.z;
        let report = build_section(&mut ctx, &env, &rule, &mut sink);

        assert!(report.is_clean());
        assert_eq!(ctx.origin_offset.z - before, 150.0);
        assert_eq!(report.placed, 4 * 4 * 3);
        assert_eq!(ctx.total_instances, 48);
        assert_eq!(ctx.previous_mesh_size, Some(FLOOR));
    }

    #[test]
    fn test_grid_cells_tile_without_gaps() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        build_section(&mut ctx, &env, &SectionBuildRules::grid(0), &mut sink);
        let placements = sink.placements();
        assert_eq!(placements.len(), 16);
        // Centered 4x4 grid of 500 tiles starts at -1000
        assert_eq!(placements[0].location, Vec3::new(-1000.0, -1000.0, 0.0));
        assert_eq!(placements[1].location, Vec3::new(-1000.0, -500.0, 0.0));
        assert_eq!(placements[4].location, Vec3::new(-500.0, -1000.0, 0.0));
        assert_eq!(placements[15].location, Vec3::new(500.0, 500.0, 0.0));
        assert_eq!(ctx.previous_last_position, Some(placements[15].location));
    }

    #[test]
    fn test_quantized_rotation_keeps_cells() {
        let meshes = vec![group(FLOOR, PivotPlacement::XyNegative)];
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(5);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            rotation_rule: RotationRule::RotateByYawPossibilities,
            yaw_possibilities: 4,
            ..SectionBuildRules::grid(0)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);

        for (i, t) in sink.placements().iter().enumerate() {
            let step = quarter_turn_index(t.rotation.yaw).expect("quarter turns only");
            // Rotated mesh center must sit on its cell center
            let to_center = Rotator::new(0.0, t.rotation.yaw, 0.0).to_quat()
                * (origin_offset_scalar(PivotPlacement::XyNegative) * FLOOR);
            let center = t.location + to_center;
            let row = (i / 4) as f32;
            let col = (i % 4) as f32;
            let expected = Vec3::new(-1000.0 + (row + 0.5) * 500.0, -1000.0 + (col + 0.5) * 500.0, 0.0);
            assert!((center - expected).length() < 0.1, "cell {i} step {step}: {center} vs {expected}");
        }
    }

    #[test]
    fn test_free_rotation_recenters() {
        let meshes = vec![group(FLOOR, PivotPlacement::XyPositive)];
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(11);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            rotation_rule: RotationRule::RotateYawRandomly,
            ..SectionBuildRules::grid(0)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);

        for (i, t) in sink.placements().iter().enumerate() {
            let to_center = Rotator::new(0.0, t.rotation.yaw, 0.0).to_quat() * (Vec3::new(0.5, 0.5, 0.0) * FLOOR);
            let center = t.location + to_center;
            let row = (i / 4) as f32;
            let col = (i % 4) as f32;
            let expected = Vec3::new(-1000.0 + (row + 0.5) * 500.0, -1000.0 + (col + 0.5) * 500.0, 0.0);
            assert!((center - expected).length() < 0.1, "cell {i}");
        }
    }

    #[test]
    fn test_polygon_ring_closes() {
        let meshes = catalog_groups();
        let targets = BuildTargets {
            polygon_sides: 6,
            tiles_per_side: 3,
            ..Default::default()
        };
        let p = params(BuildOrderPolicy::PolygonLeadByDimensions, targets);
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(3);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            repeat_count: 2,
            ..SectionBuildRules::polygon(1)
        };
        let report = build_section(&mut ctx, &env, &rule, &mut sink);
        assert_eq!(report.placed, 6 * 3 * 2);
        assert_eq!(ctx.previous_tiles_per_side, Some(3));

        let placements = sink.placements();
        let first = placements[0];
        // Last piece of the last side ends where the first one started
        let last = placements[placements.len() - 2];
        let end = last.location + forward_vector_from_yaw(last.rotation.yaw) * WALL.x;
        assert!((end - first.location).length() < 0.5, "{end} vs {}", first.location);

        // Every piece sits on the ring at the derived apothem
        for t in placements.iter().filter(|t| t.location.z == 0.0) {
            let mid = t.location + forward_vector_from_yaw(t.rotation.yaw) * WALL.x / 2.0;
            let inward = right_vector_from_yaw(t.rotation.yaw);
            let dist = -mid.truncate().dot(inward.truncate());
            assert!((dist - p.apothem).abs() < 0.5, "{dist} vs {}", p.apothem);
        }
        // Second level sits one wall higher
        assert_eq!(placements[1].location.z, 500.0);
    }

    #[test]
    fn test_polygon_width_offsets_step_inward() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::PolygonLeadByDimensions, BuildTargets::default());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(3);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            repeat_count: 3,
            init_offset_by_width_scalar: 1.0,
            offset_by_width_increment: 2.0,
            ..SectionBuildRules::polygon(1)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);
        let placements = sink.placements();
        // Side 0 runs along +X, inward is +Y; wall thickness 50
        assert!((placements[1].location.y - placements[0].location.y - 100.0).abs() < 1e-3);
        assert!((placements[2].location.y - placements[0].location.y - 200.0).abs() < 1e-3);
        assert!((placements[0].location.y - (-p.apothem + 50.0)).abs() < 0.5);
    }

    #[test]
    fn test_lean_pulls_levels_in() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::PolygonLeadByDimensions, BuildTargets::default());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(3);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            repeat_count: 3,
            lean: Some(PitchLean {
                starting_pitch: 30.0,
                adjust_every_levels: 1,
                lean_per_step: 0.0,
                adjust_placement_to_lean: true,
            }),
            ..SectionBuildRules::polygon(1)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);
        let placements = sink.placements();
        assert_eq!(placements[0].rotation.pitch, 30.0);
        assert!((placements[1].location.z - 500.0 * 30f32.to_radians().cos()).abs() < 1e-2);
        assert!((placements[1].location.y - placements[0].location.y - 250.0).abs() < 1e-2);
    }

    #[test]
    fn test_mesh_change_rederives_counts() {
        let mut meshes = catalog_groups();
        meshes.push(group(Vec3::new(250.0, 250.0, 25.0), PivotPlacement::XyPositive));
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        build_section(&mut ctx, &env, &SectionBuildRules::grid(0), &mut sink);
        let report = build_section(&mut ctx, &env, &SectionBuildRules::grid(2), &mut sink);
        // Same 2000 span with half-size tiles
        assert_eq!(report.placed, 8 * 8);
    }

    #[test]
    fn test_missing_bucket_skips_cells() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();
        sink.reject_groups = vec![0];

        let report = build_section(&mut ctx, &env, &SectionBuildRules::grid(0), &mut sink);
        assert_eq!(report.placed, 0);
        assert_eq!(report.skipped, 16);
        assert_eq!(report.errors.len(), 16);
        assert!(report.errors.iter().all(|e| *e == ArenaError::MissingBucket { group: 0 }));

        // A later section still builds
        let report = build_section(&mut ctx, &env, &SectionBuildRules::polygon(1), &mut sink);
        assert!(report.is_clean());
        assert!(report.placed > 0);
    }

    #[test]
    fn test_group_index_fallback() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        let report = build_section(&mut ctx, &env, &SectionBuildRules::grid(-3), &mut sink);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.placed, 16);
        assert!(sink.placements().iter().all(|t| t.group == 0));

        // Reuses the bucket registered for group 0
        build_section(&mut ctx, &env, &SectionBuildRules::grid(9), &mut sink);
        assert_eq!(sink.buckets.len(), 1);
        assert_eq!(ctx.used_groups.len(), 1);
    }

    #[test]
    fn test_actor_sections_spawn() {
        let meshes = catalog_groups();
        let actors = vec![ActorGroupConfig {
            actor_dimensions: Vec3::new(500.0, 100.0, 300.0),
            actor_scale: Vec3::ONE,
            spawnable_classes: vec!["Torch".into(), "Banner".into()],
        }];
        let p = params(BuildOrderPolicy::PolygonLeadByDimensions, BuildTargets::default());
        let env = SectionEnv {
            catalog: Catalog::new(&meshes, &actors),
            params: &p,
            limits: Limits::default(),
            placement: ArenaOriginPlacement::Center,
        };
        let mut ctx = BuildContext::new(8);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            asset_kind: AssetKind::Actors,
            ..SectionBuildRules::polygon(0)
        };
        let report = build_section(&mut ctx, &env, &rule, &mut sink);
        assert_eq!(report.placed, 8 * 5);
        assert_eq!(sink.objects.len(), 40);
        assert_eq!(ctx.spawned_objects.len(), 40);
        assert_eq!(sink.instance_count(), 0);
        assert!(sink.objects.iter().any(|o| matches!(o.kind, SpawnKind::Actor { class_index: 1, .. })));
    }

    #[test]
    fn test_concavity_lifts_grid_corners() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            warp_enabled: true,
            warp_concavity_strength: 100.0,
            ..SectionBuildRules::grid(0)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);
        let placements = sink.placements();
        // dims 4, mid 2: corner (0,0) saturates, (2,2) is flat
        assert_eq!(placements[0].location.z, 100.0);
        assert_eq!(placements[2 * 4 + 2].location.z, 0.0);
    }

    #[test]
    fn test_empty_group_skips_section() {
        let meshes = vec![MeshGroupConfig::new(FLOOR, Vec::new())];
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        let report = build_section(&mut ctx, &env, &SectionBuildRules::grid(0), &mut sink);
        assert_eq!(report.errors, vec![ArenaError::EmptyGroup { kind: AssetKind::StaticMeshes, group: 0 }]);
        assert_eq!(sink.instance_count(), 0);
        assert!(ctx.previous_mesh_size.is_none());
    }

    #[test]
    fn test_unbounded_warp_still_builds() {
        let meshes = catalog_groups();
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(1);
        let mut sink = MemorySink::new();

        let rule = SectionBuildRules {
            warp_enabled: true,
            warp_range: Vec3::new(f32::MAX, f32::INFINITY, f32::NAN),
            scale_warp: f32::INFINITY,
            ..SectionBuildRules::grid(0)
        };
        let report = build_section(&mut ctx, &env, &rule, &mut sink);
        assert!(report.is_clean());
        assert_eq!(report.placed, 16);
        assert!(sink.placements().iter().all(|t| t.location.is_finite() && t.scale.is_finite()));
    }

    #[test]
    fn test_draw_order_per_cell() {
        use rand::SeedableRng;
        use rand_pcg::Pcg32;

        let centered: Vec<GroupMesh> = ["A", "B", "C"]
            .iter()
            .map(|name| GroupMesh {
                pivot: PivotPlacement::Center,
                mesh: (*name).into(),
            })
            .collect();
        let meshes = vec![MeshGroupConfig::new(FLOOR, centered)];
        let p = params(BuildOrderPolicy::GridLeadsByDimensions, small_grid());
        let env = env(&meshes, &p);
        let mut ctx = BuildContext::new(2024);
        let mut sink = MemorySink::new();

        let warp = Vec3::new(10.0, 0.0, 5.0);
        let rule = SectionBuildRules {
            rotation_rule: RotationRule::RotateYawRandomly,
            scale_warp: 0.25,
            warp_enabled: true,
            warp_range: warp,
            ..SectionBuildRules::grid(0)
        };
        build_section(&mut ctx, &env, &rule, &mut sink);
        let placements = sink.placements();

        // item, yaw, scale, then forward/right/up warp (zero ranges still draw)
        let mut rng = Pcg32::seed_from_u64(2024);
        for (i, t) in placements.iter().take(6).enumerate() {
            let item = rng.random_range(0..3usize);
            let yaw = rng.random_range(0.0f32..360.0);
            let lift = rng.random_range(0.0f32..=0.25);
            let wx = rng.random_range(-warp.x..=warp.x);
            let wy = rng.random_range(-warp.y..=warp.y);
            let wz = rng.random_range(-warp.z..=warp.z);

            let row = (i / 4) as f32;
            let col = (i % 4) as f32;
            let cell = Vec3::new(-1000.0, -1000.0, 0.0) + Vec3::new(row * 500.0, col * 500.0, 0.0);
            let expected = cell + Vec3::new(250.0, 250.0, 0.0) + Vec3::new(wx, wy, wz);

            assert_eq!(t.item, item, "cell {i}");
            assert_eq!(t.rotation.yaw, yaw, "cell {i}");
            assert_eq!(t.scale, Vec3::new(1.0, 1.0, 1.0 + lift), "cell {i}");
            assert!((t.location - expected).length() < 1e-3, "cell {i}: {} vs {expected}", t.location);
        }
    }
}
