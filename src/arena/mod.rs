//! Deterministic arena generation
//!
//! All placement logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only, restarted every pass
//! - Fixed iteration order (sides, tiles, levels / levels, rows, cols)
//! - No rendering or spawning of its own; output goes through the sinks

pub mod config;
pub mod generator;
pub mod params;
pub mod pivot;
pub mod presets;
pub mod report;
pub mod section;
pub mod state;
pub mod warp;

pub use config::{
    ActorGroupConfig, ArenaSection, AssetKind, Catalog, GroupMesh, MeshGroupConfig, PitchLean, PlacementTransform,
    Rotator, RotationRule, SectionBuildRules, SectionType,
};
pub use generator::ArenaGenerator;
pub use params::{
    ArenaOriginPlacement, ArenaParameters, BuildOrderPolicy, BuildTargets, Limits, calculate_section_parameters,
    derive_parameters,
};
pub use pivot::PivotPlacement;
pub use presets::ThreePieceArena;
pub use report::{ArenaError, BuildReport};
pub use section::{SectionEnv, build_section};
pub use state::{BuildContext, RngState};
