//! Diagnostics collected during a pass
//!
//! Nothing in a generation pass returns `Err` to the host. Problems are logged
//! and recorded here, and the affected piece or section is skipped.

use glam::Vec3;
use thiserror::Error;

use super::config::AssetKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArenaError {
    #[error("mesh group catalog is empty, nothing can be built")]
    EmptyMeshCatalog,
    #[error("actor group catalog is empty, nothing can be spawned")]
    EmptyActorCatalog,
    #[error("no arena sections configured")]
    NoSections,
    #[error("section {section} has no build rules")]
    EmptySection { section: usize },
    #[error("{kind:?} group {group} has a degenerate footprint {size}")]
    DegenerateMeshSize { kind: AssetKind, group: usize, size: Vec3 },
    #[error("{kind:?} group index {requested} is invalid, falling back to group 0")]
    GroupIndexFallback { kind: AssetKind, requested: i32 },
    #[error("{kind:?} group {group} has no entries to place")]
    EmptyGroup { kind: AssetKind, group: usize },
    #[error("no instance bucket for mesh group {group}")]
    MissingBucket { group: usize },
    #[error("spawn sink rejected {kind:?} group {group} item {item}")]
    SpawnFailed { kind: AssetKind, group: usize, item: usize },
    #[error("no instances to convert")]
    NothingToConvert,
}

/// Outcome of one public operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Placements the sinks accepted
    pub placed: usize,
    /// Cells that were computed but not placed
    pub skipped: usize,
    pub errors: Vec<ArenaError>,
    pub warnings: Vec<ArenaError>,
}

impl BuildReport {
    pub fn error(&mut self, err: ArenaError) {
        log::error!("{err}");
        self.errors.push(err);
    }

    pub fn warn(&mut self, warning: ArenaError) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Fold a sub-report (one section) into this one
    pub fn merge(&mut self, other: BuildReport) {
        self.placed += other.placed;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
