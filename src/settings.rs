//! Generator settings and arena configuration
//!
//! Everything the host hands the generator, as one serde document. Every field
//! has a default so partial JSON files load.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::config::{ActorGroupConfig, ArenaSection, MeshGroupConfig};
use crate::arena::params::ArenaOriginPlacement;
use crate::consts::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access arena config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid arena config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pass-wide generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Seed for the per-pass random stream
    pub seed: u64,

    // === Limits ===
    pub max_sides: u32,
    pub max_tiles_per_side_row: u32,
    pub max_grid_dimensions: u32,

    // === Placement ===
    /// Which point of the arena sits on the generator origin
    pub origin_placement: ArenaOriginPlacement,
    /// Generator world position (baked placements are offset by it)
    pub location: Vec3,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            seed: 0,

            max_sides: MAX_SIDES,
            max_tiles_per_side_row: MAX_TILES_PER_SIDE_ROW,
            max_grid_dimensions: MAX_GRID_DIMENSIONS,

            origin_placement: ArenaOriginPlacement::Center,
            location: Vec3::ZERO,
        }
    }
}

/// Complete arena description: settings, catalogs and sections
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub settings: GeneratorSettings,
    pub mesh_groups: Vec<MeshGroupConfig>,
    pub actor_groups: Vec<ActorGroupConfig>,
    /// Built in order; each derives its own geometry
    pub sections: Vec<ArenaSection>,
}

impl ArenaConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded arena config from {} ({} sections, {} mesh groups)",
            path.display(),
            config.sections.len(),
            config.mesh_groups.len()
        );
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()?)?;
        log::info!("Arena config saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::config::{SectionBuildRules, SectionType};
    use crate::arena::params::BuildOrderPolicy;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "settings": { "seed": 42 },
            "mesh_groups": [{ "group_meshes": [{ "mesh": "Floor" }] }],
            "sections": [{ "policy": "PolygonLeadByRadius", "rules": [{ "section_type": "Polygon", "repeat_count": 3 }] }]
        }"#;
        let config = ArenaConfig::from_json_str(json).unwrap();

        assert_eq!(config.settings.seed, 42);
        assert_eq!(config.settings.max_sides, MAX_SIDES);
        assert_eq!(config.settings.origin_placement, ArenaOriginPlacement::Center);
        assert_eq!(config.mesh_groups[0].mesh_dimensions, Vec3::splat(500.0));
        assert_eq!(config.mesh_groups[0].mesh_scale, Vec3::ONE);

        let section = &config.sections[0];
        assert_eq!(section.policy, BuildOrderPolicy::PolygonLeadByRadius);
        assert_eq!(section.targets.polygon_sides, 8);
        let rule = &section.rules[0];
        assert_eq!(rule.section_type, SectionType::Polygon);
        assert_eq!(rule.repeat_count, 3);
        assert_eq!(rule.offset_by_height_increment, 1.0);
        assert_eq!(rule.yaw_possibilities, 4);
    }

    #[test]
    fn test_empty_document() {
        let config = ArenaConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ArenaConfig::default());
    }

    #[test]
    fn test_invalid_json_reports() {
        let err = ArenaConfig::from_json_str("{ \"settings\": 3 }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("invalid arena config"));
    }

    #[test]
    fn test_json_survives_save_and_load() {
        let mut config = ArenaConfig::default();
        config.settings.seed = 7;
        config.sections.push(ArenaSection::new(
            BuildOrderPolicy::GridLeadsByRadius,
            Default::default(),
            vec![SectionBuildRules::grid(0)],
        ));

        let path = std::env::temp_dir().join(format!("arena-config-{}.json", std::process::id()));
        config.save(&path).unwrap();
        let loaded = ArenaConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ArenaConfig::load("/nonexistent/arena.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
