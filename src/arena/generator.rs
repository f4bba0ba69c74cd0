//! Generator object: the public operations a host calls
//!
//! Owns the configuration, the sinks and the pass state. Every operation is a
//! plain synchronous call that returns a [`BuildReport`]; nothing here panics
//! or returns `Err` for bad configuration.

use super::config::{AssetKind, Catalog, SectionBuildRules};
use super::params::{ArenaParameters, BuildOrderPolicy, BuildTargets, Limits, calculate_section_parameters};
use super::report::{ArenaError, BuildReport};
use super::section::{SectionEnv, build_section};
use super::state::BuildContext;
use crate::settings::ArenaConfig;
use crate::sink::{InstanceSink, ObjectHandle, SpawnKind, SpawnSink};

pub struct ArenaGenerator<S: InstanceSink + SpawnSink> {
    config: ArenaConfig,
    sink: S,
    /// Geometry of the most recently derived section
    params: Option<ArenaParameters>,
    context: BuildContext,
    /// Standalone copies made by the last bake
    baked: Vec<ObjectHandle>,
}

impl<S: InstanceSink + SpawnSink> ArenaGenerator<S> {
    pub fn new(config: ArenaConfig, sink: S) -> Self {
        let context = BuildContext::new(config.settings.seed);
        Self {
            config,
            sink,
            params: None,
            context,
            baked: Vec::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Edits take effect on the next pass
    pub fn config_mut(&mut self) -> &mut ArenaConfig {
        &mut self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Last derived geometry, for debugging
    pub fn params(&self) -> Option<&ArenaParameters> {
        self.params.as_ref()
    }

    /// Pass state, for debugging
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn total_instances(&self) -> usize {
        self.context.total_instances
    }

    fn limits(&self) -> Limits {
        Limits::from(&self.config.settings)
    }

    /// Wipe, then build every configured section in order
    pub fn generate_arena(&mut self) -> BuildReport {
        self.wipe_arena();
        log::info!(
            "Generating arena: {} sections, seed {}",
            self.config.sections.len(),
            self.config.settings.seed
        );
        let report = self.build_sections();
        log::info!(
            "Arena generated: {} placements ({} skipped, {} errors, {} warnings)",
            self.context.total_instances,
            report.skipped,
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Remove everything emitted and restart the pass state
    pub fn wipe_arena(&mut self) {
        self.sink.clear_all_instances();
        let destroyed = self.context.spawned_objects.len() + self.baked.len();
        for handle in self.context.spawned_objects.drain(..).chain(self.baked.drain(..)) {
            self.sink.destroy(handle);
        }
        self.context = BuildContext::new(self.config.settings.seed);
        self.params = None;
        log::debug!("Arena wiped ({destroyed} objects destroyed)");
    }

    /// Build every section on top of the current state (no wipe)
    pub fn build_sections(&mut self) -> BuildReport {
        let mut report = BuildReport::default();
        if self.config.sections.is_empty() {
            report.error(ArenaError::NoSections);
            return report;
        }

        let limits = self.limits();
        let catalog = Catalog::new(&self.config.mesh_groups, &self.config.actor_groups);

        for (index, section) in self.config.sections.iter().enumerate() {
            if section.rules.is_empty() {
                report.error(ArenaError::EmptySection { section: index });
                continue;
            }

            let params = match calculate_section_parameters(section.policy, &section.targets, &section.rules, &catalog, &limits)
            {
                Ok(params) => params,
                Err(ArenaError::EmptyMeshCatalog) => {
                    // No later section has meshes to place either
                    report.error(ArenaError::EmptyMeshCatalog);
                    break;
                }
                Err(err) => {
                    report.error(err);
                    continue;
                }
            };
            self.params = Some(params);

            let env = SectionEnv {
                catalog,
                params: &params,
                limits,
                placement: self.config.settings.origin_placement,
            };
            for rule in &section.rules {
                report.merge(build_section(&mut self.context, &env, rule, &mut self.sink));
            }
        }

        report
    }

    /// Build a single rule on top of the current state.
    ///
    /// Without cached geometry the first configured section's policy and
    /// targets are derived (defaults when there are no sections).
    pub fn build_section(&mut self, rule: &SectionBuildRules) -> BuildReport {
        let mut report = BuildReport::default();
        let limits = self.limits();
        let catalog = Catalog::new(&self.config.mesh_groups, &self.config.actor_groups);

        let params = match self.params {
            Some(params) => params,
            None => {
                let derived = match self.config.sections.first() {
                    Some(section) if !section.rules.is_empty() => {
                        calculate_section_parameters(section.policy, &section.targets, &section.rules, &catalog, &limits)
                    }
                    Some(section) => calculate_section_parameters(
                        section.policy,
                        &section.targets,
                        std::slice::from_ref(rule),
                        &catalog,
                        &limits,
                    ),
                    None => calculate_section_parameters(
                        BuildOrderPolicy::default(),
                        &BuildTargets::default(),
                        std::slice::from_ref(rule),
                        &catalog,
                        &limits,
                    ),
                };
                match derived {
                    Ok(params) => params,
                    Err(err) => {
                        report.error(err);
                        return report;
                    }
                }
            }
        };
        self.params = Some(params);

        let env = SectionEnv {
            catalog,
            params: &params,
            limits,
            placement: self.config.settings.origin_placement,
        };
        report.merge(build_section(&mut self.context, &env, rule, &mut self.sink));
        report
    }

    /// Re-emit every live instance as a standalone object in world space.
    ///
    /// The instances themselves stay; the copies are destroyed by the next wipe.
    pub fn convert_to_static_mesh_actors(&mut self) -> BuildReport {
        let mut report = BuildReport::default();
        let instances = self.sink.instances();
        if instances.is_empty() {
            report.warn(ArenaError::NothingToConvert);
            return report;
        }

        let location = self.config.settings.location;
        for record in instances {
            let group = record.transform.group;
            let kind = SpawnKind::StaticMesh {
                group,
                mesh_index: record.mesh_index,
            };
            match self.sink.spawn(kind, &record.transform.translated(location)) {
                Some(handle) => {
                    self.baked.push(handle);
                    report.placed += 1;
                }
                None => {
                    report.error(ArenaError::SpawnFailed {
                        kind: AssetKind::StaticMeshes,
                        group,
                        item: record.mesh_index,
                    });
                    report.skipped += 1;
                }
            }
        }

        log::info!("Converted {} instances to standalone meshes", report.placed);
        report
    }
}
