//! The build pipeline: sequential execution of a resolved group.

use crate::buildpack_store::BuildpackStore;
use crate::env::BuildEnv;
use crate::errors::Error;
use crate::log::Logger;
use crate::runner::{BuildConfig, BuildpackRunner};
use crate::verify_buildpack_api;
use lifecycle_data::api::ApiVersion;
use lifecycle_data::bom::BomEntry;
use lifecycle_data::buildpack_plan::BuildpackPlan;
use lifecycle_data::group::{BuildpackGroup, GroupEntry};
use lifecycle_data::launch::{Label, Process, ProcessType, Slice};
use lifecycle_data::plan::BuildPlan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Everything the build phase produced, aggregated across the group.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BuildMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<BomEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<GroupEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<Process>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slices: Vec<Slice>,
}

/// Runs a resolved group in order against a build plan.
///
/// Build execution is strictly sequential: each buildpack's environment
/// mutations and met requirements are inputs of the next one.
pub struct Builder<'a> {
    pub app_dir: PathBuf,
    pub layers_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub platform_api: ApiVersion,
    pub env: BuildEnv,
    pub group: BuildpackGroup,
    pub plan: BuildPlan,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub store: &'a dyn BuildpackStore,
    pub runner: &'a dyn BuildpackRunner,
    pub logger: &'a dyn Logger,
}

impl Builder<'_> {
    pub fn build(&mut self) -> Result<BuildMetadata, Error> {
        let group_members = self.group.group.clone();
        let mut plan = self.plan.clone();

        let mut bom = Vec::new();
        let mut labels = Vec::new();
        let mut slices = Vec::new();
        // Keyed by process type: a later buildpack re-declaring a type wins,
        // and listing the map yields a deterministic, type-sorted order.
        let mut processes: BTreeMap<ProcessType, Process> = BTreeMap::new();

        for entry in &group_members {
            self.logger.debug(&format!("---> {entry}"));

            let descriptor = self.store.lookup(&entry.id, &entry.version)?;
            verify_buildpack_api(&descriptor)?;

            let mut buildpack_plan = plan.find(&entry.id);
            normalize_plan_in(&mut buildpack_plan, descriptor.api)?;

            let mut config = BuildConfig {
                app_dir: self.app_dir.clone(),
                layers_dir: self.layers_dir.clone(),
                platform_dir: self.platform_dir.clone(),
                env: &mut self.env,
                out: &mut *self.out,
                err: &mut *self.err,
            };
            let result = self.runner.run_build(&descriptor, buildpack_plan, &mut config)?;

            bom.extend(result.bom);
            labels.extend(result.labels);
            plan = plan.filter(&result.met_requires);
            for process in result.processes {
                processes.insert(process.r#type.clone(), process);
            }
            slices.extend(result.slices);
        }

        if self.platform_api < ApiVersion::new(0, 4) {
            for bom_entry in &mut bom {
                bom_entry.require.convert_metadata_to_version();
            }
        }

        Ok(BuildMetadata {
            bom,
            buildpacks: group_members,
            labels,
            processes: processes.into_values().collect(),
            slices,
        })
    }
}

/// Normalizes the version slots of a plan slice before it is handed to a
/// buildpack speaking an API before 0.3: the top-level slot moves into
/// `metadata.version`, and conflicting values in both slots are rejected.
fn normalize_plan_in(plan: &mut BuildpackPlan, api: ApiVersion) -> Result<(), Error> {
    if api >= ApiVersion::new(0, 3) {
        return Ok(());
    }

    for require in &mut plan.entries {
        if require.has_inconsistent_versions() {
            return Err(Error::Validation(format!(
                "plan entry '{}' has a top-level version that does not match its metadata version",
                require.name
            )));
        }
        require.convert_version_to_metadata();
    }

    Ok(())
}
