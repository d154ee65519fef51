use crate::build_plan::Require;
use crate::buildpack::BuildpackId;
use crate::buildpack_plan::BuildpackPlan;
use crate::group::GroupEntry;
use serde::{Deserialize, Serialize};

/// The resolved build plan produced by detection: one entry per satisfied
/// dependency name, with the buildpacks that provide it and the requirements
/// it satisfies. This is also the shape of the `plan.toml` exchange artifact
/// at the layers root.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BuildPlan {
    #[serde(default)]
    pub entries: Vec<BuildPlanEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BuildPlanEntry {
    #[serde(default)]
    pub providers: Vec<GroupEntry>,
    #[serde(default)]
    pub requires: Vec<Require>,
}

impl BuildPlanEntry {
    #[must_use]
    pub fn no_opt(mut self) -> Self {
        self.providers = self
            .providers
            .into_iter()
            .map(GroupEntry::no_opt)
            .collect();
        self
    }
}

impl BuildPlan {
    /// Projects the plan slice for one buildpack: the requirements of every
    /// entry that lists the buildpack among its providers.
    pub fn find(&self, id: &BuildpackId) -> BuildpackPlan {
        let mut entries = Vec::new();
        for entry in &self.entries {
            if entry.providers.iter().any(|provider| provider.id == *id) {
                entries.extend(entry.requires.iter().cloned());
            }
        }
        BuildpackPlan { entries }
    }

    /// Removes every entry that contains a met requirement, so subsequent
    /// buildpacks only see what is still unmet.
    #[must_use]
    pub fn filter(&self, met_requires: &[String]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|entry| {
                    !entry
                        .requires
                        .iter()
                        .any(|require| met_requires.contains(&require.name))
                })
                .cloned()
                .collect(),
        }
    }
}
