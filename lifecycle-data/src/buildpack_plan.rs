use crate::build::Unmet;
use crate::build_plan::Require;
use serde::{Deserialize, Serialize};

/// The plan one buildpack sees during build: its slice of the resolved
/// build plan's requirements, written to the `plan.toml` the build
/// executable receives as its third argument.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<Require>,
}

impl BuildpackPlan {
    /// Removes entries the buildpack declared unmet.
    #[must_use]
    pub fn filter(&self, unmet: &[Unmet]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|entry| !unmet.iter().any(|u| u.name == entry.name))
                .cloned()
                .collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }
}
