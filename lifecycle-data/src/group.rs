use crate::api::ApiVersion;
use crate::buildpack::BuildpackId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One buildpack reference inside a group.
///
/// `api` and `homepage` are carried for reporting only and are stripped from
/// the places where they would be noise (BOM buildpack tags, plan providers).
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct GroupEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub id: BuildpackId,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    pub version: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl GroupEntry {
    pub fn new(id: BuildpackId, version: impl Into<String>) -> Self {
        Self {
            api: None,
            homepage: None,
            id,
            optional: false,
            version: version.into(),
        }
    }

    #[must_use]
    pub fn no_opt(mut self) -> Self {
        self.optional = false;
        self
    }

    #[must_use]
    pub fn no_api(mut self) -> Self {
        self.api = None;
        self
    }

    #[must_use]
    pub fn no_homepage(mut self) -> Self {
        self.homepage = None;
        self
    }
}

impl Display for GroupEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// An ordered set of buildpacks that detects (and then builds) as a unit.
///
/// This is also the shape of the `group.toml` exchange artifact.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildpackGroup {
    #[serde(default)]
    pub group: Vec<GroupEntry>,
}

/// The `order.toml` document: an ordered list of candidate groups forming the
/// detect search space.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildpackOrder {
    #[serde(default)]
    pub order: Vec<BuildpackGroup>,
}
