use serde::{Deserialize, Serialize};
use toml::value::Table;

/// The document a buildpack's detect executable writes to its plan path.
///
/// The top-level `provides`/`requires` are the primary plan sections; each
/// entry of `or` is a full alternative the buildpack would also accept.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DetectPlan {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<Provide>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Require>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<PlanSections>,
}

impl DetectPlan {
    /// The primary plan sections, without the `or` alternatives.
    pub fn sections(&self) -> PlanSections {
        PlanSections {
            provides: self.provides.clone(),
            requires: self.requires.clone(),
        }
    }
}

/// One set of provides/requires emitted during detect.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PlanSections {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<Provide>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Require>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Provide {
    pub name: String,
}

impl Provide {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A dependency requirement emitted during detect.
///
/// A requirement carries two version slots: the deprecated top-level
/// `version` and `metadata.version`. At most one slot is authoritative at a
/// time; the conversions below normalize between them when a requirement
/// crosses an API-version boundary, and the predicates report the states the
/// gates reject.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Require {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Table::is_empty")]
    pub metadata: Table,
}

impl Require {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            metadata: Table::new(),
        }
    }

    /// Moves a top-level `version` into `metadata.version`.
    pub fn convert_version_to_metadata(&mut self) {
        if let Some(version) = self.version.take() {
            self.metadata
                .insert(String::from("version"), toml::Value::String(version));
        }
    }

    /// Copies `metadata.version` into the top-level `version` slot.
    pub fn convert_metadata_to_version(&mut self) {
        if let Some(version) = self.metadata_version() {
            self.version = Some(version);
        }
    }

    /// `metadata.version` rendered as a string, regardless of its TOML type.
    pub fn metadata_version(&self) -> Option<String> {
        self.metadata.get("version").map(|value| match value {
            toml::Value::String(string) => string.clone(),
            other => other.to_string(),
        })
    }

    pub fn has_doubly_specified_versions(&self) -> bool {
        self.metadata.contains_key("version") && self.version.is_some()
    }

    pub fn has_inconsistent_versions(&self) -> bool {
        match (&self.version, self.metadata_version()) {
            (Some(version), Some(metadata_version)) => *version != metadata_version,
            _ => false,
        }
    }

    pub fn has_top_level_version(&self) -> bool {
        self.version.is_some()
    }
}

impl<S: Into<String>> From<S> for Require {
    fn from(s: S) -> Self {
        Self::new(s)
    }
}
