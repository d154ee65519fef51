use crate::build_plan::Require;
use crate::buildpack::BuildpackId;
use crate::newtypes::lifecycle_newtype;
use serde::{Deserialize, Serialize};

lifecycle_newtype!(
    /// A launch process type. It MUST only contain numbers, letters, and the
    /// characters `.`, `_`, and `-`.
    ///
    /// # Examples
    /// ```
    /// use lifecycle_data::launch::ProcessType;
    ///
    /// let valid = "web-Worker_9".parse::<ProcessType>();
    /// assert!(valid.is_ok());
    ///
    /// let invalid = "!nv4lid".parse::<ProcessType>();
    /// assert!(invalid.is_err());
    /// ```
    ProcessType,
    ProcessTypeError,
    r"^[[:alnum:]\._-]+$"
);

/// The `launch.toml` document a buildpack writes at the root of its layers
/// directory after a successful build.
///
/// BOM entries here are untagged requirements; the pipeline tags them with
/// the emitting buildpack when it aggregates the result.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LaunchToml {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<Require>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<Process>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slices: Vec<Slice>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Label {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Process {
    pub r#type: ProcessType,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default)]
    pub direct: bool,
    /// Set by the pipeline to the buildpack that declared the process; not
    /// part of the document a buildpack writes.
    #[serde(
        default,
        rename = "buildpack-id",
        skip_serializing_if = "Option::is_none"
    )]
    pub buildpack_id: Option<BuildpackId>,
}

impl Process {
    pub fn new(
        r#type: impl AsRef<str>,
        command: impl Into<String>,
    ) -> Result<Self, ProcessTypeError> {
        Ok(Self {
            r#type: r#type.as_ref().parse()?,
            command: command.into(),
            args: Vec::new(),
            direct: false,
            buildpack_id: None,
        })
    }
}

/// An app directory slice: paths exported as a dedicated image layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Slice {
    pub paths: Vec<String>,
}
