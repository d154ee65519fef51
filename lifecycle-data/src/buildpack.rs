use crate::api::ApiVersion;
use crate::group::BuildpackGroup;
use crate::newtypes::lifecycle_newtype;
use serde::Deserialize;
use std::path::PathBuf;

lifecycle_newtype!(
    /// The ID of a buildpack.
    ///
    /// It MUST only contain numbers, letters, and the characters `.`, `/`, and `-`.
    /// It also MUST NOT be `config` or `app`.
    ///
    /// # Examples
    /// ```
    /// use lifecycle_data::buildpack::BuildpackId;
    ///
    /// let id: BuildpackId = "example/node".parse().unwrap();
    /// assert_eq!(id.directory_name(), "example_node");
    ///
    /// let invalid = "app".parse::<BuildpackId>();
    /// assert!(invalid.is_err());
    /// ```
    BuildpackId,
    BuildpackIdError,
    r"^(?!(app|config)$)[[:alnum:]./-]+$"
);

impl BuildpackId {
    /// The form of this ID used as a file system path component.
    ///
    /// Every `/` is replaced by `_`; all other characters pass through.
    pub fn directory_name(&self) -> String {
        self.replace('/', "_")
    }
}

/// A buildpack descriptor, parsed from a `buildpack.toml` file.
///
/// A descriptor with a non-empty `order` describes a meta-buildpack: it has
/// no executable behavior of its own and detection expands its nested order
/// inline into the surrounding group.
#[derive(Deserialize, Clone, Debug)]
pub struct BuildpackDescriptor {
    pub api: ApiVersion,
    pub buildpack: BuildpackInfo,
    #[serde(default)]
    pub order: Vec<BuildpackGroup>,
    /// The directory the descriptor was loaded from. Not part of the
    /// document itself; set by whoever resolved the buildpack on disk.
    #[serde(skip)]
    pub dir: PathBuf,
}

impl BuildpackDescriptor {
    pub fn is_meta(&self) -> bool {
        !self.order.is_empty()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct BuildpackInfo {
    pub id: BuildpackId,
    pub name: Option<String>,
    pub version: String,
    pub homepage: Option<String>,
    #[serde(default, rename = "clear-env")]
    pub clear_env: bool,
}
