use serde::{Deserialize, Serialize};
use toml::value::Table;

/// The `store.toml` document: free-form data a buildpack persists across
/// builds, restored into its layers directory before the build phase.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Store {
    #[serde(default)]
    pub metadata: Table,
}
