use crate::build_plan::Require;
use crate::group::GroupEntry;
use serde::{Deserialize, Serialize};

/// One bill-of-materials record: a requirement tagged with the buildpack
/// that emitted it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BomEntry {
    #[serde(flatten)]
    pub require: Require,
    pub buildpack: GroupEntry,
}

/// Tags untagged BOM requirements with the given buildpack, stripping the
/// fields that are noise in a BOM tag.
pub fn with_buildpack(buildpack: &GroupEntry, bom: Vec<Require>) -> Vec<BomEntry> {
    bom.into_iter()
        .map(|require| BomEntry {
            require,
            buildpack: buildpack.clone().no_api().no_homepage(),
        })
        .collect()
}
