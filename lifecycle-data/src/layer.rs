use crate::buildpack::BuildpackId;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toml::value::Table;

/// The on-disk `<layer>.toml` descriptor next to a layer directory.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LayerMetadataFile {
    #[serde(default)]
    pub launch: bool,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "Table::is_empty")]
    pub metadata: Table,
}

/// One layer's record inside image or cache metadata.
///
/// `sha` identifies the layer content; it is only present once the layer was
/// exported. `data` is the free-form metadata the owning buildpack stored in
/// the layer descriptor.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LayerMetadata {
    #[serde(default)]
    pub launch: bool,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Table>,
}

impl LayerMetadata {
    /// The on-disk descriptor equivalent of this record.
    pub fn to_file(&self) -> LayerMetadataFile {
        LayerMetadataFile {
            launch: self.launch,
            build: self.build,
            cache: self.cache,
            metadata: self.data.clone().unwrap_or_default(),
        }
    }
}

/// All layer metadata one buildpack contributed to an image or cache.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BuildpackLayersMetadata {
    #[serde(rename = "key")]
    pub id: BuildpackId,
    pub version: String,
    #[serde(default)]
    pub layers: BTreeMap<String, LayerMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
}

/// The layer-metadata label of a previously built image.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LayersMetadata {
    #[serde(default)]
    pub buildpacks: Vec<BuildpackLayersMetadata>,
}

impl LayersMetadata {
    pub fn metadata_for(&self, id: &BuildpackId) -> Option<&BuildpackLayersMetadata> {
        self.buildpacks.iter().find(|buildpack| buildpack.id == *id)
    }
}

/// Layer metadata stored alongside a build cache.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CacheMetadata {
    #[serde(default)]
    pub buildpacks: Vec<BuildpackLayersMetadata>,
}

impl CacheMetadata {
    pub fn metadata_for(&self, id: &BuildpackId) -> Option<&BuildpackLayersMetadata> {
        self.buildpacks.iter().find(|buildpack| buildpack.id == *id)
    }
}

/// The `analyzed.toml` exchange artifact.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalyzedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageIdentifier>,
    #[serde(default)]
    pub metadata: LayersMetadata,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageIdentifier {
    pub reference: String,
}
