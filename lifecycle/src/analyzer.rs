//! Reconciliation of previous-image and cache metadata with the current
//! group.

use crate::cache::CacheSource;
use crate::errors::Error;
use crate::image::{ImageSource, LAYER_METADATA_LABEL};
use crate::log::Logger;
use lifecycle_common::toml_file::write_toml_file;
use lifecycle_data::api::ApiVersion;
use lifecycle_data::group::GroupEntry;
use lifecycle_data::layer::{AnalyzedMetadata, CacheMetadata, ImageIdentifier, LayersMetadata};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Prepares the layers directory from what a previous build left behind.
///
/// Reads the previous image's layer-metadata label and, for platform APIs
/// before 0.6, also reconciles cached layers so that buildpacks see the
/// metadata (and cached content) of their earlier layers. From platform API
/// 0.6 on, layer restoration is a standalone phase around [`Restorer`] and
/// analysis only records image identity and metadata.
pub struct Analyzer<'a> {
    pub buildpacks: Vec<GroupEntry>,
    pub layers_dir: PathBuf,
    pub skip_layers: bool,
    pub platform_api: ApiVersion,
    pub logger: &'a dyn Logger,
}

impl Analyzer<'_> {
    pub fn analyze(
        &self,
        image: &dyn ImageSource,
        cache: Option<&dyn CacheSource>,
    ) -> Result<AnalyzedMetadata, Error> {
        let image_identifier = self.image_identifier(image)?;
        let metadata = self.read_layers_metadata(image)?;

        if self.platform_api < ApiVersion::new(0, 6) {
            let restorer = Restorer {
                layers_dir: self.layers_dir.clone(),
                buildpacks: self.buildpacks.clone(),
                skip_layers: self.skip_layers,
                logger: self.logger,
            };

            let cache_metadata = restorer.cache_metadata(cache)?;
            restorer.restore_store_toml(&metadata)?;
            restorer.restore_layer_metadata(&metadata, &cache_metadata, cache)?;
        }

        Ok(AnalyzedMetadata {
            image: image_identifier,
            metadata,
        })
    }

    fn image_identifier(&self, image: &dyn ImageSource) -> Result<Option<ImageIdentifier>, Error> {
        if !image.found() {
            self.logger.info(&format!(
                "Previous image with name \"{}\" not found",
                image.name()
            ));
            return Ok(None);
        }

        let reference = image.identifier()?;
        self.logger.debug(&format!("Analyzing image \"{reference}\""));
        Ok(Some(ImageIdentifier { reference }))
    }

    /// The previous image's layer metadata. An absent or undecodable label
    /// yields empty metadata; a build must be able to proceed from any
    /// predecessor.
    fn read_layers_metadata(&self, image: &dyn ImageSource) -> Result<LayersMetadata, Error> {
        let Some(label) = image.label(LAYER_METADATA_LABEL)? else {
            return Ok(LayersMetadata::default());
        };

        match serde_json::from_str(&label) {
            Ok(metadata) => Ok(metadata),
            Err(decode_error) => {
                self.logger.warn(&format!(
                    "Ignoring undecodable metadata label of image \"{}\": {decode_error}",
                    image.name()
                ));
                Ok(LayersMetadata::default())
            }
        }
    }
}

/// The per-layer reconciliation rules shared by pre-0.6 analysis and the
/// standalone restore phase.
pub struct Restorer<'a> {
    pub layers_dir: PathBuf,
    pub buildpacks: Vec<GroupEntry>,
    pub skip_layers: bool,
    pub logger: &'a dyn Logger,
}

impl Restorer<'_> {
    pub fn cache_metadata(&self, cache: Option<&dyn CacheSource>) -> Result<CacheMetadata, Error> {
        match cache {
            Some(cache) => cache.metadata(),
            None => {
                self.logger
                    .debug("Not restoring cached layer data, no cache specified");
                Ok(CacheMetadata::default())
            }
        }
    }

    /// Rewrites each group buildpack's persisted `store.toml` from the
    /// previous image's metadata.
    pub fn restore_store_toml(&self, metadata: &LayersMetadata) -> Result<(), Error> {
        for buildpack in &self.buildpacks {
            let Some(buildpack_metadata) = metadata.metadata_for(&buildpack.id) else {
                continue;
            };
            if let Some(store) = &buildpack_metadata.store {
                write_toml_file(
                    store,
                    self.layers_dir
                        .join(buildpack.id.directory_name())
                        .join("store.toml"),
                )?;
            }
        }

        Ok(())
    }

    /// Decides, per layer of the current group's buildpacks, whether to
    /// restore content, restore metadata only, or drop it.
    ///
    /// Layers of the previous image that are not cached have only their
    /// metadata restored. Cached layers are restored with content when the
    /// previous image still references the same SHA; any other cached layer
    /// is stale and removed.
    pub fn restore_layer_metadata(
        &self,
        app_metadata: &LayersMetadata,
        cache_metadata: &CacheMetadata,
        cache: Option<&dyn CacheSource>,
    ) -> Result<(), Error> {
        if self.skip_layers {
            self.logger.info("Skipping buildpack layer analysis");
            return Ok(());
        }

        let empty = BTreeMap::new();

        for buildpack in &self.buildpacks {
            let buildpack_dir = self.layers_dir.join(buildpack.id.directory_name());

            let app_layers = app_metadata
                .metadata_for(&buildpack.id)
                .map_or(&empty, |metadata| &metadata.layers);
            let cache_layers = cache_metadata
                .metadata_for(&buildpack.id)
                .map_or(&empty, |metadata| &metadata.layers);

            for (name, layer) in app_layers {
                if layer.cache {
                    continue;
                }
                self.logger.debug(&format!(
                    "Restoring metadata for \"{}:{name}\" from app image",
                    buildpack.id
                ));
                write_toml_file(&layer.to_file(), buildpack_dir.join(format!("{name}.toml")))?;
            }

            for (name, cache_layer) in cache_layers {
                let reusable = cache_layer.cache
                    && app_layers
                        .get(name)
                        .is_some_and(|app_layer| app_layer.sha == cache_layer.sha);

                if reusable {
                    self.logger.debug(&format!(
                        "Restoring data for \"{}:{name}\" from cache",
                        buildpack.id
                    ));
                    write_toml_file(
                        &cache_layer.to_file(),
                        buildpack_dir.join(format!("{name}.toml")),
                    )?;
                    if let Some(cache) = cache {
                        cache.restore_layer(&cache_layer.sha, &buildpack_dir.join(name))?;
                    }
                } else {
                    self.logger.debug(&format!(
                        "Removing stale cached layer \"{}:{name}\"",
                        buildpack.id
                    ));
                    ignore_not_found(fs::remove_file(
                        buildpack_dir.join(format!("{name}.toml")),
                    ))?;
                    ignore_not_found(fs::remove_dir_all(buildpack_dir.join(name)))?;
                }
            }
        }

        Ok(())
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(io_error) if io_error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
