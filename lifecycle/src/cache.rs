//! Access to a build cache.

use crate::errors::Error;
use lifecycle_data::layer::CacheMetadata;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A handle to a layer cache from a previous build.
///
/// Volume and image cache implementations live outside this crate; the
/// engine only reads metadata and asks for layer content to be materialized
/// into a destination directory.
pub trait CacheSource {
    fn name(&self) -> &str;

    /// The cache's layer metadata. An empty cache yields the default value.
    fn metadata(&self) -> Result<CacheMetadata, Error>;

    /// Materializes the content of the layer identified by `sha` into
    /// `dest`.
    fn restore_layer(&self, sha: &str, dest: &Path) -> Result<(), Error>;
}

/// In-memory cache for tests: layer content is a map of relative file paths
/// to contents.
#[derive(Default)]
pub struct FakeCache {
    pub name: String,
    pub metadata: CacheMetadata,
    pub layers: HashMap<String, Vec<(PathBuf, String)>>,
}

impl FakeCache {
    pub fn new(metadata: CacheMetadata) -> Self {
        Self {
            name: String::from("fake-cache"),
            metadata,
            layers: HashMap::new(),
        }
    }
}

impl CacheSource for FakeCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> Result<CacheMetadata, Error> {
        Ok(self.metadata.clone())
    }

    fn restore_layer(&self, sha: &str, dest: &Path) -> Result<(), Error> {
        let files = self
            .layers
            .get(sha)
            .ok_or_else(|| Error::Cache(format!("layer with SHA '{sha}' not found")))?;

        for (relative_path, contents) in files {
            let path = dest.join(relative_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
        }

        Ok(())
    }
}
