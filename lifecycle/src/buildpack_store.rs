//! Resolution of buildpack references to on-disk descriptors.

use crate::errors::Error;
use lifecycle_common::toml_file::read_toml_file;
use lifecycle_data::buildpack::{BuildpackDescriptor, BuildpackId};
use std::path::PathBuf;

/// Resolves a buildpack reference to its parsed descriptor.
pub trait BuildpackStore {
    fn lookup(&self, id: &BuildpackId, version: &str) -> Result<BuildpackDescriptor, Error>;
}

/// Buildpack store over the conventional on-disk layout:
/// `<dir>/<escaped id>/<version>/buildpack.toml`.
pub struct DirBuildpackStore {
    dir: PathBuf,
}

impl DirBuildpackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BuildpackStore for DirBuildpackStore {
    fn lookup(&self, id: &BuildpackId, version: &str) -> Result<BuildpackDescriptor, Error> {
        let buildpack_dir = self.dir.join(id.directory_name()).join(version);

        let mut descriptor: BuildpackDescriptor =
            read_toml_file(buildpack_dir.join("buildpack.toml"))?;
        descriptor.dir = buildpack_dir;

        Ok(descriptor)
    }
}
