//! The buildpack lifecycle engine.
//!
//! This crate orchestrates pluggable buildpacks into an image build: the
//! detect resolver selects a group of buildpacks and a consistent build plan,
//! the analyzer reconciles metadata from a previous image and cache with the
//! selected group, and the build pipeline executes the group in order while
//! aggregating its outputs.
//!
//! Image access, caches and buildpack subprocess invocation sit behind small
//! capability traits ([`ImageSource`], [`CacheSource`], [`BuildpackRunner`],
//! [`BuildpackStore`], [`Logger`]) so the engine itself never talks to a
//! registry, daemon or shell directly.

// Enable rustc and Clippy lints that are disabled by default.
// https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html#unused-crate-dependencies
#![warn(unused_crate_dependencies)]
// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
use indoc as _;

pub mod analyzer;
pub mod builder;
pub mod buildpack_store;
pub mod cache;
pub mod detector;
pub mod env;
pub mod errors;
pub mod exit_code;
pub mod files;
pub mod image;
pub mod log;
pub mod runner;

pub use errors::Error;

use lifecycle_data::api::ApiVersion;
use lifecycle_data::buildpack::BuildpackDescriptor;

/// The buildpack API versions this engine recognizes. Behavior differences
/// between them are gated explicitly in the resolver, the runner and the
/// build pipeline.
pub const SUPPORTED_BUILDPACK_APIS: [ApiVersion; 5] = [
    ApiVersion::new(0, 2),
    ApiVersion::new(0, 3),
    ApiVersion::new(0, 4),
    ApiVersion::new(0, 5),
    ApiVersion::new(0, 6),
];

/// Rejects descriptors whose buildpack API the engine does not speak.
pub fn verify_buildpack_api(descriptor: &BuildpackDescriptor) -> Result<(), Error> {
    if SUPPORTED_BUILDPACK_APIS.contains(&descriptor.api) {
        Ok(())
    } else {
        Err(Error::UnsupportedBuildpackApi {
            buildpack: format!(
                "{}@{}",
                descriptor.buildpack.id, descriptor.buildpack.version
            ),
            api: descriptor.api.to_string(),
        })
    }
}
