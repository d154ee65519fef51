//! Data structures for the buildpack lifecycle exchange formats.
//!
//! Everything a lifecycle phase reads from or writes to disk lives here:
//! buildpack descriptors, order and group documents, detect plans, the
//! resolved build plan, buildpack plans, BOM entries, launch/build output
//! documents, layer metadata and the buildpack store.
//!
//! Unknown keys are ignored on every exchange document so that newer
//! buildpacks can add fields without breaking older lifecycles.

// Enable rustc and Clippy lints that are disabled by default.
// https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html#unused-crate-dependencies
#![warn(unused_crate_dependencies)]
// https://rust-lang.github.io/rust-clippy/stable/index.html
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

// Dev-dependencies used by tests only; referenced here to satisfy the
// unused_crate_dependencies lint in non-test builds.
#[cfg(test)]
use indoc as _;
#[cfg(test)]
use serde_json as _;

pub mod api;
pub mod bom;
pub mod build;
pub mod build_plan;
pub mod buildpack;
pub mod buildpack_plan;
pub mod group;
pub mod launch;
pub mod layer;
pub mod plan;
pub mod store;

mod newtypes;
