//! The canonical exchange artifacts the phases leave in the layers
//! directory.

use crate::builder::BuildMetadata;
use crate::errors::Error;
use lifecycle_common::toml_file::{read_toml_file, write_toml_file};
use lifecycle_data::group::{BuildpackGroup, BuildpackOrder};
use lifecycle_data::layer::AnalyzedMetadata;
use lifecycle_data::plan::BuildPlan;
use std::path::{Path, PathBuf};

pub fn group_path(layers_dir: &Path) -> PathBuf {
    layers_dir.join("group.toml")
}

pub fn plan_path(layers_dir: &Path) -> PathBuf {
    layers_dir.join("plan.toml")
}

pub fn analyzed_path(layers_dir: &Path) -> PathBuf {
    layers_dir.join("analyzed.toml")
}

pub fn report_path(layers_dir: &Path) -> PathBuf {
    layers_dir.join("report.toml")
}

/// Reads an `order.toml` document into its list of candidate groups.
pub fn read_order(path: impl AsRef<Path>) -> Result<Vec<BuildpackGroup>, Error> {
    Ok(read_toml_file::<BuildpackOrder>(path)?.order)
}

pub fn read_group(path: impl AsRef<Path>) -> Result<BuildpackGroup, Error> {
    Ok(read_toml_file(path)?)
}

pub fn write_group(group: &BuildpackGroup, path: impl AsRef<Path>) -> Result<(), Error> {
    Ok(write_toml_file(group, path)?)
}

pub fn read_plan(path: impl AsRef<Path>) -> Result<BuildPlan, Error> {
    Ok(read_toml_file(path)?)
}

pub fn write_plan(plan: &BuildPlan, path: impl AsRef<Path>) -> Result<(), Error> {
    Ok(write_toml_file(plan, path)?)
}

pub fn read_analyzed(path: impl AsRef<Path>) -> Result<AnalyzedMetadata, Error> {
    Ok(read_toml_file(path)?)
}

pub fn write_analyzed(analyzed: &AnalyzedMetadata, path: impl AsRef<Path>) -> Result<(), Error> {
    Ok(write_toml_file(analyzed, path)?)
}

pub fn write_report(report: &BuildMetadata, path: impl AsRef<Path>) -> Result<(), Error> {
    Ok(write_toml_file(report, path)?)
}
