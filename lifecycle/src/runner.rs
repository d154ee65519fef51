//! Invocation of buildpack detect and build executables.

use crate::env::{ActionType, BuildEnv, Env};
use crate::errors::Error;
use crate::exit_code;
use lifecycle_common::toml_file::{read_optional_toml_file, read_toml_file, write_toml_file};
use lifecycle_data::api::ApiVersion;
use lifecycle_data::bom::{with_buildpack, BomEntry};
use lifecycle_data::build::BuildToml;
use lifecycle_data::build_plan::{DetectPlan, Require};
use lifecycle_data::buildpack::BuildpackDescriptor;
use lifecycle_data::buildpack_plan::BuildpackPlan;
use lifecycle_data::group::GroupEntry;
use lifecycle_data::launch::{Label, LaunchToml, Process, Slice};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const ENV_BUILDPACK_DIR: &str = "CNB_BUILDPACK_DIR";
pub const ENV_PLATFORM_DIR: &str = "CNB_PLATFORM_DIR";
pub const ENV_BUILD_PLAN_PATH: &str = "CNB_BUILD_PLAN_PATH";

/// Everything a detect invocation needs besides the buildpack itself.
pub struct DetectConfig {
    pub app_dir: PathBuf,
    pub platform_dir: PathBuf,
    /// Environment for regular buildpacks: the process environment with the
    /// platform's `env/` directory applied.
    pub full_env: Env,
    /// Environment for `clear-env` buildpacks: the bare process environment.
    pub clear_env: Env,
}

/// The outcome of one buildpack's detect executable.
///
/// Exit code 0 is a pass, 100 a clean opt-out, anything else an error. Plan
/// parse failures and spawn failures are folded into `code`/`err` rather
/// than propagated, so that an optional buildpack's failure stays
/// recoverable.
#[derive(Clone, Debug, Default)]
pub struct DetectRun {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
    pub plan: DetectPlan,
    pub err: Option<String>,
}

/// Everything a build invocation needs besides the buildpack and its plan.
pub struct BuildConfig<'a> {
    pub app_dir: PathBuf,
    pub layers_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub env: &'a mut BuildEnv,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

/// The aggregated outputs of one buildpack's build, after schema-version
/// dispatch.
#[derive(Clone, Debug, Default)]
pub struct BuildResult {
    pub bom: Vec<BomEntry>,
    pub labels: Vec<Label>,
    pub met_requires: Vec<String>,
    pub processes: Vec<Process>,
    pub slices: Vec<Slice>,
}

/// Invocation of a single buildpack's executables. The subprocess mechanism
/// is behind this trait so the resolver and pipeline can be exercised with
/// scripted runs.
pub trait BuildpackRunner {
    fn run_detect(&self, descriptor: &BuildpackDescriptor, config: &DetectConfig) -> DetectRun;

    fn run_build(
        &self,
        descriptor: &BuildpackDescriptor,
        plan: BuildpackPlan,
        config: &mut BuildConfig<'_>,
    ) -> Result<BuildResult, Error>;
}

/// Runs buildpack executables as child processes.
pub struct ProcessRunner;

impl BuildpackRunner for ProcessRunner {
    fn run_detect(&self, descriptor: &BuildpackDescriptor, config: &DetectConfig) -> DetectRun {
        let plan_dir = match scratch_dir(descriptor) {
            Ok(plan_dir) => plan_dir,
            Err(io_error) => return DetectRun::failed(io_error.to_string()),
        };
        let plan_path = plan_dir.path().join("plan.toml");

        let mut command = Command::new(descriptor.dir.join("bin").join("detect"));
        command
            .arg(&config.platform_dir)
            .arg(&plan_path)
            .current_dir(&config.app_dir)
            .env_clear()
            .envs(if descriptor.buildpack.clear_env {
                &config.clear_env
            } else {
                &config.full_env
            })
            .env(ENV_BUILDPACK_DIR, &descriptor.dir)
            .env(ENV_PLATFORM_DIR, &config.platform_dir)
            .env(ENV_BUILD_PLAN_PATH, &plan_path);

        let output = match command.output() {
            Ok(output) => output,
            Err(io_error) => return DetectRun::failed(io_error.to_string()),
        };

        let mut run = DetectRun {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            plan: DetectPlan::default(),
            err: None,
        };

        if run.code == exit_code::CODE_DETECT_PASS {
            match read_optional_toml_file::<DetectPlan>(&plan_path) {
                Ok(plan) => run.plan = plan,
                Err(toml_error) => {
                    run.code = -1;
                    run.err = Some(toml_error.to_string());
                    return run;
                }
            }

            if let Err(message) = normalize_detect_plan(&mut run.plan, descriptor) {
                run.code = -1;
                run.err = Some(message);
            }
        }

        run
    }

    fn run_build(
        &self,
        descriptor: &BuildpackDescriptor,
        plan: BuildpackPlan,
        config: &mut BuildConfig<'_>,
    ) -> Result<BuildResult, Error> {
        let buildpack = format!(
            "{}@{}",
            descriptor.buildpack.id, descriptor.buildpack.version
        );
        let dir_name = descriptor.buildpack.id.directory_name();

        let bp_layers_dir = config.layers_dir.join(&dir_name);
        fs::create_dir_all(&bp_layers_dir)?;

        // The plan the buildpack reads is written to a scratch directory that
        // lives exactly as long as this invocation.
        let plan_dir = scratch_dir(descriptor)?;
        let bp_plan_path = plan_dir.path().join(&dir_name).join("plan.toml");
        write_toml_file(&plan, &bp_plan_path)?;

        let env = if descriptor.buildpack.clear_env {
            config.env.list()
        } else {
            config.env.with_platform(&config.platform_dir)?
        };

        let output = Command::new(descriptor.dir.join("bin").join("build"))
            .arg(&bp_layers_dir)
            .arg(&config.platform_dir)
            .arg(&bp_plan_path)
            .current_dir(&config.app_dir)
            .env_clear()
            .envs(&env)
            .env(ENV_BUILDPACK_DIR, &descriptor.dir)
            .env(ENV_PLATFORM_DIR, &config.platform_dir)
            .output()
            .map_err(|source| Error::BuildpackInvocation {
                buildpack: buildpack.clone(),
                source,
            })?;

        config.out.write_all(&output.stdout)?;
        config.err.write_all(&output.stderr)?;

        if !output.status.success() {
            return Err(Error::Buildpack {
                buildpack,
                code: output.status.code().unwrap_or(-1),
            });
        }

        setup_env(config.env, &bp_layers_dir, descriptor.api)?;

        read_build_outputs(descriptor, &bp_layers_dir, &bp_plan_path, &plan)
    }
}

impl DetectRun {
    fn failed(err: String) -> Self {
        Self {
            code: -1,
            err: Some(err),
            ..Self::default()
        }
    }
}

fn scratch_dir(descriptor: &BuildpackDescriptor) -> io::Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(&format!(
            "{}-",
            descriptor.buildpack.id.directory_name()
        ))
        .tempdir()
}

/// Applies the version-slot rules to a freshly read detect plan.
///
/// Buildpacks speaking an API before 0.3 may carry versions in the top-level
/// slot; those are moved into `metadata.version` so exactly one slot stays
/// authoritative. Populating both slots is rejected. Later APIs pass the
/// top-level slot through untouched.
fn normalize_detect_plan(
    plan: &mut DetectPlan,
    descriptor: &BuildpackDescriptor,
) -> Result<(), String> {
    if descriptor.api >= ApiVersion::new(0, 3) {
        return Ok(());
    }

    let buildpack = &descriptor.buildpack.id;
    let requires = plan
        .requires
        .iter_mut()
        .chain(plan.or.iter_mut().flat_map(|sections| sections.requires.iter_mut()));

    for require in requires {
        if require.has_doubly_specified_versions() {
            return Err(format!(
                "buildpack '{buildpack}' has a top-level version and a metadata version for requirement '{}'",
                require.name
            ));
        }
        require.convert_version_to_metadata();
    }

    Ok(())
}

/// Adds every layer of `bp_layers_dir` that declares `build = true` to the
/// shared build environment: root directories first, then the layers' `env/`
/// and `env.build/` directories, in lexical layer-name order.
fn setup_env(build_env: &mut BuildEnv, bp_layers_dir: &Path, api: ApiVersion) -> Result<(), Error> {
    let layer_dirs = build_layer_dirs(bp_layers_dir)?;

    for layer_dir in &layer_dirs {
        build_env.add_root_dir(layer_dir)?;
    }

    for layer_dir in &layer_dirs {
        let default_action = ActionType::default_for(api);
        build_env.add_env_dir(&layer_dir.join("env"), default_action)?;
        build_env.add_env_dir(&layer_dir.join("env.build"), default_action)?;
    }

    Ok(())
}

fn build_layer_dirs(bp_layers_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = match fs::read_dir(bp_layers_dir) {
        Ok(entries) => entries,
        Err(io_error) if io_error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(io_error) => return Err(io_error.into()),
    };

    let mut layer_dirs = Vec::new();
    for dir_entry in entries {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_dir() {
            continue;
        }

        let mut descriptor_name = dir_entry.file_name();
        descriptor_name.push(".toml");
        if is_build_layer(&bp_layers_dir.join(descriptor_name)) {
            layer_dirs.push(dir_entry.path());
        }
    }

    layer_dirs.sort();
    Ok(layer_dirs)
}

fn is_build_layer(descriptor_path: &Path) -> bool {
    read_toml_file::<lifecycle_data::layer::LayerMetadataFile>(descriptor_path)
        .map(|file| file.build)
        .unwrap_or(false)
}

/// Reads a buildpack's outputs after a successful build, dispatching on its
/// API version.
///
/// Before API 0.5 the buildpack communicates met requirements by trimming
/// the plan file it was handed, and that file doubles as its BOM. From 0.5
/// on, `build.toml` declares unmet requirements and the BOM comes from
/// `launch.toml`, with top-level versions rejected.
fn read_build_outputs(
    descriptor: &BuildpackDescriptor,
    bp_layers_dir: &Path,
    bp_plan_path: &Path,
    plan_in: &BuildpackPlan,
) -> Result<BuildResult, Error> {
    let tag = GroupEntry::new(
        descriptor.buildpack.id.clone(),
        descriptor.buildpack.version.clone(),
    );

    let mut result = BuildResult::default();
    let launch: LaunchToml = read_optional_toml_file(bp_layers_dir.join("launch.toml"))?;

    if descriptor.api < ApiVersion::new(0, 5) {
        let plan_out: BuildpackPlan = read_toml_file(bp_plan_path)?;
        validate_bom(&plan_out.entries, descriptor.api)?;

        let mut bom_requires = plan_out.entries.clone();
        for require in &mut bom_requires {
            require.convert_version_to_metadata();
        }
        result.bom = with_buildpack(&tag, bom_requires);
        result.met_requires = plan_out.names();
    } else {
        let build_toml: BuildToml = read_optional_toml_file(bp_layers_dir.join("build.toml"))?;
        validate_bom(&build_toml.bom, descriptor.api)?;
        validate_unmet(&build_toml.unmet, plan_in)?;
        result.met_requires = plan_in.filter(&build_toml.unmet).names();

        validate_bom(&launch.bom, descriptor.api)?;
        result.bom = with_buildpack(&tag, launch.bom.clone());
    }

    result.labels = launch.labels;
    result.slices = launch.slices;
    result.processes = launch.processes;
    for process in &mut result.processes {
        process.buildpack_id = Some(descriptor.buildpack.id.clone());
    }

    Ok(result)
}

fn validate_bom(bom: &[Require], api: ApiVersion) -> Result<(), Error> {
    if api < ApiVersion::new(0, 5) {
        for entry in bom {
            if entry.has_inconsistent_versions() {
                return Err(Error::Validation(format!(
                    "bom entry '{}' has a top-level version that does not match its metadata version",
                    entry.name
                )));
            }
        }
    } else {
        for entry in bom {
            if entry.has_top_level_version() {
                return Err(Error::Validation(format!(
                    "bom entry '{}' has a top-level version which is not allowed. The buildpack should instead set metadata.version",
                    entry.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_unmet(unmet: &[lifecycle_data::build::Unmet], plan: &BuildpackPlan) -> Result<(), Error> {
    for unmet_entry in unmet {
        if unmet_entry.name.is_empty() {
            return Err(Error::Validation(String::from("unmet.name is required")));
        }
        if !plan.entries.iter().any(|entry| entry.name == unmet_entry.name) {
            return Err(Error::Validation(format!(
                "unmet.name '{}' must match a requested dependency",
                unmet_entry.name
            )));
        }
    }

    Ok(())
}
