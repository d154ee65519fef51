use crate::exit_code;
use lifecycle_common::toml_file::TomlFileError;

/// Everything that can go wrong while orchestrating a build.
///
/// Variants are kinds, not call sites: the same kind maps to the same exit
/// code no matter which component produced it. Component-local recovery
/// (absent labels, optional buildpack failures) happens before an `Error` is
/// constructed; everything that reaches this type propagates to the phase
/// boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("no buildpacks participating")]
    FailedDetection,

    #[error("buildpack(s) failed with err")]
    FailedDetectionWithErrors,

    #[error("missing detection of '{0}'")]
    MissingDetectRun(String),

    #[error("buildpack order has a cycle involving '{0}'")]
    OrderCycle(String),

    #[error("buildpack '{buildpack}' declares unsupported buildpack API '{api}'")]
    UnsupportedBuildpackApi { buildpack: String, api: String },

    #[error("buildpack '{buildpack}' failed with exit code {code}")]
    Buildpack { buildpack: String, code: i32 },

    #[error("failed to invoke buildpack '{buildpack}': {source}")]
    BuildpackInvocation {
        buildpack: String,
        source: std::io::Error,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("image source error: {0}")]
    Image(String),

    #[error("cache source error: {0}")]
    Cache(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlFile(#[from] TomlFileError),
}

impl Error {
    /// The process exit code a phase terminating on this error reports.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgs(_) => exit_code::CODE_INVALID_ARGS,
            Error::FailedDetection => exit_code::CODE_FAILED_DETECT,
            Error::FailedDetectionWithErrors => exit_code::CODE_FAILED_DETECT_WITH_ERRORS,
            Error::MissingDetectRun(_)
            | Error::OrderCycle(_)
            | Error::UnsupportedBuildpackApi { .. } => exit_code::CODE_DETECT_ERROR,
            Error::Buildpack { .. }
            | Error::BuildpackInvocation { .. }
            | Error::Validation(_)
            | Error::Image(_)
            | Error::Cache(_)
            | Error::Io(_)
            | Error::TomlFile(_) => exit_code::CODE_BUILD_ERROR,
        }
    }
}
