//! Exit code constants for the lifecycle phases.
//!
//! These are a stable surface: platforms inspect them to distinguish "no
//! group detected" from genuine failures.

pub const CODE_SUCCESS: i32 = 0;

/// No buildpack group passed detection.
pub const CODE_FAILED_DETECT: i32 = 100;
/// Detection failed and at least one required buildpack errored.
pub const CODE_FAILED_DETECT_WITH_ERRORS: i32 = 101;
/// Detection could not run to completion.
pub const CODE_DETECT_ERROR: i32 = 102;

/// A buildpack or the pipeline failed during the build phase.
pub const CODE_BUILD_ERROR: i32 = 104;

/// Invalid arguments were passed to a phase.
pub const CODE_INVALID_ARGS: i32 = 110;

/// Exit code of a detect executable that passed.
pub const CODE_DETECT_PASS: i32 = 0;
/// Exit code of a detect executable that opted out cleanly.
pub const CODE_DETECT_FAIL: i32 = 100;
