//! Process exit codes. Part of the CLI contract.

use coldstart_core::GridError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_TEST_FAILURE: i32 = 1; // Verdict failed
pub const EXIT_CONFIG_ERROR: i32 = 2; // Bad config, arguments or credentials
pub const EXIT_INFRA_ERROR: i32 = 3; // Grid or driver failure
pub const EXIT_IO_ERROR: i32 = 4; // Report or snapshot read/write failed

pub fn from_verdict(passed: bool) -> i32 {
    if passed {
        EXIT_SUCCESS
    } else {
        EXIT_TEST_FAILURE
    }
}

/// Exit code of the first `GridError` in the chain; config error otherwise.
pub fn from_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GridError>())
        .map(GridError::exit_code)
        .unwrap_or(EXIT_CONFIG_ERROR)
}
