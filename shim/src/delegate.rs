//! Child process execution for the cached tool.
//!
//! The child shares the launcher's standard streams and receives the
//! launcher's arguments verbatim, so it behaves as if the user had invoked it
//! directly. Its exit code becomes the launcher's exit code.

use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Errors arising while running the cached tool.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The process could not be started.
    #[error("failed to start {path}: {source}")]
    Spawn {
        /// The executable that failed to start.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process ended without an exit code.
    #[error("{path} {description}")]
    Terminated {
        /// The executable that was running.
        path: Utf8PathBuf,
        /// How the process ended, e.g. `terminated by signal 9`.
        description: String,
    },
}

/// Abstraction for running the delegated process.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Runs `program` with `args` to completion.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or waiting.
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ExitStatus>;
}

/// Runs processes on the host with inherited standard streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ExitStatus> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
    }
}

/// Runs `binary` with `args` and returns its exit code.
///
/// # Errors
///
/// Returns [`ExecutionError::Spawn`] if the process cannot be started and
/// [`ExecutionError::Terminated`] if it ends without an exit code.
pub fn execute(
    runner: &dyn ProcessRunner,
    binary: &Utf8Path,
    args: &[OsString],
) -> Result<i32, ExecutionError> {
    log::debug!("delegating to {binary} with {} argument(s)", args.len());
    let status = runner
        .run(binary.as_std_path(), args)
        .map_err(|source| ExecutionError::Spawn {
            path: binary.to_owned(),
            source,
        })?;

    status.code().ok_or_else(|| ExecutionError::Terminated {
        path: binary.to_owned(),
        description: describe_abnormal_exit(status),
    })
}

#[cfg(unix)]
fn describe_abnormal_exit(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => format!("exited abnormally ({status})"),
    }
}

#[cfg(not(unix))]
fn describe_abnormal_exit(status: ExitStatus) -> String {
    format!("exited abnormally ({status})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::exit_status;
    use mockall::predicate::{always, eq};
    use rstest::rstest;

    #[rstest]
    #[case::success(0)]
    #[case::failure(1)]
    #[case::usage(2)]
    #[case::custom(42)]
    #[case::max(255)]
    fn execute_returns_child_exit_code(#[case] code: i32) {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(move |_, _| Ok(exit_status(code)));

        let result = execute(&runner, Utf8Path::new("/cache/minimal-1.0.0"), &[]);
        assert_eq!(result.expect("child ran"), code);
    }

    #[test]
    fn execute_forwards_arguments_verbatim() {
        let args = vec![
            OsString::from("build"),
            OsString::from("--flag=value with spaces"),
            OsString::from(""),
        ];
        let expected = args.clone();
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .with(eq(Path::new("/cache/minimal-1.0.0")), always())
            .times(1)
            .returning(move |_, received| {
                assert_eq!(received, expected.as_slice());
                Ok(exit_status(0))
            });

        execute(&runner, Utf8Path::new("/cache/minimal-1.0.0"), &args).expect("child ran");
    }

    #[test]
    fn spawn_failure_is_an_execution_error() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(1).returning(|_, _| {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ))
        });

        let err = execute(&runner, Utf8Path::new("/cache/minimal-1.0.0"), &[])
            .expect_err("expected failure");
        assert!(matches!(err, ExecutionError::Spawn { .. }), "unexpected error: {err}");
        assert!(err.to_string().contains("/cache/minimal-1.0.0"));
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_is_an_execution_error() {
        use std::os::unix::process::ExitStatusExt;

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_, _| Ok(ExitStatus::from_raw(9)));

        let err = execute(&runner, Utf8Path::new("/cache/minimal-1.0.0"), &[])
            .expect_err("expected failure");
        assert!(
            matches!(err, ExecutionError::Terminated { ref description, .. }
                if description.contains("signal 9")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn missing_binary_fails_to_spawn() {
        let err = execute(
            &SystemProcessRunner,
            Utf8Path::new("/nonexistent/minimal-0.0.0"),
            &[],
        )
        .expect_err("expected failure");
        assert!(matches!(err, ExecutionError::Spawn { .. }), "unexpected error: {err}");
    }
}
