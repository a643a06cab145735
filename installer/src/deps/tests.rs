//! Tests for command execution and the registrar pre-flight check.

use super::*;
use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};

fn version_call(result: std::io::Result<Output>) -> StubExecutor {
    StubExecutor::new(vec![ExpectedCall {
        cmd: "conan",
        args: vec!["--version"],
        result,
    }])
}

#[test]
fn check_registrar_accepts_working_program() {
    let executor = version_call(Ok(success_output()));

    assert!(check_registrar(&executor, "conan").is_ok());
    executor.assert_finished();
}

#[test]
fn check_registrar_reports_failing_program() {
    let executor = version_call(Ok(failure_output("broken install")));

    let err = check_registrar(&executor, "conan").expect_err("failure expected");
    match err {
        InstallerError::RegistrarUnavailable { program, reason } => {
            assert_eq!(program, "conan");
            assert!(reason.contains("broken install"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn check_registrar_reports_missing_program() {
    let executor = version_call(Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "not found",
    )));

    let err = check_registrar(&executor, "conan").expect_err("failure expected");
    assert!(matches!(err, InstallerError::RegistrarUnavailable { .. }));
    assert!(err.to_string().contains("conan"));
}

#[test]
fn system_executor_reports_spawn_failure() {
    let result = SystemCommandExecutor.run("recipe-installer-no-such-program", &[]);
    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn echoing_run_captures_only_stderr() {
    let output = SystemCommandExecutor
        .run_echoing("sh", &["-c", "echo to-terminal; echo to-caller >&2; exit 3"])
        .expect("spawn sh");

    assert!(output.stdout.is_empty());
    assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "to-caller");
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn plain_run_captures_stdout() {
    let output = SystemCommandExecutor
        .run("sh", &["-c", "echo captured"])
        .expect("spawn sh");

    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "captured");
}
