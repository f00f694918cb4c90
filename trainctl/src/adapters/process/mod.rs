// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::{CommandRunnerPort, ExecCapture};
use crate::app::types::CommandSpec;

/// Runs commands as local child processes and waits for each to exit.
#[derive(Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(command: &CommandSpec, err: std::io::Error) -> AppError {
    AppError::with_message(
        AppErrorKind::Internal,
        codes::SPAWN_FAILURE,
        format!("failed to run {}: {err}", command.program),
    )
}

#[async_trait]
impl CommandRunnerPort for ProcessRunner {
    #[tracing::instrument(name = "process", level = "debug", skip(self, command), fields(program = %command.program))]
    async fn run(&self, command: &CommandSpec) -> AppResult<ExecCapture> {
        if command.program.trim().is_empty() {
            return Err(AppError::with_message(
                AppErrorKind::InvalidArgument,
                codes::INVALID_ARGUMENT,
                "command has no program",
            ));
        }
        let stdin = if command.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| spawn_error(command, err))?;

        if let (Some(input), Some(mut pipe)) = (command.stdin.as_deref(), child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|err| spawn_error(command, err))?;
            // Dropping the pipe sends EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| spawn_error(command, err))?;
        // Killed by a signal: no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(exit_code, "process exited");
        Ok(ExecCapture {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_stderr() {
        let cmd = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo out; echo oops >&2; exit 3");
        let capture = ProcessRunner::new().run(&cmd).await.unwrap();
        assert_eq!(capture.exit_code, 3);
        assert!(!capture.success());
        assert_eq!(capture.stdout, b"out\n");
        assert_eq!(capture.stderr_text(), "oops");
    }

    #[tokio::test]
    async fn feeds_stdin_and_closes_it() {
        let cmd = CommandSpec::new("cat").stdin("pw\npw\n");
        let capture = ProcessRunner::new().run(&cmd).await.unwrap();
        assert!(capture.success());
        assert_eq!(capture.stdout, b"pw\npw\n");
    }

    #[tokio::test]
    async fn empty_program_is_rejected() {
        let err = ProcessRunner::new()
            .run(&CommandSpec::new(""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AppErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let cmd = CommandSpec::new("/nonexistent/trainctl-useradd");
        let err = ProcessRunner::new().run(&cmd).await.unwrap_err();
        assert_eq!(err.code(), codes::SPAWN_FAILURE);
        assert!(err.message().contains("/nonexistent/trainctl-useradd"));
    }
}
