// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::CommandSpec;

#[derive(Debug, Clone)]
pub struct ExecCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecCapture {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[async_trait]
/// Local child-process boundary.
/// Runs one command to completion and captures its exit status and output.
/// A non-zero exit is returned as a capture, not an error; `Err` means the
/// process could not be started or waited on.
pub trait CommandRunnerPort: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> AppResult<ExecCapture>;
}
