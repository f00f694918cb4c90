// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::Path;

use async_trait::async_trait;

use crate::app::errors::AppResult;

#[async_trait]
/// Local filesystem boundary for the core.
/// Provides file reads and append-only writes with consistent errors.
pub trait LocalFilesystemPort: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> AppResult<String>;
    /// Appends `contents`, creating the file owner-readable only if missing.
    async fn append(&self, path: &Path, contents: &str) -> AppResult<()>;
}
