// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use async_trait::async_trait;

use crate::app::errors::{AppError, AppResult};
use crate::app::ports::LocalFilesystemPort;

const NEW_FILE_MODE: u32 = 0o600;

#[derive(Clone, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalFilesystemPort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "read_to_string", path = %path.display()))]
    async fn read_to_string(&self, path: &Path) -> AppResult<String> {
        std::fs::read_to_string(path).map_err(|err| {
            AppError::local_error(format!("failed to read {}: {err}", path.display()))
        })
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, path, contents), fields(op = "append", path = %path.display()))]
    async fn append(&self, path: &Path, contents: &str) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(NEW_FILE_MODE)
            .open(path)
            .map_err(|err| {
                AppError::local_error(format!("failed to open {}: {err}", path.display()))
            })?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| {
                AppError::local_error(format!("failed to write {}: {err}", path.display()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn append_creates_private_file_and_preserves_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.txt");
        let fs = LocalFilesystem::new();

        fs.append(&path, "train000,abc\n").await.unwrap();
        fs.append(&path, "train001,def\n").await.unwrap();

        let contents = fs.read_to_string(&path).await.unwrap();
        assert_eq!(contents, "train000,abc\ntrain001,def\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, NEW_FILE_MODE);
    }

    #[tokio::test]
    async fn append_keeps_mode_of_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passwords.txt");
        std::fs::write(&path, "train000,first\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        LocalFilesystem::new()
            .append(&path, "train001,second\n")
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "train000,first\ntrain001,second\n"
        );
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn read_missing_file_is_local_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .read_to_string(&dir.path().join("id_rsa.pub"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::app::errors::codes::LOCAL_ERROR);
        assert!(err.message().contains("failed to read"));
    }

    #[tokio::test]
    async fn append_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = LocalFilesystem::new()
            .append(&dir.path().join("nope").join("passwords.txt"), "x\n")
            .await
            .unwrap_err();
        assert!(err.message().contains("failed to open"));
    }
}
