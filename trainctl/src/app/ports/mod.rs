// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod account_db;
pub mod command_runner;
pub mod host_identity;
pub mod local_fs;
pub mod secret_generator;

pub use account_db::AccountDatabasePort;
pub use command_runner::{CommandRunnerPort, ExecCapture};
pub use host_identity::HostIdentityPort;
pub use local_fs::LocalFilesystemPort;
pub use secret_generator::SecretGeneratorPort;
