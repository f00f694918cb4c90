// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use crate::app::errors::ProvisionError;
use crate::app::ports::{
    AccountDatabasePort, CommandRunnerPort, ExecCapture, LocalFilesystemPort, SecretGeneratorPort,
};
use crate::app::services::{commands, naming};
use crate::app::types::{
    BatchReport, CommandSpec, ProvisionSettings, ReferenceAccount, Role, TrainingUser,
    UserOutcome, UserReport,
};

#[derive(Clone)]
pub struct Provisioner {
    pub(crate) runner: Arc<dyn CommandRunnerPort>,
    pub(crate) accounts: Arc<dyn AccountDatabasePort>,
    pub(crate) local_fs: Arc<dyn LocalFilesystemPort>,
    pub(crate) secrets: Arc<dyn SecretGeneratorPort>,
    pub(crate) settings: ProvisionSettings,
    pub(crate) role: Role,
}

impl Provisioner {
    pub fn new(
        runner: Arc<dyn CommandRunnerPort>,
        accounts: Arc<dyn AccountDatabasePort>,
        local_fs: Arc<dyn LocalFilesystemPort>,
        secrets: Arc<dyn SecretGeneratorPort>,
        settings: ProvisionSettings,
        role: Role,
    ) -> Self {
        Self {
            runner,
            accounts,
            local_fs,
            secrets,
            settings,
            role,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn username(&self, index: u32) -> String {
        naming::username(&self.settings.username_prefix, index)
    }

    /// Creates the account for `index` unless its uid is already taken.
    ///
    /// Returns the new password, or `None` when the uid exists and nothing
    /// was done. Master hosts additionally get an SSH keypair and the
    /// notebook environment.
    #[tracing::instrument(name = "create_user", skip(self), fields(role = %self.role))]
    pub async fn create_user(
        &self,
        username: &str,
        index: u32,
    ) -> Result<Option<String>, ProvisionError> {
        let uid = naming::uid_for(self.settings.base_uid, index).ok_or(
            ProvisionError::InvalidIndex {
                index,
                base_uid: self.settings.base_uid,
            },
        )?;

        if let Some(existing) = self
            .accounts
            .user_by_uid(uid)
            .await
            .map_err(ProvisionError::AccountLookup)?
        {
            tracing::info!(
                uid = existing.uid,
                existing = %existing.name,
                "uid already registered, skipping"
            );
            return Ok(None);
        }

        let reference = self.reference_account().await?;
        tracing::debug!(
            reference = %reference.name,
            group = %reference.group,
            "resolved reference account"
        );
        let user = TrainingUser {
            username: username.to_string(),
            index,
            uid,
            group: reference.group.clone(),
            home_dir: naming::sibling_home_dir(&reference.home_dir, username),
            shell: self.settings.shell.clone(),
        };

        let capture = self
            .run_checked(&commands::useradd(&user, self.role))
            .await
            .map_err(|(exit_code, stderr)| ProvisionError::AccountCreationError {
                username: user.username.clone(),
                exit_code,
                stderr,
            })?;
        let stdout = String::from_utf8_lossy(&capture.stdout);
        tracing::debug!(stdout = %stdout.trim(), "useradd done");

        let secret = self.secrets.generate_secret();
        self.run_checked(&commands::passwd(&user.username, &secret))
            .await
            .map_err(|(exit_code, stderr)| ProvisionError::PasswordSetError {
                username: user.username.clone(),
                exit_code,
                stderr,
            })?;

        if self.role == Role::Master {
            self.issue_ssh_key(&user).await?;
            self.bootstrap_notebook(&user).await?;
        }

        tracing::info!(uid, home = %user.home_dir.display(), "account created");
        Ok(Some(secret))
    }

    /// Provisions indices `0..count` one after another.
    ///
    /// A failure is logged and recorded for its index only; later indices
    /// are still attempted.
    pub async fn provision_batch(&self, count: u32) -> BatchReport {
        let mut report = BatchReport::default();
        for index in 0..count {
            let username = self.username(index);
            let outcome = match self.provision_one(&username, index).await {
                Ok(true) => UserOutcome::Created,
                Ok(false) => UserOutcome::Skipped,
                Err(err) => {
                    tracing::error!(
                        username = %username,
                        index,
                        code = err.code(),
                        "provisioning failed: {err}"
                    );
                    UserOutcome::Failed {
                        code: err.code(),
                        message: err.to_string(),
                    }
                }
            };
            report.users.push(UserReport {
                index,
                username,
                outcome,
            });
        }
        tracing::info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "batch finished"
        );
        report
    }

    async fn provision_one(&self, username: &str, index: u32) -> Result<bool, ProvisionError> {
        let Some(secret) = self.create_user(username, index).await? else {
            return Ok(false);
        };
        self.local_fs
            .append(&self.settings.passwords_file, &format!("{username},{secret}\n"))
            .await
            .map_err(|source| ProvisionError::SecretWriteError {
                username: username.to_string(),
                source,
            })?;
        Ok(true)
    }

    async fn reference_account(&self) -> Result<ReferenceAccount, ProvisionError> {
        let name = &self.settings.reference_account;
        let not_found = || ProvisionError::ReferenceAccountNotFound { name: name.clone() };
        let record = self
            .accounts
            .user_by_name(name)
            .await
            .map_err(ProvisionError::AccountLookup)?
            .ok_or_else(not_found)?;
        let group = self
            .accounts
            .group_name(record.gid)
            .await
            .map_err(ProvisionError::AccountLookup)?
            .ok_or_else(not_found)?;
        Ok(ReferenceAccount {
            name: record.name,
            group,
            home_dir: record.home_dir,
        })
    }

    async fn issue_ssh_key(&self, user: &TrainingUser) -> Result<(), ProvisionError> {
        let keygen_error = |message: String| ProvisionError::KeyGenError {
            username: user.username.clone(),
            message,
        };
        for command in [commands::make_ssh_dir(user), commands::ssh_keygen(user)] {
            self.run_checked(&command)
                .await
                .map_err(|(exit_code, stderr)| {
                    keygen_error(format!("{} exited with {exit_code}: {stderr}", command.program))
                })?;
        }

        // Append, never rewrite: earlier entries stay in place even if this
        // runs twice for the same account.
        let public_key = self
            .local_fs
            .read_to_string(&user.public_key_path())
            .await
            .map_err(|err| keygen_error(err.with_context("public key").to_string()))?;
        let mut entry = public_key.trim_end().to_string();
        entry.push('\n');
        self.run_checked(&commands::authorize_key(user, &entry))
            .await
            .map_err(|(exit_code, stderr)| {
                keygen_error(format!(
                    "appending to authorized_keys exited with {exit_code}: {stderr}"
                ))
            })?;
        tracing::debug!(path = %user.authorized_keys_path().display(), "public key authorized");
        Ok(())
    }

    async fn bootstrap_notebook(&self, user: &TrainingUser) -> Result<(), ProvisionError> {
        for (step, command) in commands::notebook_bootstrap(user, &self.settings) {
            self.run_checked(&command)
                .await
                .map_err(|(exit_code, stderr)| ProvisionError::NotebookBootstrapError {
                    username: user.username.clone(),
                    step,
                    message: format!("exit {exit_code}: {stderr}"),
                })?;
            tracing::debug!(step, "notebook bootstrap step done");
        }
        Ok(())
    }

    /// Runs `command`, mapping spawn failures and non-zero exits to
    /// `(exit_code, stderr)`. A spawn failure reports exit code -1.
    async fn run_checked(&self, command: &CommandSpec) -> Result<ExecCapture, (i32, String)> {
        tracing::debug!(command = %command.display(), "running");
        match self.runner.run(command).await {
            Ok(capture) if capture.success() => Ok(capture),
            Ok(capture) => {
                let stderr = capture.stderr_text();
                tracing::warn!(
                    command = %command.display(),
                    exit_code = capture.exit_code,
                    stderr = %stderr,
                    "command failed"
                );
                Err((capture.exit_code, stderr))
            }
            Err(err) => {
                tracing::warn!(
                    command = %command.display(),
                    code = err.code(),
                    kind = ?err.kind(),
                    "command could not be run: {err}"
                );
                Err((-1, err.to_string()))
            }
        }
    }
}
