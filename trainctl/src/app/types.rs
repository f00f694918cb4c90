// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which part of the account setup this host is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns shared storage: home directories, SSH keys, notebook setup.
    Master,
    /// Only needs the local account database entry.
    Worker,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "master" => Ok(Role::Master),
            "worker" => Ok(Role::Worker),
            other => Err(format!("unknown role {other:?}; expected master or worker")),
        }
    }
}

/// Entry from the host account database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home_dir: PathBuf,
}

/// The existing account new training users are modelled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAccount {
    pub name: String,
    pub group: String,
    pub home_dir: PathBuf,
}

/// Everything needed to create one training account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingUser {
    pub username: String,
    pub index: u32,
    pub uid: u32,
    pub group: String,
    pub home_dir: PathBuf,
    pub shell: String,
}

impl TrainingUser {
    pub fn ssh_dir(&self) -> PathBuf {
        self.home_dir.join(".ssh")
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.ssh_dir().join("id_rsa")
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.ssh_dir().join("id_rsa.pub")
    }

    pub fn authorized_keys_path(&self) -> PathBuf {
        self.ssh_dir().join("authorized_keys")
    }
}

/// A child process invocation: program, arguments and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Program and arguments joined for logs. Never includes stdin.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Knobs for one provisioning run, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub base_uid: u32,
    pub username_prefix: String,
    pub reference_account: String,
    pub shell: String,
    pub scratch_root: PathBuf,
    pub passwords_file: PathBuf,
    pub email_domain: String,
    pub ipython_profile: String,
    pub cluster_id: String,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            base_uid: 10000,
            username_prefix: "train".to_string(),
            reference_account: "hpc".to_string(),
            shell: "/bin/bash".to_string(),
            scratch_root: PathBuf::from("/share/data"),
            passwords_file: PathBuf::from("passwords.txt"),
            email_domain: "training.invalid".to_string(),
            ipython_profile: "mpi".to_string(),
            cluster_id: "training_cluster_0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    Created,
    Skipped,
    Failed { code: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReport {
    pub index: u32,
    pub username: String,
    pub outcome: UserOutcome,
}

/// Per-index results of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub users: Vec<UserReport>,
}

impl BatchReport {
    pub fn created(&self) -> usize {
        self.count(|outcome| matches!(outcome, UserOutcome::Created))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, UserOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, UserOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&UserOutcome) -> bool) -> usize {
        self.users.iter().filter(|user| pred(&user.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Master".parse::<Role>(), Ok(Role::Master));
        assert_eq!(" worker ".parse::<Role>(), Ok(Role::Worker));
        assert!("login".parse::<Role>().is_err());
    }

    #[test]
    fn command_display_omits_stdin() {
        let cmd = CommandSpec::new("/usr/bin/passwd")
            .arg("train000")
            .stdin("secret\nsecret\n");
        assert_eq!(cmd.display(), "/usr/bin/passwd train000");
    }

    #[test]
    fn ssh_paths_live_under_home() {
        let user = TrainingUser {
            username: "train004".into(),
            index: 4,
            uid: 10004,
            group: "hpc".into(),
            home_dir: PathBuf::from("/home/train004"),
            shell: "/bin/bash".into(),
        };
        assert_eq!(
            user.authorized_keys_path(),
            PathBuf::from("/home/train004/.ssh/authorized_keys")
        );
        assert_eq!(
            user.public_key_path(),
            PathBuf::from("/home/train004/.ssh/id_rsa.pub")
        );
    }

    #[test]
    fn batch_report_counts_outcomes() {
        let report = BatchReport {
            users: vec![
                UserReport {
                    index: 0,
                    username: "train000".into(),
                    outcome: UserOutcome::Created,
                },
                UserReport {
                    index: 1,
                    username: "train001".into(),
                    outcome: UserOutcome::Skipped,
                },
                UserReport {
                    index: 2,
                    username: "train002".into(),
                    outcome: UserOutcome::Failed {
                        code: "account_creation",
                        message: "exit 1".into(),
                    },
                },
            ],
        };
        assert_eq!(report.created(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }
}
