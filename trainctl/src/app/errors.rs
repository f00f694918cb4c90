// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

use thiserror::Error as ThisError;

pub mod codes {
    pub const SPAWN_FAILURE: &str = "spawn_failure";
    pub const LOOKUP_FAILURE: &str = "lookup_failure";
    pub const HOST_IDENTITY: &str = "host_identity";
    pub const LOCAL_ERROR: &str = "local_error";
    pub const INVALID_ARGUMENT: &str = "invalid_argument";

    pub const INVALID_INDEX: &str = "invalid_index";
    pub const REFERENCE_ACCOUNT_NOT_FOUND: &str = "reference_account_not_found";
    pub const ACCOUNT_CREATION: &str = "account_creation";
    pub const PASSWORD_SET: &str = "password_set";
    pub const KEY_GENERATION: &str = "key_generation";
    pub const NOTEBOOK_BOOTSTRAP: &str = "notebook_bootstrap";
    pub const SECRET_WRITE: &str = "secret_write";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorKind {
    InvalidArgument,
    Internal,
}

/// Failure reported by a port adapter.
#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    context: Option<String>,
}

impl AppError {
    pub fn with_message(
        kind: AppErrorKind,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn local_error(message: impl Into<String>) -> Self {
        Self::with_message(AppErrorKind::Internal, codes::LOCAL_ERROR, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{} ({})", self.message, ctx)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Why provisioning a single training account stopped.
///
/// Every variant is local to one index; the batch driver records it and
/// moves on to the next account.
#[derive(Debug, ThisError)]
pub enum ProvisionError {
    #[error("index {index} overflows the uid range above base uid {base_uid}")]
    InvalidIndex { index: u32, base_uid: u32 },

    #[error("account database lookup failed: {0}")]
    AccountLookup(#[source] AppError),

    #[error("reference account {name:?} does not exist")]
    ReferenceAccountNotFound { name: String },

    #[error("useradd for {username} exited with {exit_code}: {stderr}")]
    AccountCreationError {
        username: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("passwd for {username} exited with {exit_code}: {stderr}")]
    PasswordSetError {
        username: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("ssh key setup for {username} failed: {message}")]
    KeyGenError { username: String, message: String },

    #[error("notebook bootstrap step {step} for {username} failed: {message}")]
    NotebookBootstrapError {
        username: String,
        step: &'static str,
        message: String,
    },

    /// The account exists at this point; reruns skip it by uid, so the
    /// password is only recoverable by resetting it.
    #[error(
        "account {username} was created but its password could not be recorded ({source}); \
         reset it by hand with passwd"
    )]
    SecretWriteError {
        username: String,
        #[source]
        source: AppError,
    },
}

impl ProvisionError {
    pub fn code(&self) -> &'static str {
        match self {
            ProvisionError::InvalidIndex { .. } => codes::INVALID_INDEX,
            ProvisionError::AccountLookup(_) => codes::LOOKUP_FAILURE,
            ProvisionError::ReferenceAccountNotFound { .. } => codes::REFERENCE_ACCOUNT_NOT_FOUND,
            ProvisionError::AccountCreationError { .. } => codes::ACCOUNT_CREATION,
            ProvisionError::PasswordSetError { .. } => codes::PASSWORD_SET,
            ProvisionError::KeyGenError { .. } => codes::KEY_GENERATION,
            ProvisionError::NotebookBootstrapError { .. } => codes::NOTEBOOK_BOOTSTRAP,
            ProvisionError::SecretWriteError { .. } => codes::SECRET_WRITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_display_includes_context() {
        let err = AppError::local_error("failed to read /tmp/x").with_context("authorized_keys");
        assert_eq!(err.to_string(), "failed to read /tmp/x (authorized_keys)");
        assert_eq!(err.code(), codes::LOCAL_ERROR);
        assert_eq!(err.kind(), AppErrorKind::Internal);
    }

    #[test]
    fn provision_error_codes_are_stable() {
        let err = ProvisionError::AccountCreationError {
            username: "train001".into(),
            exit_code: 9,
            stderr: "useradd: user 'train001' already exists".into(),
        };
        assert_eq!(err.code(), codes::ACCOUNT_CREATION);
        assert!(err.to_string().contains("exited with 9"));

        let err = ProvisionError::SecretWriteError {
            username: "train004".into(),
            source: AppError::local_error("failed to open passwords.txt: Permission denied"),
        };
        assert_eq!(err.code(), codes::SECRET_WRITE);
        assert!(err.to_string().starts_with("account train004 was created"));
        assert!(err.to_string().contains("reset it by hand"));

        let err = ProvisionError::ReferenceAccountNotFound { name: "hpc".into() };
        assert_eq!(err.code(), codes::REFERENCE_ACCOUNT_NOT_FOUND);
        assert_eq!(err.to_string(), "reference account \"hpc\" does not exist");
    }
}
