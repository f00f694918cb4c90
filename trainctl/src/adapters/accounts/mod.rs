// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;
use nix::unistd::{Gid, Group, Uid, User};

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::AccountDatabasePort;
use crate::app::types::AccountRecord;

/// Host passwd/group database through the libc NSS lookups.
#[derive(Clone, Default)]
pub struct SystemAccounts;

impl SystemAccounts {
    pub fn new() -> Self {
        Self
    }
}

fn lookup_error(what: String, err: nix::Error) -> AppError {
    AppError::with_message(
        AppErrorKind::Internal,
        codes::LOOKUP_FAILURE,
        format!("failed to look up {what}: {err}"),
    )
}

fn to_record(user: User) -> AccountRecord {
    AccountRecord {
        name: user.name,
        uid: user.uid.as_raw(),
        gid: user.gid.as_raw(),
        home_dir: user.dir,
    }
}

#[async_trait]
impl AccountDatabasePort for SystemAccounts {
    #[tracing::instrument(name = "accounts", level = "debug", skip(self), fields(op = "user_by_uid"))]
    async fn user_by_uid(&self, uid: u32) -> AppResult<Option<AccountRecord>> {
        User::from_uid(Uid::from_raw(uid))
            .map(|user| user.map(to_record))
            .map_err(|err| lookup_error(format!("uid {uid}"), err))
    }

    #[tracing::instrument(name = "accounts", level = "debug", skip(self), fields(op = "user_by_name"))]
    async fn user_by_name(&self, name: &str) -> AppResult<Option<AccountRecord>> {
        User::from_name(name)
            .map(|user| user.map(to_record))
            .map_err(|err| lookup_error(format!("user {name}"), err))
    }

    #[tracing::instrument(name = "accounts", level = "debug", skip(self), fields(op = "group_name"))]
    async fn group_name(&self, gid: u32) -> AppResult<Option<String>> {
        Group::from_gid(Gid::from_raw(gid))
            .map(|group| group.map(|group| group.name))
            .map_err(|err| lookup_error(format!("gid {gid}"), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_is_uid_zero() {
        let accounts = SystemAccounts::new();
        let root = accounts.user_by_uid(0).await.unwrap().expect("root exists");
        assert_eq!(root.name, "root");
        let by_name = accounts.user_by_name("root").await.unwrap().unwrap();
        assert_eq!(by_name.uid, 0);
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let accounts = SystemAccounts::new();
        assert_eq!(
            accounts
                .user_by_name("trainctl-no-such-user")
                .await
                .unwrap(),
            None
        );
    }
}
