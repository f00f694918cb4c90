// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::AccountRecord;

#[async_trait]
/// Read-only view of the host account database (passwd and group).
pub trait AccountDatabasePort: Send + Sync {
    async fn user_by_uid(&self, uid: u32) -> AppResult<Option<AccountRecord>>;
    async fn user_by_name(&self, name: &str) -> AppResult<Option<AccountRecord>>;
    async fn group_name(&self, gid: u32) -> AppResult<Option<String>>;
}
