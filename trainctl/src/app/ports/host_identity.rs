// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;

/// Network name of the executing host.
pub trait HostIdentityPort: Send + Sync {
    fn host_name(&self) -> AppResult<String>;
}
