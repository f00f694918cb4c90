// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::HostIdentityPort;

#[derive(Clone, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

impl HostIdentityPort for SystemHost {
    fn host_name(&self) -> AppResult<String> {
        let name = hostname::get().map_err(|err| {
            AppError::with_message(
                AppErrorKind::Internal,
                codes::HOST_IDENTITY,
                format!("failed to read host name: {err}"),
            )
        })?;
        Ok(name.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_name_is_not_empty() {
        let name = SystemHost::new().host_name().unwrap();
        assert!(!name.is_empty());
    }
}
