// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::errors::AppResult;
use crate::app::ports::HostIdentityPort;
use crate::app::types::Role;

pub const MASTER_HOST_PREFIX: &str = "master";

/// `Master` iff the host name starts with `master`.
pub fn resolve_role(host_name: &str) -> Role {
    if host_name.starts_with(MASTER_HOST_PREFIX) {
        Role::Master
    } else {
        Role::Worker
    }
}

pub fn detect_role(host: &dyn HostIdentityPort) -> AppResult<Role> {
    let name = host.host_name()?;
    let role = resolve_role(&name);
    tracing::debug!(host = %name, role = %role, "resolved host role");
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedHost(&'static str);

    impl HostIdentityPort for FixedHost {
        fn host_name(&self) -> AppResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn master_prefix_selects_master() {
        for name in ["master", "master0", "master-01.cluster.local", "masterful"] {
            assert_eq!(resolve_role(name), Role::Master, "{name}");
        }
    }

    #[test]
    fn everything_else_is_worker() {
        for name in ["", "worker0", "node-master", "Master0", " master", "mastr"] {
            assert_eq!(resolve_role(name), Role::Worker, "{name:?}");
        }
    }

    #[test]
    fn detect_role_reads_host_identity() {
        assert_eq!(detect_role(&FixedHost("master-a")).unwrap(), Role::Master);
        assert_eq!(detect_role(&FixedHost("compute-7")).unwrap(), Role::Worker);
    }
}
