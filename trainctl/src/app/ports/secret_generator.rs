// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

/// Source of fresh account passwords.
pub trait SecretGeneratorPort: Send + Sync {
    fn generate_secret(&self) -> String;
}
