// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::ports::SecretGeneratorPort;
use crate::app::services::random;

#[derive(Clone, Debug)]
pub struct RandomSecretGenerator {
    length: usize,
}

impl RandomSecretGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl SecretGeneratorPort for RandomSecretGenerator {
    fn generate_secret(&self) -> String {
        random::generate_password(self.length)
    }
}
