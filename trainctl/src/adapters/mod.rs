// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod accounts;
pub mod cli;
pub mod fs;
pub mod host;
pub mod process;
pub mod secrets;
