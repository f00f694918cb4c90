// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod commands;
pub mod naming;
pub mod random;
pub mod role;
pub mod shell;
