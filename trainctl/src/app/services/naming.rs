// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

/// `train007` for prefix `train` and index 7. Indices past 999 keep all
/// their digits.
pub fn username(prefix: &str, index: u32) -> String {
    format!("{prefix}{index:03}")
}

/// Deterministic uid for `index`; `None` on overflow.
pub fn uid_for(base_uid: u32, index: u32) -> Option<u32> {
    base_uid.checked_add(index)
}

/// Home directory next to the reference account's, named after `username`.
pub fn sibling_home_dir(reference_home: &Path, username: &str) -> PathBuf {
    match reference_home.parent() {
        Some(parent) => parent.join(username),
        None => PathBuf::from(username),
    }
}

pub fn synthetic_email(username: &str, domain: &str) -> String {
    format!("{username}@{domain}")
}
