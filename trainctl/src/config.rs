// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::app::services::random::MIN_PASSWORD_LENGTH;
use crate::app::types::{ProvisionSettings, Role};

const APP_DIR_NAME: &str = "trainctl";
const CONFIG_FILE_NAME: &str = "trainctl.toml";
const CONFIG_ENV_VAR: &str = "TRAINCTL_CONFIG_PATH";
const DEFAULT_PASSWORD_LENGTH: usize = 12;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_uid: Option<u32>,
    username_prefix: Option<String>,
    reference_account: Option<String>,
    shell: Option<String>,
    scratch_root: Option<String>,
    passwords_file: Option<String>,
    password_length: Option<usize>,
    email_domain: Option<String>,
    ipython_profile: Option<String>,
    cluster_id: Option<String>,
    role: Option<String>,
    verbose: Option<bool>,
}

#[derive(Debug)]
pub struct Config {
    pub settings: ProvisionSettings,
    pub password_length: usize,
    /// Forced role; `None` means detect from the host name.
    pub role: Option<Role>,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::Env => "env",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue {
    pub key: &'static str,
    pub value: String,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub values: Vec<ConfigValue>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub base_uid: Option<u32>,
    pub reference_account: Option<String>,
    pub passwords_file: Option<PathBuf>,
    pub role: Option<Role>,
    pub verbose: Option<bool>,
}

/// Resolves one setting: override, then config file, then default.
fn pick<T>(override_value: Option<T>, file_value: Option<T>, default: T) -> (T, ConfigSource) {
    match override_value {
        Some(value) => (value, ConfigSource::Override),
        None => match file_value {
            Some(value) => (value, ConfigSource::ConfigFile),
            None => (default, ConfigSource::Default),
        },
    }
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(ConfigSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(ConfigSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };
    let base_dir = config_path.as_deref().and_then(|path| path.parent());
    let defaults = ProvisionSettings::default();
    let mut values = Vec::new();

    let (base_uid, source) = pick(overrides.base_uid, file_config.base_uid, defaults.base_uid);
    if base_uid == 0 {
        anyhow::bail!("base_uid must be greater than 0");
    }
    values.push(report_value("base_uid", base_uid, source));

    let (username_prefix, source) = pick(
        None,
        file_config.username_prefix,
        defaults.username_prefix,
    );
    if username_prefix.trim().is_empty() {
        anyhow::bail!("username_prefix must not be empty");
    }
    values.push(report_value("username_prefix", &username_prefix, source));

    let (reference_account, source) = pick(
        overrides.reference_account,
        file_config.reference_account,
        defaults.reference_account,
    );
    values.push(report_value("reference_account", &reference_account, source));

    let (shell, source) = pick(None, file_config.shell, defaults.shell);
    values.push(report_value("shell", &shell, source));

    let (scratch_root, source) = pick(
        None,
        file_config.scratch_root.map(|raw| resolve_path(&raw, base_dir)),
        defaults.scratch_root,
    );
    values.push(report_value("scratch_root", scratch_root.display(), source));

    let (passwords_file, source) = pick(
        overrides.passwords_file.map(expand_path),
        file_config
            .passwords_file
            .map(|raw| resolve_path(&raw, base_dir)),
        defaults.passwords_file,
    );
    values.push(report_value("passwords_file", passwords_file.display(), source));

    let (password_length, source) = pick(
        None,
        file_config.password_length,
        DEFAULT_PASSWORD_LENGTH,
    );
    if password_length < MIN_PASSWORD_LENGTH {
        anyhow::bail!("password_length must be at least {MIN_PASSWORD_LENGTH}");
    }
    values.push(report_value("password_length", password_length, source));

    let (email_domain, source) = pick(None, file_config.email_domain, defaults.email_domain);
    values.push(report_value("email_domain", &email_domain, source));

    let (ipython_profile, source) = pick(
        None,
        file_config.ipython_profile,
        defaults.ipython_profile,
    );
    if !is_profile_name(&ipython_profile) {
        anyhow::bail!(
            "ipython_profile {ipython_profile:?} may only contain letters, digits, '_' and '-'"
        );
    }
    values.push(report_value("ipython_profile", &ipython_profile, source));

    let (cluster_id, source) = pick(None, file_config.cluster_id, defaults.cluster_id);
    values.push(report_value("cluster_id", &cluster_id, source));

    let file_role = file_config
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(anyhow::Error::msg)
        .context("invalid role in config file")?;
    let (role, source) = match (overrides.role, file_role) {
        (Some(role), _) => (Some(role), ConfigSource::Override),
        (None, Some(role)) => (Some(role), ConfigSource::ConfigFile),
        (None, None) => (None, ConfigSource::Default),
    };
    values.push(report_value(
        "role",
        role.map(Role::as_str).unwrap_or("detect"),
        source,
    ));

    let (verbose, source) = pick(overrides.verbose, file_config.verbose, false);
    values.push(report_value("verbose", verbose, source));

    let config = Config {
        settings: ProvisionSettings {
            base_uid,
            username_prefix,
            reference_account,
            shell,
            scratch_root,
            passwords_file,
            email_domain,
            ipython_profile,
            cluster_id,
        },
        password_length,
        role,
        verbose,
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        values,
    };

    Ok(LoadResult { config, report })
}

/// Profile names end up unquoted inside shell paths.
fn is_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

fn report_value(
    key: &'static str,
    value: impl std::fmt::Display,
    source: ConfigSource,
) -> ConfigValue {
    ConfigValue {
        key,
        value: value.to_string(),
        source,
    }
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn resolve_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        return path;
    }
    match base_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
