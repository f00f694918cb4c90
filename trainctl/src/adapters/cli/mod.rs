// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

use clap::Parser;

use crate::app::types::Role;

#[derive(Parser, Debug)]
#[command(
    name = "trainctl",
    version,
    about = "Create numbered training accounts on an HPC cluster node",
    long_about = None,
    after_help = "Accounts are named <prefix><index> with a three-digit index and get uid base_uid + index.\n\
Indices whose uid already exists are skipped, so reruns are safe.\n\
On hosts whose name starts with \"master\" each account also gets an SSH key and a notebook setup.\n\
\n\
Configuration precedence: defaults < config file < command-line flags.\n\
Config path precedence: defaults < TRAINCTL_CONFIG_PATH < command-line flags.\n\
Paths in the config file are resolved relative to the config file directory."
)]
pub struct Opts {
    #[arg(
        long = "number-of-users",
        value_name = "N",
        default_value_t = 1,
        help = "Create this many user/password/ssh-key triples, indices 0..N-1."
    )]
    pub number_of_users: u32,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, trainctl uses TRAINCTL_CONFIG_PATH if set, otherwise the default config file location if available."
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "File that receives one username,password line per created account. Overrides `passwords_file`."
    )]
    pub passwords_file: Option<PathBuf>,
    #[arg(
        long,
        value_name = "UID",
        help = "uid of index 0. Overrides `base_uid`."
    )]
    pub base_uid: Option<u32>,
    #[arg(
        long,
        value_name = "NAME",
        help = "Existing account whose group and home directory parent are reused. Overrides `reference_account`."
    )]
    pub reference_account: Option<String>,
    #[arg(
        long,
        value_name = "ROLE",
        value_parser = parse_role,
        help = "Force master or worker behaviour instead of detecting it from the host name. Overrides `role`."
    )]
    pub role: Option<Role>,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Enable debug logging. Overrides `verbose` from the config file."
    )]
    pub verbose: bool,
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

impl Opts {
    /// `Some(true)` only when the flag was given, so the config file can
    /// still turn verbose on.
    pub fn verbose_override(&self) -> Option<bool> {
        self.verbose.then_some(true)
    }
}

pub fn parse_opts() -> Opts {
    Opts::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Opts::command().debug_assert();
    }

    #[test]
    fn number_of_users_defaults_to_one() {
        let opts = Opts::try_parse_from(["trainctl"]).unwrap();
        assert_eq!(opts.number_of_users, 1);
        assert_eq!(opts.role, None);
        assert_eq!(opts.verbose_override(), None);
    }

    #[test]
    fn parses_all_flags() {
        let opts = Opts::try_parse_from([
            "trainctl",
            "--number-of-users",
            "25",
            "--passwords-file",
            "/root/pw.txt",
            "--base-uid",
            "20000",
            "--reference-account",
            "teacher",
            "--role",
            "worker",
            "-v",
        ])
        .unwrap();
        assert_eq!(opts.number_of_users, 25);
        assert_eq!(opts.passwords_file, Some(PathBuf::from("/root/pw.txt")));
        assert_eq!(opts.base_uid, Some(20000));
        assert_eq!(opts.reference_account.as_deref(), Some("teacher"));
        assert_eq!(opts.role, Some(Role::Worker));
        assert_eq!(opts.verbose_override(), Some(true));
    }

    #[test]
    fn rejects_negative_user_count_and_unknown_role() {
        assert!(Opts::try_parse_from(["trainctl", "--number-of-users", "-1"]).is_err());
        assert!(Opts::try_parse_from(["trainctl", "--role", "login"]).is_err());
    }
}
