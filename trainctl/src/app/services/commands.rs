// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::Path;

use crate::app::services::naming;
use crate::app::services::shell::{append_line, sh_escape};
use crate::app::types::{CommandSpec, ProvisionSettings, Role, TrainingUser};

pub const USERADD: &str = "/usr/sbin/useradd";
pub const PASSWD: &str = "/usr/bin/passwd";
pub const SUDO: &str = "sudo";

const NOTEBOOK_CONFIG: &str = "\"$HOME/.jupyter/jupyter_notebook_config.py\"";

pub fn useradd(user: &TrainingUser, role: Role) -> CommandSpec {
    // Worker homes already exist on shared storage.
    let home_flag = match role {
        Role::Master => "-m",
        Role::Worker => "-M",
    };
    CommandSpec::new(USERADD)
        .arg("-c")
        .arg(format!("Training user {}", user.index))
        .arg("-g")
        .arg(&user.group)
        .arg("-d")
        .arg(user.home_dir.to_string_lossy())
        .arg("-s")
        .arg(&user.shell)
        .arg(home_flag)
        .arg("-u")
        .arg(user.uid.to_string())
        .arg(&user.username)
}

/// `passwd` reads the new secret twice from stdin.
pub fn passwd(username: &str, secret: &str) -> CommandSpec {
    CommandSpec::new(PASSWD)
        .arg(username)
        .stdin(format!("{secret}\n{secret}\n"))
}

fn as_user(username: &str) -> CommandSpec {
    CommandSpec::new(SUDO).args(["-u", username])
}

fn login_as(username: &str) -> CommandSpec {
    CommandSpec::new(SUDO).args(["--login", "--user", username])
}

pub fn make_ssh_dir(user: &TrainingUser) -> CommandSpec {
    as_user(&user.username).args([
        "mkdir".to_string(),
        "-p".to_string(),
        "-m".to_string(),
        "700".to_string(),
        user.ssh_dir().to_string_lossy().into_owned(),
    ])
}

/// RSA keypair with an empty passphrase, generated as the account itself.
pub fn ssh_keygen(user: &TrainingUser) -> CommandSpec {
    as_user(&user.username).args([
        "ssh-keygen".to_string(),
        "-t".to_string(),
        "rsa".to_string(),
        "-f".to_string(),
        user.private_key_path().to_string_lossy().into_owned(),
        "-q".to_string(),
        "-N".to_string(),
        String::new(),
    ])
}

/// Appends `entry` (fed on stdin) to the account's `authorized_keys`.
///
/// Runs as the account so a newly created file belongs to it; sshd reads
/// the file with the account's privileges.
pub fn authorize_key(user: &TrainingUser, entry: &str) -> CommandSpec {
    let target = sh_escape(&user.authorized_keys_path().to_string_lossy());
    as_user(&user.username)
        .args(["sh", "-c"])
        .arg(format!("umask 077 && cat >> {target}"))
        .stdin(entry)
}

/// Ordered notebook bootstrap commands, each tagged with a step name used
/// in errors and logs.
pub fn notebook_bootstrap(
    user: &TrainingUser,
    settings: &ProvisionSettings,
) -> Vec<(&'static str, CommandSpec)> {
    let scratch = scratch_dir(&settings.scratch_root, &user.username);
    let email = naming::synthetic_email(&user.username, &settings.email_domain);
    vec![
        (
            "scratch_dir",
            CommandSpec::new("mkdir").arg("-p").arg(&scratch),
        ),
        (
            "scratch_owner",
            CommandSpec::new("chown")
                .arg(format!("{}:{}", user.username, user.group))
                .arg(&scratch),
        ),
        (
            "bash_kernel",
            login_as(&user.username).args(["python3", "-m", "bash_kernel.install", "--user"]),
        ),
        (
            "notebook_config",
            login_as(&user.username).args(["jupyter", "notebook", "--generate-config"]),
        ),
        (
            "cluster_profile",
            login_as(&user.username)
                .args(["sh", "-c"])
                .arg(cluster_profile_script(settings)),
        ),
        (
            "git_name",
            login_as(&user.username).args([
                "git",
                "config",
                "--global",
                "user.name",
                user.username.as_str(),
            ]),
        ),
        (
            "git_email",
            login_as(&user.username).args([
                "git",
                "config",
                "--global",
                "user.email",
                email.as_str(),
            ]),
        ),
    ]
}

fn scratch_dir(root: &Path, username: &str) -> String {
    root.join(username).to_string_lossy().into_owned()
}

/// Notebook server extensions plus an MPI ipcluster profile, run through
/// `sh -c` in the account's login environment.
pub fn cluster_profile_script(settings: &ProvisionSettings) -> String {
    let profile = &settings.ipython_profile;
    let ipcluster_config = format!("\"$HOME/.ipython/profile_{profile}/ipcluster_config.py\"");
    [
        append_line(
            r#"c.NotebookApp.contents_manager_class = "notedown.NotedownContentsManager""#,
            NOTEBOOK_CONFIG,
        ),
        append_line(
            r#"c.NotebookApp.server_extensions.append("ipyparallel.nbextension")"#,
            NOTEBOOK_CONFIG,
        ),
        format!("ipython3 profile create --parallel --profile={profile}"),
        append_line(
            r#"c.IPClusterEngines.engine_launcher_class = "MPI""#,
            &ipcluster_config,
        ),
        append_line(
            &format!(
                r#"c.BaseParallelApplication.cluster_id = "{}""#,
                settings.cluster_id
            ),
            &ipcluster_config,
        ),
    ]
    .join(" && ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn user() -> TrainingUser {
        TrainingUser {
            username: "train007".into(),
            index: 7,
            uid: 10007,
            group: "hpcusers".into(),
            home_dir: PathBuf::from("/home/train007"),
            shell: "/bin/bash".into(),
        }
    }

    #[test]
    fn useradd_creates_home_only_on_master() {
        let master = useradd(&user(), Role::Master);
        assert_eq!(master.program, USERADD);
        assert_eq!(
            master.args,
            vec![
                "-c",
                "Training user 7",
                "-g",
                "hpcusers",
                "-d",
                "/home/train007",
                "-s",
                "/bin/bash",
                "-m",
                "-u",
                "10007",
                "train007",
            ]
        );
        let worker = useradd(&user(), Role::Worker);
        assert!(worker.args.contains(&"-M".to_string()));
        assert!(!worker.args.contains(&"-m".to_string()));
    }

    #[test]
    fn passwd_feeds_secret_twice() {
        let cmd = passwd("train007", "s3cret");
        assert_eq!(cmd.args, vec!["train007"]);
        assert_eq!(cmd.stdin.as_deref(), Some("s3cret\ns3cret\n"));
    }

    #[test]
    fn keygen_runs_as_account_without_passphrase() {
        let cmd = ssh_keygen(&user());
        assert_eq!(cmd.program, SUDO);
        assert_eq!(cmd.args[..2], ["-u", "train007"]);
        assert!(cmd.args.contains(&"/home/train007/.ssh/id_rsa".to_string()));
        assert_eq!(cmd.args.last().map(String::as_str), Some(""));
    }

    #[test]
    fn authorize_key_appends_as_the_account() {
        let cmd = authorize_key(&user(), "ssh-rsa AAAA train007@master\n");
        assert_eq!(cmd.program, SUDO);
        assert_eq!(cmd.args[..4], ["-u", "train007", "sh", "-c"]);
        assert_eq!(
            cmd.args[4],
            "umask 077 && cat >> '/home/train007/.ssh/authorized_keys'"
        );
        assert_eq!(cmd.stdin.as_deref(), Some("ssh-rsa AAAA train007@master\n"));
    }

    #[test]
    fn bootstrap_steps_are_ordered() {
        let steps = notebook_bootstrap(&user(), &ProvisionSettings::default());
        let names: Vec<_> = steps.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "scratch_dir",
                "scratch_owner",
                "bash_kernel",
                "notebook_config",
                "cluster_profile",
                "git_name",
                "git_email",
            ]
        );
        assert_eq!(steps[0].1.args, vec!["-p", "/share/data/train007"]);
        assert_eq!(steps[1].1.args, vec!["train007:hpcusers", "/share/data/train007"]);
        assert_eq!(
            steps[6].1.args.last().map(String::as_str),
            Some("train007@training.invalid")
        );
    }

    #[test]
    fn profile_script_targets_configured_profile() {
        let settings = ProvisionSettings {
            ipython_profile: "mpi".into(),
            cluster_id: "course_a".into(),
            ..ProvisionSettings::default()
        };
        let script = cluster_profile_script(&settings);
        assert!(script.contains("ipython3 profile create --parallel --profile=mpi"));
        assert!(script.contains(
            r#"echo 'c.BaseParallelApplication.cluster_id = "course_a"' >> "$HOME/.ipython/profile_mpi/ipcluster_config.py""#
        ));
        assert_eq!(script.matches(" && ").count(), 4);
    }
}
