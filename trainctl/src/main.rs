// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

mod adapters;
mod app;
mod config;
mod logging;

use app::types::{BatchReport, UserOutcome};

fn log_config_report(report: &config::ConfigReport) {
    match (&report.config_path, report.config_path_source) {
        (Some(path), Some(source)) => {
            tracing::info!(
                "config path: {} (source={}, present={})",
                path.display(),
                source.as_str(),
                report.config_file_present
            );
        }
        (Some(path), None) => {
            tracing::info!(
                "config path: {} (present={})",
                path.display(),
                report.config_file_present
            );
        }
        (None, _) => {
            tracing::info!("config path: (none)");
        }
    }
    for value in &report.values {
        tracing::info!(
            "config {}: {} (source={})",
            value.key,
            value.value,
            value.source.as_str()
        );
    }
}

fn print_summary(report: &BatchReport, passwords_file: &std::path::Path) {
    for user in &report.users {
        if let UserOutcome::Failed { code, message } = &user.outcome {
            println!("{} (index {}): failed [{code}] {message}", user.username, user.index);
        }
    }
    println!(
        "created {}, skipped {}, failed {}; passwords appended to {}",
        report.created(),
        report.skipped(),
        report.failed(),
        passwords_file.display()
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let opts = adapters::cli::parse_opts();
    let config::LoadResult { config, report } = config::load_with_report(
        opts.config.clone(),
        config::Overrides {
            base_uid: opts.base_uid,
            reference_account: opts.reference_account.clone(),
            passwords_file: opts.passwords_file.clone(),
            role: opts.role,
            verbose: opts.verbose_override(),
        },
    )?;
    logging::init(config.verbose);
    log_config_report(&report);

    let role = match config.role {
        Some(role) => role,
        None => app::services::role::detect_role(&adapters::host::SystemHost::new())
            .context("failed to determine host role; pass --role to set it explicitly")?,
    };
    let passwords_file = config.settings.passwords_file.clone();
    let provisioner = app::usecases::Provisioner::new(
        Arc::new(adapters::process::ProcessRunner::new()),
        Arc::new(adapters::accounts::SystemAccounts::new()),
        Arc::new(adapters::fs::LocalFilesystem::new()),
        Arc::new(adapters::secrets::RandomSecretGenerator::new(
            config.password_length,
        )),
        config.settings,
        role,
    );
    tracing::info!(
        role = %provisioner.role(),
        users = opts.number_of_users,
        "starting provisioning run"
    );

    let batch = provisioner.provision_batch(opts.number_of_users).await;
    print_summary(&batch, &passwords_file);

    Ok(if batch.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
