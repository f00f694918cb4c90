// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::env;
use std::path::Path;
use std::sync::OnceLock;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_ENV_VAR: &str = "TRAINCTL_LOG";
const FORMAT_ENV_VAR: &str = "TRAINCTL_LOG_FORMAT";
const SPAN_EVENTS_ENV_VAR: &str = "TRAINCTL_LOG_SPAN_EVENTS";
const FILE_ENV_VAR: &str = "TRAINCTL_LOG_FILE";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
    Compact,
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Installs the global subscriber. Logs go to stderr so stdout only
/// carries the run summary; `TRAINCTL_LOG_FILE` adds a plain-text copy.
pub fn init(verbose: bool) {
    let filter = build_filter(env::var(LOG_ENV_VAR).ok(), verbose);
    let span_events = parse_span_events(env::var(SPAN_EVENTS_ENV_VAR).ok().as_deref());
    let format = parse_format(env::var(FORMAT_ENV_VAR).ok().as_deref());

    let mut layers: Vec<BoxedLayer<Registry>> =
        vec![fmt_layer(format, span_events.clone(), std::io::stderr, true)];
    if let Some((writer, guard)) = build_file_writer() {
        layers.push(fmt_layer(format, span_events, writer, false));
        let _ = FILE_GUARD.set(guard);
    }

    Registry::default()
        .with(layers)
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .init();
}

fn fmt_layer<S, W>(format: LogFormat, span_events: FmtSpan, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339())
        .with_span_events(span_events);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn build_filter(directive: Option<String>, verbose: bool) -> EnvFilter {
    match directive {
        Some(value) => EnvFilter::new(value),
        None => {
            if verbose {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("trainctl=info")
            }
        }
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_ascii_lowercase())
}

fn parse_format(value: Option<&str>) -> LogFormat {
    match normalized(value).as_deref() {
        Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::Compact,
    }
}

fn parse_span_events(value: Option<&str>) -> FmtSpan {
    match normalized(value).as_deref() {
        Some("new") => FmtSpan::NEW,
        Some("enter") => FmtSpan::ENTER,
        Some("exit") => FmtSpan::EXIT,
        Some("close") => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

fn build_file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let file_path = env::var(FILE_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())?;

    let path = Path::new(&file_path);
    let file_name = path.file_name()?.to_string_lossy().to_string();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}
