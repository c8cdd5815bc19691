//! File logging for the terminal client.
//!
//! Logs go to a daily rolling file under the data directory so they never
//! interleave with the REPL output.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Modules whose debug output is connection plumbing rather than app behavior.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

fn build_filter(log_filter: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_filter);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines on drop; keep it alive for
/// the whole run.
pub fn init_logging(logs_dir: &Path, log_filter: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = tracing_appender::rolling::daily(logs_dir, "vanille.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let _ = tracing_subscriber::registry()
        .with(build_filter(log_filter))
        .with(fmt_layer)
        .try_init();

    tracing::info!(log_filter = %log_filter, "Logging initialized");
    Ok(guard)
}
