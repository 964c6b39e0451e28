use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    EnvFilter,
    fmt::{format::FmtSpan, writer::MakeWriterExt},
};

pub const CLI_PREFIX: &str = "cli";
const MAX_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: &str = "info";

/// Filter directive scoped to this crate. An explicit level wins over `RUST_LOG`.
fn crate_directive(level: Option<LevelFilter>, env_level: Option<String>) -> String {
    let level = level
        .map(|v| v.to_string())
        .or(env_level)
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Installs the global subscriber. Logs go into daily files inside `log_dir`, and to stdout
/// when `show_std` is set.
pub fn enable_logging(
    prefix: &str,
    log_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let files = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .build(log_dir)?;
    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let directive = crate_directive(log_level, std::env::var("RUST_LOG").ok());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(files))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
