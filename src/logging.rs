use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "apex_chat=info,apex_gpt=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env("APEX_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to a file while the TUI owns the terminal.
///
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// whole session.
pub fn init_file() -> Result<(WorkerGuard, PathBuf)> {
    let dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("apex-gpt");
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, "apex-gpt.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))?;

    Ok((guard, dir.join("apex-gpt.log")))
}

/// Log to stderr, for the one-shot commands
pub fn init_stderr() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {e}"))
}
