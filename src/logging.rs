//! Logger bootstrap for the binary. The library only uses the `log` facade.

use anyhow::{bail, Context, Result};
use flexi_logger::{Logger, LoggerHandle};

/// `debug` in debug builds, `warn` otherwise
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    }
}

/// Start logging to stderr. `RUST_LOG` wins over `level` when set.
///
/// The returned handle must be kept alive for the lifetime of the process.
pub fn init_logging(level: &str) -> Result<LoggerHandle> {
    let level = normalize_level(level)?;
    Logger::try_with_env_or_str(level)
        .with_context(|| format!("invalid log spec `{level}`"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("failed to start logger")
}

fn normalize_level(level: &str) -> Result<&'static str> {
    Ok(match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" => "off",
        other => bail!("unsupported log level `{other}`; expected trace|debug|info|warn|error|off"),
    })
}
