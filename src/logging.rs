//! Process-level logging setup for the `syscfg` binary.

use std::sync::OnceLock;
use tracing::Level;

/// Environment variable holding the default log level.
pub const LOG_ENV: &str = "SYSCFG_LOG";

static INIT: OnceLock<()> = OnceLock::new();

/// Parse a level name. Unknown names yield `None`.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Level from `-v`/`-q` counts, falling back to `SYSCFG_LOG`, then `warn`.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => std::env::var(LOG_ENV)
            .ok()
            .and_then(|v| parse_level(&v))
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber. Only the first call has any effect.
pub fn init(level: Level) {
    if INIT.get().is_some() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = INIT.set(());
}
