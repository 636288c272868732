use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so stdout stays usable
/// for command output: human-readable on a terminal, JSON lines otherwise.
pub fn setup_logging() {
    let is_terminal = std::io::stderr().is_terminal();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = if is_terminal {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true)
            .try_init()
    };
    if result.is_ok() {
        tracing::debug!(
            "Logging initialized with level: {:?}",
            std::env::var("RUST_LOG")
        );
    }
}
