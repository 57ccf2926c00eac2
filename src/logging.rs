use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Overrides `log_file` from the config when set.
pub const LOG_ENV: &str = "BMI_TRACKER_LOG";

/// Where log output should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Interactive mode: stderr belongs to the terminal UI, so only a file
    /// is acceptable.
    FileOnly,
    /// Scripted commands: fall back to stderr when no file is configured.
    Stderr,
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize tracing. Safe to call once per process.
pub fn init_tracing(target: LogTarget, log_file: Option<&Path>, default_level: &str) {
    let env_path = std::env::var(LOG_ENV).ok();
    let path = env_path.as_deref().map(Path::new).or(log_file);

    match (path, target) {
        (Some(path), _) => {
            let file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => file,
                Err(e) => {
                    eprintln!("Warning: Failed to open log file {}: {}", path.display(), e);
                    return;
                }
            };

            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(filter(default_level))
                .with(file_layer)
                .init();
        }
        (None, LogTarget::Stderr) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(default_level))
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        // No logging configured: leave the terminal UI undisturbed
        (None, LogTarget::FileOnly) => {}
    }
}
