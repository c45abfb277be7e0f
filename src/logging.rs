use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "tailorpulse.log";

/// Resolve the log directory: `TAILORPULSE_LOG_DIR`, then settings, then the user cache dir.
pub fn log_dir(configured: Option<&Path>) -> PathBuf {
    std::env::var_os("TAILORPULSE_LOG_DIR")
        .map(PathBuf::from)
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("tailorpulse")
        })
}

/// Install the global subscriber. The file layer is always on; `stderr` adds a
/// console layer for commands that do not own the screen. Keep the guard alive
/// for the life of the program so buffered lines are flushed.
pub fn init(dir: &Path, stderr: bool) -> WorkerGuard {
    let _ = std::fs::create_dir_all(dir);
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console = stderr.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tailorpulse=info,warn".into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(console)
        .try_init();

    guard
}
