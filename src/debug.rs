// Debug logging for LanPong
// File-based tracing output, enabled via the --debug flag

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// The terminal belongs to the game screen, so logs go here instead.
pub const LOG_FILE_PATH: &str = "/tmp/lanpong-debug.log";

/// Install the file-backed tracing subscriber.
///
/// - `enabled == false`: nothing is installed and every `tracing` macro is a no-op
/// - `enabled == true`: truncates the log file and logs at `RUST_LOG` level,
///   `debug` when unset
pub fn init(enabled: bool) -> io::Result<()> {
    if !enabled {
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE_PATH)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    tracing::info!(path = LOG_FILE_PATH, "LanPong debug log started");
    Ok(())
}

