// src/logging.rs

use crate::errors::{CortexError, CortexResult};
use flexi_logger::{FileSpec, Logger, LoggerHandle};
use std::path::Path;

/// Starts the file logger. The terminal owns stdout, so everything goes
/// to `cortex.log` in the data directory. The returned handle must stay
/// alive for the duration of the program.
pub fn init(level: &str, dir: &Path) -> CortexResult<LoggerHandle> {
    let handle = Logger::try_with_str(level)
        .map_err(|e| CortexError::config_error(format!("Invalid log level: {}", e)))?
        .log_to_file(FileSpec::default().directory(dir).basename("cortex"))
        .start()
        .map_err(|e| CortexError::config_error(format!("Failed to start logger: {}", e)))?;

    Ok(handle)
}
