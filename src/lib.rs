//! # ncsend
//!
//! Uploads NC programs to CNC controllers over the CSAV TCP file transfer
//! protocol.
//!
//! ## Architecture
//!
//! ncsend is organized as a workspace with multiple crates:
//!
//! 1. **ncsend-core** - Error types
//! 2. **ncsend-communication** - Frame protocol, TCP transport, transfer session
//! 3. **ncsend-settings** - Controller/connection configuration and persistence
//! 4. **ncsend** - Command-line binary that integrates all crates

pub use ncsend_communication::{
    build, checksum, interpret, validate, CancellationToken, Frame, LineEnding, ProgramName,
    ProgramSender, SessionState, TransferOutcome, TransferRequest, TransferSession,
};
pub use ncsend_core::{ConnectionError, Error, Result, ValidationError};
pub use ncsend_settings::{default_config_path, TransferConfig};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Version string for `--version`, with the build date
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

/// Initialize logging
///
/// Sets up structured logging with:
/// - `RUST_LOG` environment variable support
/// - INFO by default, DEBUG when `verbose` is set
/// - Output on stderr, leaving stdout for command output
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Read the program text to send
pub fn read_program(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::other(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Message shown when a program file name is rejected
pub fn validation_message(err: &ValidationError) -> String {
    format!("Unable to send file: {}", err)
}
