//! Logging setup
//!
//! Every record is written to stdout and to the session's log file, prefixed with the seconds
//! elapsed since the session started and a coloured level tag.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::{fmt, path::PathBuf};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which are never logged below INFO.
const QUIET_TARGETS: [&str; 1] = ["zmq"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    LevelTooQuiet(LevelFilter),

    #[error("Cannot open the log file {0:?}: {1}")]
    LogFileError(PathBuf, std::io::Error),

    #[error("A logger has already been set: {0}")]
    AlreadySet(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `INFO` or more verbose. Only one logger may be set per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    check_min_level(min_level)?;

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(|e| LoggerInitError::LogFileError(session.log_file_path.clone(), e))?;

    let mut dispatch = fern::Dispatch::new().format(format_record).level(min_level);
    for target in QUIET_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, LevelFilter::Info);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadySet)?;

    info!("Logging initialised for {}", session.exec_name);
    if let Some(epoch) = session::epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_min_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level));
    }

    Ok(())
}

fn format_record(out: fern::FormatCallback, message: &fmt::Arguments, record: &Record) {
    let elapsed_s = session::elapsed_seconds().unwrap_or(0.0);
    let tag = level_tag(record.level());

    // Debug and trace records also show where they came from
    if record.level() > Level::Info {
        out.finish(format_args!(
            "[{:10.4} {}] {}: {}",
            elapsed_s,
            tag,
            record.target(),
            message
        ))
    } else {
        out.finish(format_args!("[{:10.4} {}] {}", elapsed_s, tag, message))
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERR".red().bold(),
        Level::Warn => "WRN".yellow(),
        Level::Info => "INF".normal(),
        Level::Debug => "DBG".dimmed(),
        Level::Trace => "TRC".dimmed().italic(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_min_level() {
        assert!(matches!(
            check_min_level(LevelFilter::Warn),
            Err(LoggerInitError::LevelTooQuiet(LevelFilter::Warn))
        ));
        assert!(check_min_level(LevelFilter::Off).is_err());
        assert!(check_min_level(LevelFilter::Info).is_ok());
        assert!(check_min_level(LevelFilter::Trace).is_ok());
    }
}
