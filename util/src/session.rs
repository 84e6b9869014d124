//! Session management
//!
//! A session is one run of an executable. Starting it fixes the epoch that log timestamps are
//! measured from and creates a timestamped directory holding the run's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::{host, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Start time of the session, set once per process.
static EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html.
const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locations belonging to the current session.
#[derive(Clone, Debug)]
pub struct Session {
    /// Name of the executable which started the session
    pub exec_name: String,

    /// Directory holding everything written during the session
    pub session_root: PathBuf,

    /// Log file inside `session_root`
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (SWERVE_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("A session has already been started by this process")]
    AlreadyStarted,

    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session in `$SWERVE_SW_ROOT/{sessions_dir}`.
    ///
    /// Only one session may be started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let sw_root = host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, sw_root.join(sessions_dir))
    }

    /// Start the session in an explicit directory.
    ///
    /// The session directory is named `{exec_name}_{timestamp}`.
    pub fn new_in<P: AsRef<Path>>(exec_name: &str, sessions_dir: P) -> Result<Self, SessionError> {
        EPOCH
            .try_init_once(Utc::now)
            .map_err(|_| SessionError::AlreadyStarted)?;
        let epoch = EPOCH.get().ok_or(SessionError::AlreadyStarted)?;

        let session_root = sessions_dir.as_ref().join(format!(
            "{}_{}",
            exec_name,
            epoch.format(DIR_TIMESTAMP_FORMAT)
        ));

        fs::create_dir_all(&session_root)
            .map_err(|e| SessionError::CannotCreateDir(session_root.clone(), e))?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));

        Ok(Session {
            exec_name: exec_name.into(),
            session_root,
            log_file_path,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session started, or `None` if no session has been started.
pub fn elapsed_seconds() -> Option<f64> {
    EPOCH
        .get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
}

/// Start time of the session, if one has been started.
pub fn epoch() -> Option<&'static DateTime<Utc>> {
    EPOCH.get()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_once_per_process() {
        let dir = std::env::temp_dir().join("swerve_session_test");

        let session = Session::new_in("test_exec", &dir).unwrap();

        assert!(session.session_root.starts_with(&dir));
        assert!(session.session_root.is_dir());
        assert_eq!(
            session.log_file_path.file_name().and_then(|n| n.to_str()),
            Some("test_exec.log")
        );
        assert!(epoch().is_some());
        assert!(elapsed_seconds().unwrap() >= 0.0);

        assert!(matches!(
            Session::new_in("test_exec", &dir),
            Err(SessionError::AlreadyStarted)
        ));

        fs::remove_dir_all(&session.session_root).ok();
    }
}
