//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable holding the root directory of the software.
pub const SW_ROOT_ENV_VAR: &str = "SWERVE_SW_ROOT";

/// Get the root directory of the software, from which the `params` and `sessions` directories
/// are resolved.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
