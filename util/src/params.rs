//! Parameter file loading
//!
//! Parameters are TOML files deserialised straight into the owning module's parameter struct.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Directory of the parameter files, relative to the software root.
pub const PARAMS_DIR: &str = "params";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("PARRY_SW_ROOT is not set, cannot locate the parameter files")]
    SwRootNotSet,

    #[error("Could not read the parameter file {0:?}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Invalid parameter file {0:?}: {1}")]
    ParseError(PathBuf, toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file from `$PARRY_SW_ROOT/params`.
///
/// Absolute paths are used as given.
pub fn load<P: DeserializeOwned>(file_name: &str) -> Result<P, LoadError> {
    let path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?
        .join(PARAMS_DIR)
        .join(file_name);

    load_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_path<P: DeserializeOwned, F: AsRef<Path>>(path: F) -> Result<P, LoadError> {
    let path = path.as_ref();

    let text = fs::read_to_string(path).map_err(|e| LoadError::ReadError(path.into(), e))?;

    toml::from_str(&text).map_err(|e| LoadError::ParseError(path.into(), e))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
