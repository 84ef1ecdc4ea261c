//! # Camera Client
//!
//! The camera client provides synchronised frame pairs from the left and right cameras.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod replay;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use comms_if::eqpt::cam::{CamId, Resolution};

pub use replay::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A stereo pair of cameras.
pub trait CameraPair {
    type Frame;

    fn connect(&mut self) -> Result<(), CamClientError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Capture one frame from each camera, returned as `(left, right)`.
    fn capture_pair(&mut self) -> Result<(Self::Frame, Self::Frame), CamClientError>;

    /// Exchange the logical left and right roles of the cameras.
    fn swap(&mut self);

    fn resolution(&self) -> Resolution;

    /// Horizontal field of view.
    ///
    /// Units: radians
    fn fov_rad(&self) -> f64;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamParams {
    /// Directory holding recorded frame pairs, relative paths are relative to the software root.
    pub replay_dir: PathBuf,

    pub resolution: Resolution,

    /// Horizontal field of view.
    ///
    /// Units: radians
    pub fov_horizontal_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CamClientError {
    #[error("The cameras are not connected")]
    NotConnected,

    #[error("Could not read the frame directory {0:?}: {1}")]
    DirReadError(PathBuf, std::io::Error),

    #[error("No complete stereo pairs found in {0:?}")]
    NoFrames(PathBuf),

    #[error("Could not load the {0:?} frame {1:?}: {2}")]
    ImageLoadError(CamId, PathBuf, image::ImageError),

    #[error("The {cam:?} frame is {found:?}, expected {expected:?}")]
    ResolutionMismatch {
        cam: CamId,
        expected: Resolution,
        found: Resolution,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CamParams {
    fn default() -> Self {
        Self {
            replay_dir: PathBuf::from("replay"),
            resolution: Resolution::new(640, 480),
            fov_horizontal_rad: 60f64.to_radians(),
        }
    }
}
