//! # Tracking module
//!
//! Turns a pair of camera detections into a 3D location of the target relative to the arm base,
//! keeps a short history of recent locations and checks that the history describes a physically
//! plausible motion.
//!
//! Frame convention (arm base frame): `x` lateral (positive to the arm's right), `y` forward, `z`
//! up. Units are meters and radians throughout.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod geometry;
mod history;
mod params;
mod validate;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use geometry::*;
pub use history::*;
pub use params::*;
pub use validate::*;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Location of the target relative to the arm base.
///
/// Units: meters
pub type Location = nalgebra::Point3<f64>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Direction from a camera's optical centre through a detected pixel, relative to the camera's
/// boresight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRay {
    /// Horizontal angle, positive to the right.
    ///
    /// Units: radians
    pub angle_x_rad: f64,

    /// Vertical angle, positive up.
    ///
    /// Units: radians
    pub angle_y_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during tracking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    #[error("Camera rays are parallel or close to it (denominator {0:e}), cannot locate target")]
    DegenerateRays(f64),

    #[error(
        "Cameras localise the target {separation_m:.3} m apart, more than the {max_m} m allowed"
    )]
    RaysTooFarApart { separation_m: f64, max_m: f64 },

    #[error("Past time steps {first} and {second} are too far apart ({gap_s:.3} s)")]
    TimeGap {
        first: usize,
        second: usize,
        gap_s: f64,
    },

    #[error("Locations at past time steps {first} and {second} are too far apart ({dist_m:.3} m)")]
    StepTooLarge {
        first: usize,
        second: usize,
        dist_m: f64,
    },
}

impl CameraRay {
    pub fn new(angle_x_rad: f64, angle_y_rad: f64) -> Self {
        Self {
            angle_x_rad,
            angle_y_rad,
        }
    }
}
