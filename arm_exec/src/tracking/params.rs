//! Parameters structure for tracking

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default number of samples kept in the track history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 15;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingParams {
    // ---- GEOMETRY ----

    /// Position of the left camera's optical centre in the arm base frame.
    ///
    /// Units: meters
    pub left_cam_offset_m: [f64; 3],

    /// Position of the right camera's optical centre in the arm base frame.
    ///
    /// The cameras are mirror mounted, so this is normally the left offset with `x` negated.
    ///
    /// Units: meters
    pub right_cam_offset_m: [f64; 3],

    /// Yaw of the left camera's boresight, positive towards `+x`. The right camera is mounted with
    /// the mirrored yaw.
    ///
    /// Units: radians
    pub cam_yaw_rad: f64,

    /// Pitch of both cameras' boresights, positive up.
    ///
    /// Units: radians
    pub cam_pitch_rad: f64,

    // ---- TRIANGULATION ----

    /// Rays whose normal equation denominator is below this value are treated as parallel.
    pub parallel_epsilon: f64,

    /// Maximum allowed distance between the closest points of the two rays.
    ///
    /// `None` disables the check.
    ///
    /// Units: meters
    pub max_ray_separation_m: Option<f64>,

    // ---- HISTORY ----

    /// Number of samples kept in the track history.
    pub history_capacity: usize,

    /// Maximum time between two consecutive samples.
    ///
    /// Units: seconds
    pub max_time_gap_s: f64,

    /// Maximum distance travelled between two consecutive samples.
    ///
    /// Units: meters
    pub max_step_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            left_cam_offset_m: [-0.1, 0.0, 0.0],
            right_cam_offset_m: [0.1, 0.0, 0.0],
            cam_yaw_rad: 0.0,
            cam_pitch_rad: 0.0,
            parallel_epsilon: 1e-9,
            max_ray_separation_m: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_time_gap_s: 0.2,
            max_step_m: 1.0,
        }
    }
}
