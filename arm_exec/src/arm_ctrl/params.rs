//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmCtrlParams {
    // ---- KINEMATICS ----

    /// Gain applied to the detected angles so small displacements give larger joint motion.
    pub amplification: f64,

    /// Coupling correction between the base and elbow joints.
    ///
    /// Units: radians
    pub coupling_correction_rad: f64,

    /// Wrist angle when the target is straight ahead.
    ///
    /// Units: radians
    pub wrist_offset_rad: f64,

    /// Offset added to the target's vertical position before solving.
    ///
    /// Units: meters
    pub reach_offset_z_m: f64,

    // ---- CAPABILITIES ----

    /// Base joint range `[lower, upper]`.
    ///
    /// Units: degrees
    pub base_limits_deg: [f64; 2],

    /// Elbow joint range `[lower, upper]`.
    ///
    /// Units: degrees
    pub elbow_limits_deg: [f64; 2],

    /// Wrist joint range `[lower, upper]`.
    ///
    /// Units: degrees
    pub wrist_limits_deg: [f64; 2],

    // ---- TRANSMISSION ----

    /// A new demand is only sent if a joint moved more than this from the last sent demand.
    ///
    /// Units: degrees
    pub resend_threshold_deg: i32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmCtrlParams {
    fn default() -> Self {
        Self {
            amplification: 1.5,
            coupling_correction_rad: PI / 12.0,
            wrist_offset_rad: PI / 2.0,
            reach_offset_z_m: -0.25,
            base_limits_deg: [-60.0, 60.0],
            elbow_limits_deg: [-35.0, 55.0],
            wrist_limits_deg: [-180.0, 180.0],
            resend_threshold_deg: 15,
        }
    }
}
