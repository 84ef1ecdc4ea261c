//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::motor::{Joint, JointDems};
use util::maths::clamp;

use super::{ArmCtrlParams, IkError, JointAngles, NUM_JOINTS};
use crate::tracking::Location;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve for the joint angles pointing the arm at `location`.
///
/// This is an approximate, empirically tuned solution rather than an exact inverse of the arm's
/// geometry. With `K` the amplification and `c` the coupling correction:
///
/// - `base_raw = atan(x / y) * K`
/// - `base = base_raw + cos(base_raw) * c`
/// - `elbow = atan(z / (y / cos(base_raw))) * K + sin(base_raw) * c`
/// - `wrist = -base_raw * K + wrist_offset`
pub fn solve(location: &Location, params: &ArmCtrlParams) -> Result<JointAngles, IkError> {
    if !(location.y > 0.0) {
        return Err(IkError::NotInFront(location.y));
    }

    let k = params.amplification;
    let c = params.coupling_correction_rad;

    let base_raw = (location.x / location.y).atan() * k;

    let angles = JointAngles {
        base_rad: base_raw + base_raw.cos() * c,
        elbow_rad: (location.z / (location.y / base_raw.cos())).atan() * k + base_raw.sin() * c,
        wrist_rad: -base_raw * k + params.wrist_offset_rad,
    };

    let joints = [Joint::Base, Joint::Elbow, Joint::Wrist];
    for (joint, value) in joints.iter().zip(angles.as_array().iter()) {
        if !value.is_finite() {
            return Err(IkError::NonFinite(*joint));
        }
    }

    Ok(angles)
}

/// Limit a joint value to the inclusive range `[lower, upper]`.
pub fn clamp_joint(value: f64, lower: f64, upper: f64) -> f64 {
    clamp(value, lower, upper)
}

/// Convert angles into whole degree demands, limiting each joint to its range.
///
/// Returns the demands and which joints were limited (base, elbow, wrist).
pub fn limit_to_dems(
    angles: &JointAngles,
    params: &ArmCtrlParams,
) -> (JointDems, [bool; NUM_JOINTS]) {
    let limits = [
        params.base_limits_deg,
        params.elbow_limits_deg,
        params.wrist_limits_deg,
    ];

    let mut dems = [0i32; NUM_JOINTS];
    let mut limited = [false; NUM_JOINTS];

    for (i, value_rad) in angles.as_array().iter().enumerate() {
        let value_deg = value_rad.to_degrees();
        let clamped_deg = clamp_joint(value_deg, limits[i][0], limits[i][1]);

        limited[i] = clamped_deg != value_deg;
        dems[i] = clamped_deg.round() as i32;
    }

    (JointDems::new(dems[0], dems[1], dems[2]), limited)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
