//! Arm control module
//!
//! Converts a target location into joint demands for the motor controller and decides whether a
//! new demand is different enough from the last transmitted one to be worth sending.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd_filter;
mod inverse_kinematics;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
pub use cmd_filter::*;
pub use inverse_kinematics::*;
pub use params::*;

use crate::tracking::Location;
use comms_if::eqpt::motor::{Joint, JointDems};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of actuated joints on the arm.
pub const NUM_JOINTS: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint angles produced by the inverse kinematics, before limiting.
///
/// Units: radians
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub base_rad: f64,
    pub elbow_rad: f64,
    pub wrist_rad: f64,
}

/// Arm control module state
#[derive(Debug, Default, Clone)]
pub struct ArmCtrl {
    pub(crate) params: ArmCtrlParams,

    pub(crate) report: StatusReport,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Which joints were limited, ordered base, elbow, wrist.
    pub abs_pos_limited: [bool; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while solving for the joint angles.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IkError {
    #[error("Target is not in front of the arm (forward distance {0:.3} m)")]
    NotInFront(f64),

    #[error("Inverse kinematics produced a non-finite angle for the {0} joint")]
    NonFinite(Joint),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointAngles {
    /// The angles ordered base, elbow, wrist.
    pub fn as_array(&self) -> [f64; NUM_JOINTS] {
        [self.base_rad, self.elbow_rad, self.wrist_rad]
    }
}

impl ArmCtrl {
    pub fn new(params: ArmCtrlParams) -> Self {
        Self {
            params,
            report: StatusReport::default(),
        }
    }

    pub fn params(&self) -> &ArmCtrlParams {
        &self.params
    }

    /// Calculate the joint demands needed to reach towards the given target.
    ///
    /// The target is first pushed along the vertical axis by the reach offset so the arm responds
    /// more strongly than the literal detected position would require.
    pub fn proc(&mut self, target: &Location) -> Result<(JointDems, StatusReport), IkError> {
        self.report = StatusReport::default();

        let reach = Location::new(target.x, target.y, target.z + self.params.reach_offset_z_m);
        let angles = solve(&reach, &self.params)?;

        let (dems, limited) = limit_to_dems(&angles, &self.params);
        self.report.abs_pos_limited = limited;

        debug!(
            "ArmCtrl target {:?} -> angles {:?} -> dems {} (limited {:?})",
            target, angles, dems, limited
        );

        Ok((dems, self.report))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proc_applies_reach_offset() {
        let mut arm_ctrl = ArmCtrl::new(ArmCtrlParams::default());

        // Offset pulls the target down to the arm's horizontal plane
        let (dems, report) = arm_ctrl.proc(&Location::new(0.0, 1.0, 0.25)).unwrap();
        assert_eq!(dems, JointDems::new(15, 0, 90));
        assert_eq!(report.abs_pos_limited, [false; NUM_JOINTS]);
    }

    #[test]
    fn test_proc_reports_limits() {
        let mut arm_ctrl = ArmCtrl::new(ArmCtrlParams::default());

        let (dems, report) = arm_ctrl.proc(&Location::new(1.0, 1.0, 0.25)).unwrap();
        assert_eq!(dems.base_deg, 60);
        assert_eq!(report.abs_pos_limited, [true, false, false]);
    }
}
