//! # Arm Executable Parameters
//!
//! This module provides parameters for the arm executable. Every group and field has a default,
//! so a parameter file only needs to hold the values that differ from them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    arm_ctrl::ArmCtrlParams, cam_client::CamParams, motor_client::MotorParams,
    tracking::TrackingParams, vision::VisionParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmExecParams {
    /// Serial link to the motor controller
    pub motor: MotorParams,

    /// Stereo cameras
    pub cam: CamParams,

    /// Target segmentation
    pub vision: VisionParams,

    /// Triangulation and track validation
    pub tracking: TrackingParams,

    /// Inverse kinematics and command transmission
    pub arm_ctrl: ArmCtrlParams,

    /// The control loop itself
    pub control: ControlParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    /// Minimum duration of one control loop iteration.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of connection checks made when calibrating before giving up.
    pub calib_attempts: usize,

    /// Number of stereo samples taken when calibrating.
    pub calib_samples: usize,

    /// File name of the command decision log, inside the session directory.
    pub diag_log_name: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("control.cycle_period_s must be finite and not negative, found {0}")]
    InvalidCyclePeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmExecParams {
    /// Check the values which deserialise fine but can't be used.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let period = self.control.cycle_period_s;
        if !period.is_finite() || period < 0.0 {
            return Err(ParamsError::InvalidCyclePeriod(period));
        }

        Ok(())
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            calib_attempts: 2,
            calib_samples: 5,
            diag_log_name: "commands.log".into(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm_exec.toml");
        fs::write(
            &path,
            "[motor]\nport_name = \"/dev/ttyUSB3\"\n\n\
             [tracking]\nmax_ray_separation_m = 0.1\n\n\
             [arm_ctrl]\nresend_threshold_deg = 10\n",
        )
        .unwrap();

        let params: ArmExecParams = util::params::load_path(&path).unwrap();

        assert_eq!(params.motor.port_name, "/dev/ttyUSB3");
        assert_eq!(params.motor.baud_rate, MotorParams::default().baud_rate);
        assert_eq!(params.tracking.max_ray_separation_m, Some(0.1));
        assert_eq!(params.tracking.max_step_m, 1.0);
        assert_eq!(params.arm_ctrl.resend_threshold_deg, 10);
        assert_eq!(params.arm_ctrl.amplification, 1.5);
        assert_eq!(params.control, ControlParams::default());
    }

    #[test]
    fn test_shipped_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../params/arm_exec.toml");
        let params: ArmExecParams = util::params::load_path(path).unwrap();

        assert_eq!(params.tracking.history_capacity, 15);
        assert_eq!(params.arm_ctrl.base_limits_deg, [-60.0, 60.0]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_unusable_cycle_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm_exec.toml");

        for value in &["inf", "nan", "-0.05"] {
            fs::write(&path, format!("[control]\ncycle_period_s = {}\n", value)).unwrap();
            let params: ArmExecParams = util::params::load_path(&path).unwrap();

            assert!(
                matches!(params.validate(), Err(ParamsError::InvalidCyclePeriod(_))),
                "{} was accepted",
                value
            );
        }
    }
}
