//! Recoverable faults
//!
//! Any of these raised during a control loop iteration drops the arm to STANDBY and is recorded in
//! the state manager's fault log. None of them stops the process.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{
    arm_ctrl::IkError, cam_client::CamClientError, motor_client::MotorClientError,
    tracking::TrackingError, vision::VisionError,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Ik(#[from] IkError),

    #[error(transparent)]
    Motor(#[from] MotorClientError),

    #[error(transparent)]
    Cam(#[from] CamClientError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("Calibration failed: {0}")]
    Calibration(String),
}
