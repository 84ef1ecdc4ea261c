//! # Arm library
//!
//! Perception to actuation core of the arm: locates the target with a stereo camera pair, checks
//! the track is plausible, converts it to joint demands and drives the motor controller, all under
//! the control of the state manager.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control - inverse kinematics, joint limits and command hysteresis
pub mod arm_ctrl;

/// Camera client - provides stereo frame pairs
pub mod cam_client;

/// Control loop - the orchestrator running on its own thread
pub mod control_loop;

/// Diagnostic log of command decisions
pub mod diag_log;

/// Recoverable fault type
pub mod fault;

/// Motor client - serial link to the motor controller board
pub mod motor_client;

/// Executable parameters
pub mod params;

/// State manager - operational state and fault log
pub mod state_mgr;

/// Tracking - triangulation, track history and validation
pub mod tracking;

/// User interface sink
pub mod ui;

/// Vision - locates the target in a frame
pub mod vision;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use fault::Fault;
