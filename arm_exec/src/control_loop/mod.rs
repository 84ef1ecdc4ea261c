//! # Control loop
//!
//! The control loop owns the cameras, the vision processing and the motor link, and runs on its
//! own thread until the state manager reaches OFF. Each iteration does exactly one of:
//!
//! - CALIBRATE: check the equipment (reconnecting between attempts), sample the target to decide
//!   whether the cameras are swapped, handshake with the motor controller and move to READY.
//! - READY or ACTIVE: locate the target, validate the track and either keep the controller alive
//!   (READY) or send it new joint demands (ACTIVE).
//! - STANDBY: keep the controller alive.
//!
//! Any [`Fault`] raised in an iteration is caught once at the end of it, logged, recorded in the
//! state manager (dropping to STANDBY) and followed by a STANDBY keepalive.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calibrate;
mod track;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{Local, NaiveTime, Timelike};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use comms_if::eqpt::motor::HOME_DEMS;

use crate::{
    arm_ctrl::{ArmCtrl, CmdFilter},
    cam_client::CameraPair,
    diag_log::DiagLog,
    motor_client::{MotorClient, MotorPort},
    params::{ArmExecParams, ControlParams},
    state_mgr::{ArmState, StateMgr},
    tracking::{TrackHistory, TrackingParams},
    ui::UiSink,
    vision::Vision,
    Fault,
};

pub use calibrate::CalibSummary;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The external collaborators driven by the control loop.
pub struct Equipment<C, V, P, U> {
    pub cams: C,
    pub vision: V,
    pub motor_port: P,
    pub ui: U,
    pub diag_log: DiagLog,
}

pub struct ControlLoop<C, V, P, U> {
    params: ControlParams,
    tracking_params: TrackingParams,

    state_mgr: Arc<StateMgr>,

    cams: C,
    vision: V,
    motor: MotorClient<P>,
    ui: U,
    diag_log: DiagLog,

    arm_ctrl: ArmCtrl,
    cmd_filter: CmdFilter,
    history: TrackHistory,

    /// State observed at the end of the previous iteration.
    last_state: Option<ArmState>,

    /// Time origin of the track sample timestamps.
    epoch: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, V, P, U> ControlLoop<C, V, P, U>
where
    C: CameraPair,
    V: Vision<C::Frame>,
    P: MotorPort,
    U: UiSink,
{
    /// Create the loop.
    ///
    /// The equipment is connected here, failures are only warnings since the calibration step
    /// retries the connections.
    pub fn new(
        params: &ArmExecParams,
        state_mgr: Arc<StateMgr>,
        eqpt: Equipment<C, V, P, U>,
    ) -> Self {
        let mut control_loop = Self {
            params: params.control.clone(),
            tracking_params: params.tracking.clone(),
            state_mgr,
            cams: eqpt.cams,
            vision: eqpt.vision,
            motor: MotorClient::new(eqpt.motor_port),
            ui: eqpt.ui,
            diag_log: eqpt.diag_log,
            arm_ctrl: ArmCtrl::new(params.arm_ctrl.clone()),
            cmd_filter: CmdFilter::new(params.arm_ctrl.resend_threshold_deg),
            history: TrackHistory::new(params.tracking.history_capacity),
            last_state: None,
            epoch: Instant::now(),
        };

        control_loop.connect_equipment();
        control_loop
    }

    /// Run iterations until the state manager is stopped, then shut the equipment down.
    pub fn run(&mut self) {
        info!("Control loop started");

        // Unusable periods are rejected when the parameters are loaded
        let period = Duration::try_from_secs_f64(self.params.cycle_period_s).unwrap_or_default();

        while self.state_mgr.get_state() > ArmState::Off {
            let cycle_start = Instant::now();

            self.step();

            if let Some(remaining) = period.checked_sub(cycle_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        self.shutdown();
    }

    /// Run a single iteration.
    pub fn step(&mut self) {
        let state = self.state_mgr.get_state();

        let result = match state {
            ArmState::Calibrate => self.calibrate(),
            ArmState::Ready | ArmState::Active => self.track(state),
            ArmState::Standby => self.keepalive(ArmState::Standby),
            ArmState::Off => Ok(()),
        };

        if let Err(fault) = result {
            self.handle_fault(fault);
        }

        self.handle_transition();
    }

    /// Send the OFF command and release the equipment.
    pub fn shutdown(&mut self) {
        info!("Cleaning up...");

        if let Err(e) = self.motor.command(ArmState::Off, HOME_DEMS) {
            warn!("Could not send the OFF command: {}", e);
        }

        self.motor.disconnect();
        self.cams.disconnect();

        if let Err(e) = self.diag_log.close() {
            warn!("Could not close the diagnostic log: {}", e);
        }

        self.ui.set_state(ArmState::Off);
        info!("Control loop complete");
    }

    /// The track history, most recent first.
    pub fn history(&self) -> &TrackHistory {
        &self.history
    }

    fn keepalive(&mut self, state: ArmState) -> Result<(), Fault> {
        self.motor.command(state, HOME_DEMS)?;
        Ok(())
    }

    fn handle_fault(&mut self, fault: Fault) {
        let msg = fault.to_string();

        self.post(&msg, true);
        self.state_mgr.error(msg);

        if let Err(e) = self.motor.command(ArmState::Standby, HOME_DEMS) {
            warn!("Could not send the STANDBY keepalive after a fault: {}", e);
        }
    }

    fn handle_transition(&mut self) {
        let mut current = self.state_mgr.get_state();

        if self.last_state == Some(current) {
            return;
        }

        // Return the arm to its neutral pose when deactivated
        if self.last_state == Some(ArmState::Active) && current == ArmState::Ready {
            self.cmd_filter.reset();

            if let Err(e) = self.motor.command(ArmState::Active, HOME_DEMS) {
                self.handle_fault(e.into());
                current = self.state_mgr.get_state();
            }
        }

        self.last_state = Some(current);
        self.ui.set_state(current);
        self.post(&format!("State transition to {}", current), false);
    }

    fn connect_equipment(&mut self) {
        if let Err(e) = self.cams.connect() {
            warn!("Could not connect the cameras: {}", e);
        }
        if let Err(e) = self.motor.connect() {
            warn!("Could not connect the motor controller: {}", e);
        }
    }

    fn reconnect_equipment(&mut self) {
        self.cams.disconnect();
        self.motor.disconnect();
        self.connect_equipment();
    }

    /// Log a message and post it to the user interface.
    fn post(&mut self, msg: &str, is_error: bool) {
        if is_error {
            warn!("{}", msg);
        } else {
            info!("{}", msg);
        }

        self.ui
            .add_log(&format_log(msg, is_error, Local::now().time()));
    }
}

/// Prefix a message with the time and an error marker (`!!` for errors, `--` otherwise).
pub fn format_log(msg: &str, is_error: bool, time: NaiveTime) -> String {
    format!(
        "{:02}:{:02}:{:02}.{:06} {} {}",
        time.hour(),
        time.minute(),
        time.second(),
        time.nanosecond() / 1_000,
        if is_error { "!!" } else { "--" },
        msg
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_log() {
        let time = NaiveTime::from_hms_micro_opt(9, 3, 4, 5).unwrap();

        assert_eq!(format_log("hello", false, time), "09:03:04.000005 -- hello");
        assert_eq!(
            format_log("Calibration failed", true, time),
            "09:03:04.000005 !! Calibration failed"
        );
    }
}
