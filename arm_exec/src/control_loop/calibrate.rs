//! Calibration step of the control loop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use serde::Serialize;

use comms_if::eqpt::motor::HOME_DEMS;

use super::ControlLoop;
use crate::{
    cam_client::{CamClientError, CameraPair},
    motor_client::{MotorClientError, MotorPort},
    state_mgr::ArmState,
    tracking::{base_azimuths, verify_track},
    ui::UiSink,
    vision::Vision,
    Fault,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of a successful calibration, archived in the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibSummary {
    pub num_samples: usize,

    /// Units: meters
    pub mean_forward_m: f64,

    /// Sum of the left minus right ray azimuth in the base frame, signed so it's positive for a
    /// correctly mounted pair.
    ///
    /// Units: radians
    pub sum_disparity_rad: f64,

    pub cams_swapped: bool,
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
    pub(super) fn calibrate(&mut self) -> Result<(), Fault> {
        self.check_equipment_with_retry()?;

        self.history.clear();
        let summary = self.detect_swap()?;

        // Handshake
        self.motor.command(ArmState::Calibrate, HOME_DEMS)?;

        if !self.state_mgr.ready() {
            warn!(
                "Calibration finished but the arm is now in {}, not moving to READY",
                self.state_mgr.get_state()
            );
            return Ok(());
        }

        self.motor.command(ArmState::Ready, HOME_DEMS)?;
        self.cmd_filter.reset();
        self.history.clear();

        debug!("Calibration summary: {:?}", summary);
        util::session::save_with_timestamp("calibration/calib.json", summary);

        self.post("Calibration successful", false);
        Ok(())
    }

    /// Check the equipment, reconnecting between attempts.
    fn check_equipment_with_retry(&mut self) -> Result<(), Fault> {
        let attempts = self.params.calib_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.check_equipment() {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    self.post(&format!("{}; reconnecting", e), false);
                    self.reconnect_equipment();
                    attempt += 1;
                }
                Err(e) => return Err(Fault::Calibration(e.to_string())),
            }
        }
    }

    /// Both devices must be connected and the cameras must deliver a pair.
    fn check_equipment(&mut self) -> Result<(), Fault> {
        if !self.cams.is_connected() {
            return Err(CamClientError::NotConnected.into());
        }
        if !self.motor.is_connected() {
            return Err(MotorClientError::NotConnected.into());
        }

        self.cams.capture_pair()?;
        Ok(())
    }

    /// Sample the target and swap the cameras if they are mounted the wrong way round.
    ///
    /// With the cameras swapped the rays only meet behind the arm, and once the mount yaw is undone
    /// the left ray points further left than the right one. Both forms of evidence must agree.
    fn detect_swap(&mut self) -> Result<CalibSummary, Fault> {
        let num_samples = self.params.calib_samples.max(1);
        let baseline_sign =
            (self.tracking_params.right_cam_offset_m[0] - self.tracking_params.left_cam_offset_m[0])
                .signum();

        let mut sum_forward_m = 0.0;
        let mut sum_disparity_rad = 0.0;

        for _ in 0..num_samples {
            let obs = self.observe()?;
            self.history.push(obs.timestamp_s, obs.location);
            verify_track(&self.history, &self.tracking_params)?;

            sum_forward_m += obs.location.y;
            let (left_az, right_az) =
                base_azimuths(&obs.left_ray, &obs.right_ray, &self.tracking_params);
            sum_disparity_rad += (left_az - right_az) * baseline_sign;
        }

        let cams_swapped = if sum_forward_m > 0.0 && sum_disparity_rad > 0.0 {
            false
        } else if sum_forward_m < 0.0 && sum_disparity_rad < 0.0 {
            true
        } else {
            return Err(Fault::Calibration(format!(
                "camera swap evidence disagrees (forward {:.3} m, disparity {:.4} rad)",
                sum_forward_m, sum_disparity_rad
            )));
        };

        if cams_swapped {
            self.cams.swap();
            self.history.clear();
            self.post("Cameras are swapped, exchanging left and right", false);
        }

        Ok(CalibSummary {
            num_samples,
            mean_forward_m: sum_forward_m / num_samples as f64,
            sum_disparity_rad,
            cams_swapped,
        })
    }
}
