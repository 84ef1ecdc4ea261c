//! Tracking step of the control loop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{trace, warn};

use comms_if::eqpt::cam::Detection;

use super::ControlLoop;
use crate::{
    arm_ctrl::CmdDecision,
    cam_client::CameraPair,
    motor_client::MotorPort,
    state_mgr::ArmState,
    tracking::{ray_from_pixel, triangulate, verify_track, CameraRay, Location},
    ui::UiSink,
    vision::Vision,
    Fault,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The target as seen by one stereo capture.
#[derive(Debug, Clone, Copy)]
pub(super) struct Observation {
    /// Units: seconds since the loop was created
    pub timestamp_s: f64,
    pub left_ray: CameraRay,
    pub right_ray: CameraRay,
    pub location: Location,
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
    /// Capture a stereo pair and locate the target.
    pub(super) fn observe(&mut self) -> Result<Observation, Fault> {
        let timestamp_s = self.epoch.elapsed().as_secs_f64();
        let (left_frame, right_frame) = self.cams.capture_pair()?;

        let left = self.vision.locate(&left_frame)?;
        let right = self.vision.locate(&right_frame)?;

        let left_ray = self.ray(&left);
        let right_ray = self.ray(&right);
        let location = triangulate(&left_ray, &right_ray, &self.tracking_params)?;

        trace!("Target at {:?}", location);
        self.ui.show_track(&left_ray, &right_ray, &location);

        Ok(Observation {
            timestamp_s,
            left_ray,
            right_ray,
            location,
        })
    }

    /// Track the target and, when ACTIVE, steer the arm towards it.
    pub(super) fn track(&mut self, state: ArmState) -> Result<(), Fault> {
        let obs = self.observe()?;

        self.history.push(obs.timestamp_s, obs.location);
        verify_track(&self.history, &self.tracking_params)?;

        if state != ArmState::Active {
            return self.keepalive(state);
        }

        let (dems, _) = self.arm_ctrl.proc(&obs.location)?;
        let decision = self.cmd_filter.check(&dems);

        if let Err(e) = self.diag_log.record(decision, &dems) {
            warn!("Could not write to the diagnostic log: {}", e);
        }

        if decision == CmdDecision::Send {
            self.motor.command(ArmState::Active, dems)?;
            self.cmd_filter.record_sent(dems);
        }

        Ok(())
    }

    fn ray(&self, detection: &Detection) -> CameraRay {
        ray_from_pixel(
            detection.centre_px[0],
            detection.centre_px[1],
            self.cams.fov_rad(),
            self.cams.resolution(),
        )
    }
}
