//! # Motor test
//!
//! Sends a single command to the motor controller and prints the decoded acknowledgement. Useful
//! for checking the wiring and the joint limits of the arm on the bench.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::info;
use structopt::StructOpt;

use arm_lib::{
    motor_client::{MotorClient, MotorClientError, SerialMotorPort},
    params::ArmExecParams,
};
use comms_if::eqpt::motor::{ArmState, JointDems};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "motor_test", about = "Send one command to the motor controller")]
struct Cli {
    /// State code sent with the command (0 OFF, 1 STANDBY, 2 CALIBRATE, 3 READY, 4 ACTIVE)
    state: u8,

    /// Units: degrees
    #[structopt(allow_hyphen_values = true)]
    base_deg: i32,

    /// Units: degrees
    #[structopt(allow_hyphen_values = true)]
    elbow_deg: i32,

    /// Units: degrees
    #[structopt(allow_hyphen_values = true)]
    wrist_deg: i32,

    /// Parameter file, relative to the parameters directory
    #[structopt(long, default_value = "arm_exec.toml")]
    params: String,

    /// Serial port to use instead of the one in the parameter file
    #[structopt(long)]
    port: Option<String>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Cli {
    /// The state and demands to send.
    fn command(&self) -> Result<(ArmState, JointDems), Report> {
        let code = self.state;
        let state =
            ArmState::from_code(code).ok_or_else(|| eyre!("{} is not a valid state code", code))?;

        Ok((
            state,
            JointDems::new(self.base_deg, self.elbow_deg, self.wrist_deg),
        ))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    let mut cli = Cli::from_args();

    let session =
        Session::new("motor_test", "sessions").wrap_err("Failed to create the session")?;
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    let mut params: ArmExecParams =
        util::params::load(&cli.params).wrap_err("Could not load arm_exec params")?;

    if let Some(port) = cli.port.take() {
        params.motor.port_name = port;
    }

    let (state, dems) = cli.command()?;

    let mut client = MotorClient::new(SerialMotorPort::new(&params.motor));
    client
        .connect()
        .wrap_err_with(|| format!("Could not open {}", params.motor.port_name))?;

    client
        .send(state, dems)
        .wrap_err("Could not send the command")?;
    info!("Sent {} {}", state, dems);

    match client.receive_ack() {
        Ok(ack) => println!("Acknowledged, no faults (code {:03b})", ack.code()),
        Err(e @ MotorClientError::JointFault { .. }) => println!("{}", e),
        Err(e) => return Err(e).wrap_err("Could not receive the acknowledgement"),
    }

    client.disconnect();
    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_command_with_port_override() {
        let mut cli = Cli::from_iter_safe(&[
            "motor_test",
            "4",
            "15",
            "20",
            "90",
            "--port",
            "/dev/serial/by-id/usb-Arduino_Uno-if00",
        ])
        .unwrap();

        assert_eq!(
            cli.port.take().as_deref(),
            Some("/dev/serial/by-id/usb-Arduino_Uno-if00")
        );

        let (state, dems) = cli.command().unwrap();
        assert_eq!(state, ArmState::Active);
        assert_eq!(dems, JointDems::new(15, 20, 90));
    }

    #[test]
    fn test_invalid_state_code() {
        let cli = Cli::from_iter_safe(&["motor_test", "9", "0", "0", "0"]).unwrap();

        let err = cli.command().unwrap_err();
        assert_eq!(err.to_string(), "9 is not a valid state code");
    }
}
