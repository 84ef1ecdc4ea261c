//! # Motor Client
//!
//! This module provides the link to the motor controller board. Each command is answered by an
//! acknowledgement carrying the controller's joint fault bitmask, a non-zero bitmask is reported
//! as an error naming the faulted joints.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod serial;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::io;

use comms_if::eqpt::motor::{AckParseError, ArmState, Joint, JointDems, MotorAck, MotorCmd};

pub use serial::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A line based, blocking byte link to the motor controller.
pub trait MotorPort {
    /// Open the link.
    fn connect(&mut self) -> io::Result<()>;

    /// Close the link, does nothing if it's already closed.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Write a full line, `line` includes the terminating newline.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one line.
    ///
    /// If the read times out with no data an empty string is returned.
    fn read_line(&mut self) -> io::Result<String>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Motor link parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorParams {
    /// Name of the serial device the controller is attached to.
    pub port_name: String,

    pub baud_rate: u32,

    /// Read and write timeout.
    ///
    /// Units: milliseconds
    pub timeout_ms: u64,
}

/// Client for the motor controller.
pub struct MotorClient<P> {
    port: P,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MotorClientError {
    #[error("The motor controller is not connected")]
    NotConnected,

    #[error("Could not connect to the motor controller: {0}")]
    ConnectError(io::Error),

    #[error("Could not send command \"{cmd}\" to the motor controller: {source}")]
    SendError { cmd: MotorCmd, source: io::Error },

    #[error("Could not receive an acknowledgement from the motor controller: {0}")]
    RecvError(io::Error),

    #[error("Invalid acknowledgement from the motor controller: {0}")]
    InvalidAck(#[from] AckParseError),

    #[error("Motor controller reports a fault on {} (code {code:03b})", fault_list(.joints, .unknown_bits))]
    JointFault {
        joints: Vec<Joint>,
        unknown_bits: Vec<u32>,
        code: u32,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyACM0".into(),
            baud_rate: 9600,
            timeout_ms: 1000,
        }
    }
}

impl<P: MotorPort> MotorClient<P> {
    /// Create a new client over the given port, the port is not connected.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn connect(&mut self) -> Result<(), MotorClientError> {
        self.port.connect().map_err(MotorClientError::ConnectError)
    }

    pub fn disconnect(&mut self) {
        self.port.disconnect()
    }

    /// Close and reopen the link.
    pub fn reconnect(&mut self) -> Result<(), MotorClientError> {
        self.disconnect();
        self.connect()
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_connected()
    }

    /// Access the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Send a command to the controller without waiting for the acknowledgement.
    pub fn send(&mut self, state: ArmState, dems: JointDems) -> Result<(), MotorClientError> {
        if !self.port.is_connected() {
            return Err(MotorClientError::NotConnected);
        }

        let cmd = MotorCmd::new(state, dems);
        trace!("Sending motor command \"{}\"", cmd);

        self.port
            .write_line(&cmd.to_line())
            .map_err(|source| MotorClientError::SendError { cmd, source })
    }

    /// Receive the acknowledgement of the last command.
    ///
    /// An empty acknowledgement (timeout with no data) is accepted as healthy.
    pub fn receive_ack(&mut self) -> Result<MotorAck, MotorClientError> {
        let line = self.port.read_line().map_err(MotorClientError::RecvError)?;

        if line.trim().is_empty() {
            debug!("Empty acknowledgement from the motor controller, assuming no fault");
        }

        let ack = MotorAck::parse(&line)?;

        if ack.is_ok() {
            Ok(ack)
        } else {
            Err(MotorClientError::JointFault {
                joints: ack.faulted_joints(),
                unknown_bits: ack.unknown_bits(),
                code: ack.code(),
            })
        }
    }

    /// Send a command and check its acknowledgement.
    pub fn command(&mut self, state: ArmState, dems: JointDems) -> Result<(), MotorClientError> {
        self.send(state, dems)?;
        self.receive_ack().map(|_| ())
    }
}

fn fault_list(joints: &[Joint], unknown_bits: &[u32]) -> String {
    let mut parts = Vec::new();

    if !joints.is_empty() {
        let names: Vec<_> = joints.iter().map(|j| j.name()).collect();
        parts.push(format!("joint(s) {}", names.join(", ")));
    }
    if !unknown_bits.is_empty() {
        let bits: Vec<_> = unknown_bits.iter().map(|b| b.to_string()).collect();
        parts.push(format!("unknown bit(s) {}", bits.join(", ")));
    }

    parts.join(" and ")
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct LoopbackPort {
        connected: bool,
        fail_writes: bool,
        written: Vec<String>,
        acks: VecDeque<String>,
    }

    impl MotorPort for LoopbackPort {
        fn connect(&mut self) -> io::Result<()> {
            self.connected = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn write_line(&mut self, line: &str) -> io::Result<()> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.written.push(line.to_string());
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<String> {
            Ok(self.acks.pop_front().unwrap_or_default())
        }
    }

    fn connected_client(acks: &[&str]) -> MotorClient<LoopbackPort> {
        let mut client = MotorClient::new(LoopbackPort {
            acks: acks.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        });
        client.connect().unwrap();
        client
    }

    #[test]
    fn test_command_written() {
        let mut client = connected_client(&["0\n"]);

        client
            .command(ArmState::Active, JointDems::new(15, 0, 90))
            .unwrap();

        assert_eq!(client.port().written, vec!["4 15 0 90\n".to_string()]);
    }

    #[test]
    fn test_empty_ack_is_healthy() {
        let mut client = connected_client(&[]);
        assert!(client.command(ArmState::Standby, JointDems::default()).is_ok());
    }

    #[test]
    fn test_joint_fault() {
        let mut client = connected_client(&["101\n"]);

        match client.command(ArmState::Ready, JointDems::default()) {
            Err(e @ MotorClientError::JointFault { .. }) => {
                assert_eq!(
                    e.to_string(),
                    "Motor controller reports a fault on joint(s) wrist, base (code 101)"
                );
            }
            r => panic!("Expected a joint fault, got {:?}", r),
        }
    }

    #[test]
    fn test_unknown_fault_bits() {
        let mut client = connected_client(&["1000\n", "1010\n"]);

        let err = client
            .command(ArmState::Ready, JointDems::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Motor controller reports a fault on unknown bit(s) 3 (code 1000)"
        );

        let err = client
            .command(ArmState::Ready, JointDems::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Motor controller reports a fault on joint(s) elbow and unknown bit(s) 3 (code 1010)"
        );
    }

    #[test]
    fn test_invalid_ack() {
        let mut client = connected_client(&["ok\n"]);

        assert!(matches!(
            client.command(ArmState::Ready, JointDems::default()),
            Err(MotorClientError::InvalidAck(_))
        ));
    }

    #[test]
    fn test_not_connected() {
        let mut client = MotorClient::new(LoopbackPort::default());

        assert!(matches!(
            client.send(ArmState::Standby, JointDems::default()),
            Err(MotorClientError::NotConnected)
        ));
    }

    #[test]
    fn test_write_failure_names_command() {
        let mut client = connected_client(&[]);
        client.port.fail_writes = true;

        let err = client
            .send(ArmState::Off, JointDems::default())
            .unwrap_err();
        assert!(err.to_string().contains("\"0 0 0 0\""));
    }
}
