//! # Motor Controller Link
//!
//! The motor controller board is driven over a serial line using a line based ASCII protocol:
//!
//! - Every command is a single line `"<state_code> <base> <elbow> <wrist>\n"`, where
//!   `state_code` is the integer value of [`ArmState`] and the joint demands are integer degrees.
//! - The board answers each command with one line holding a binary digit string, which is a
//!   bitmask of faulted joints (bit 0 wrist, bit 1 elbow, bit 2 base). An empty line means no
//!   error.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The home (neutral) target of the arm.
pub const HOME_DEMS: JointDems = JointDems {
    base_deg: 0,
    elbow_deg: 0,
    wrist_deg: 0,
};

/// Number of whitespace separated fields in a command line.
const NUM_CMD_FIELDS: usize = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Joint demands in whole degrees, as transmitted to the motor controller.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct JointDems {
    pub base_deg: i32,
    pub elbow_deg: i32,
    pub wrist_deg: i32,
}

/// A single command sent to the motor controller.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct MotorCmd {
    /// The operational state of the system, the board uses it to decide whether to actuate.
    pub state: ArmState,

    /// The joint targets.
    pub dems: JointDems,
}

/// Acknowledgement returned by the motor controller after each command.
///
/// Holds the raw fault bitmask, zero meaning all joints are healthy.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct MotorAck(u32);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operational state of the arm system.
///
/// The ordering is meaningful: anything above `Calibrate` tracks the target, only `Active`
/// actuates the joints.
#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[repr(u8)]
pub enum ArmState {
    Off = 0,
    Standby = 1,
    Calibrate = 2,
    Ready = 3,
    Active = 4,
}

/// Joints of the arm.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Joint {
    Base,
    Elbow,
    Wrist,
}

/// Errors which can occur while parsing an acknowledgement line.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AckParseError {
    #[error("Acknowledgement {0:?} is not a binary digit string")]
    NotBinary(String),
}

/// Errors which can occur while parsing a command line.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CmdParseError {
    #[error("Expected {} fields in the command, found {0}", NUM_CMD_FIELDS)]
    WrongFieldCount(usize),

    #[error("Field {0} of the command ({1:?}) is not an integer")]
    InvalidField(usize, String),

    #[error("{0} is not a valid state code")]
    UnknownState(u8),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmState {
    /// All states in ascending order.
    pub const ALL: [ArmState; 5] = [
        ArmState::Off,
        ArmState::Standby,
        ArmState::Calibrate,
        ArmState::Ready,
        ArmState::Active,
    ];

    /// The integer code of this state on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the state matching a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// Upper case name of the state.
    pub fn name(self) -> &'static str {
        match self {
            ArmState::Off => "OFF",
            ArmState::Standby => "STANDBY",
            ArmState::Calibrate => "CALIBRATE",
            ArmState::Ready => "READY",
            ArmState::Active => "ACTIVE",
        }
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl JointDems {
    pub fn new(base_deg: i32, elbow_deg: i32, wrist_deg: i32) -> Self {
        Self {
            base_deg,
            elbow_deg,
            wrist_deg,
        }
    }

    /// The demands ordered base, elbow, wrist.
    pub fn as_array(&self) -> [i32; 3] {
        [self.base_deg, self.elbow_deg, self.wrist_deg]
    }

    /// The largest absolute difference of any single joint between `self` and `other`.
    pub fn max_abs_diff(&self, other: &JointDems) -> i32 {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .map(|(a, b)| (a - b).abs())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for JointDems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.base_deg, self.elbow_deg, self.wrist_deg)
    }
}

impl MotorCmd {
    pub fn new(state: ArmState, dems: JointDems) -> Self {
        Self { state, dems }
    }

    /// Serialise the command into its newline terminated wire line.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse a command from a wire line, surrounding whitespace is ignored.
    pub fn from_line(line: &str) -> Result<Self, CmdParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() != NUM_CMD_FIELDS {
            return Err(CmdParseError::WrongFieldCount(fields.len()));
        }

        let mut values = [0i32; NUM_CMD_FIELDS];
        for (i, field) in fields.iter().enumerate() {
            values[i] = field
                .parse()
                .map_err(|_| CmdParseError::InvalidField(i, field.to_string()))?;
        }

        let code = u8::try_from(values[0])
            .map_err(|_| CmdParseError::InvalidField(0, fields[0].to_string()))?;
        let state = ArmState::from_code(code).ok_or(CmdParseError::UnknownState(code))?;

        Ok(Self {
            state,
            dems: JointDems::new(values[1], values[2], values[3]),
        })
    }
}

impl fmt::Display for MotorCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.state.code(), self.dems)
    }
}

impl Joint {
    /// Joints in acknowledgement bit order.
    pub const ACK_ORDER: [Joint; 3] = [Joint::Wrist, Joint::Elbow, Joint::Base];

    /// Bit of this joint in the acknowledgement bitmask.
    pub fn ack_bit(self) -> u32 {
        match self {
            Joint::Wrist => 1 << 0,
            Joint::Elbow => 1 << 1,
            Joint::Base => 1 << 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Joint::Base => "base",
            Joint::Elbow => "elbow",
            Joint::Wrist => "wrist",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl MotorAck {
    /// Parse an acknowledgement line.
    ///
    /// An empty line (the read timed out with no data) is accepted as "no error".
    pub fn parse(line: &str) -> Result<Self, AckParseError> {
        let digits = line.trim();

        if digits.is_empty() {
            return Ok(Self::default());
        }

        u32::from_str_radix(digits, 2)
            .map(MotorAck)
            .map_err(|_| AckParseError::NotBinary(digits.to_string()))
    }

    /// The raw bitmask.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// True if no fault bit is set.
    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// True if the given joint is reported as faulted.
    pub fn is_faulted(&self, joint: Joint) -> bool {
        self.0 & joint.ack_bit() != 0
    }

    /// All faulted joints, in bit order.
    pub fn faulted_joints(&self) -> Vec<Joint> {
        Joint::ACK_ORDER
            .iter()
            .copied()
            .filter(|j| self.is_faulted(*j))
            .collect()
    }

    /// Indices of set bits which don't belong to any joint.
    pub fn unknown_bits(&self) -> Vec<u32> {
        let known = Joint::ACK_ORDER.iter().fold(0u32, |mask, j| mask | j.ack_bit());

        (0..u32::BITS)
            .filter(|bit| self.0 & !known & (1u32 << *bit) != 0)
            .collect()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_state_order() {
        assert!(ArmState::Ready > ArmState::Calibrate);
        assert!(ArmState::Active > ArmState::Calibrate);
        assert!(ArmState::Standby < ArmState::Calibrate);
        assert_eq!(ArmState::from_code(3), Some(ArmState::Ready));
        assert_eq!(ArmState::from_code(5), None);
    }

    #[test]
    fn test_cmd_line() {
        let cmd = MotorCmd::new(ArmState::Active, JointDems::new(15, -3, 90));
        assert_eq!(cmd.to_line(), "4 15 -3 90\n");

        assert_eq!(
            MotorCmd::new(ArmState::Standby, HOME_DEMS).to_line(),
            "1 0 0 0\n"
        );

        assert_eq!(MotorCmd::from_line("4 15 -3 90\n"), Ok(cmd));
    }

    #[test]
    fn test_cmd_line_errors() {
        assert_eq!(
            MotorCmd::from_line("4 15 -3"),
            Err(CmdParseError::WrongFieldCount(3))
        );
        assert_eq!(
            MotorCmd::from_line("4 15 x 90"),
            Err(CmdParseError::InvalidField(2, "x".into()))
        );
        assert_eq!(
            MotorCmd::from_line("7 0 0 0"),
            Err(CmdParseError::UnknownState(7))
        );
    }

    #[test]
    fn test_ack_decoding() {
        let ack = MotorAck::parse("101").unwrap();
        assert!(!ack.is_ok());
        assert_eq!(ack.code(), 5);
        assert!(ack.is_faulted(Joint::Wrist));
        assert!(!ack.is_faulted(Joint::Elbow));
        assert!(ack.is_faulted(Joint::Base));
        assert_eq!(ack.faulted_joints(), vec![Joint::Wrist, Joint::Base]);

        assert!(MotorAck::parse("000").unwrap().is_ok());
        assert!(MotorAck::parse("").unwrap().is_ok());
        assert!(MotorAck::parse("0\r\n").unwrap().is_ok());
        assert_eq!(
            MotorAck::parse("10\n").unwrap().faulted_joints(),
            vec![Joint::Elbow]
        );
    }

    #[test]
    fn test_ack_unknown_bits() {
        let ack = MotorAck::parse("1000").unwrap();
        assert!(!ack.is_ok());
        assert!(ack.faulted_joints().is_empty());
        assert_eq!(ack.unknown_bits(), vec![3]);

        assert_eq!(MotorAck::parse("100001").unwrap().unknown_bits(), vec![5]);
        assert!(MotorAck::parse("111").unwrap().unknown_bits().is_empty());
    }

    #[test]
    fn test_ack_not_binary() {
        assert_eq!(
            MotorAck::parse("12"),
            Err(AckParseError::NotBinary("12".into()))
        );
    }

    #[test]
    fn test_max_abs_diff() {
        let a = JointDems::new(0, 0, 0);
        assert_eq!(a.max_abs_diff(&JointDems::new(4, -4, 4)), 4);
        assert_eq!(a.max_abs_diff(&JointDems::new(20, 0, -30)), 30);
    }
}
