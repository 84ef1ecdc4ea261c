//! # Telecommand module
//!
//! Operator commands typed into the console of the arm executable. Each command either requests a
//! state transition from the state manager or asks for information to be displayed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use thiserror::Error;

// Internal
use crate::eqpt::motor::ArmState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name used as the binary name when parsing a console line.
const CONSOLE_NAME: &str = "parry";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An operator command.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "parry")]
pub enum OperatorCmd {
    /// Move from OFF into STANDBY
    #[structopt(name = "standby")]
    Standby,

    /// Start calibration, only accepted in STANDBY
    #[structopt(name = "calibrate")]
    Calibrate,

    /// Start tracking without actuation, only accepted in CALIBRATE
    #[structopt(name = "ready")]
    Ready,

    /// Start actuating the arm, only accepted in READY
    #[structopt(name = "active")]
    Active,

    /// Stop actuating the arm and return it to neutral, only accepted in ACTIVE
    #[structopt(name = "deactivate")]
    Deactivate,

    /// Stop the system and exit
    #[structopt(name = "stop")]
    Stop,

    /// Show the current state
    #[structopt(name = "state")]
    State,

    /// Show the fault log, most recent first
    #[structopt(name = "errors")]
    Errors,

    /// Show the most recent operator log lines
    #[structopt(name = "log")]
    Log,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("No command given")]
    Empty,

    #[error("{0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OperatorCmd {
    /// Parse a command from a line of console input.
    pub fn parse(line: &str) -> Result<Self, TcParseError> {
        if line.trim().is_empty() {
            return Err(TcParseError::Empty);
        }

        Self::from_iter_safe(std::iter::once(CONSOLE_NAME).chain(line.split_whitespace()))
            .map_err(|e| TcParseError::Invalid(e.to_string()))
    }

    /// The state this command requests, or `None` for informational commands.
    pub fn target_state(&self) -> Option<ArmState> {
        match self {
            OperatorCmd::Standby => Some(ArmState::Standby),
            OperatorCmd::Calibrate => Some(ArmState::Calibrate),
            OperatorCmd::Ready => Some(ArmState::Ready),
            OperatorCmd::Active => Some(ArmState::Active),
            OperatorCmd::Deactivate => Some(ArmState::Ready),
            OperatorCmd::Stop => Some(ArmState::Off),
            OperatorCmd::State | OperatorCmd::Errors | OperatorCmd::Log => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(OperatorCmd::parse("calibrate").unwrap(), OperatorCmd::Calibrate);
        assert_eq!(OperatorCmd::parse("  active ").unwrap(), OperatorCmd::Active);
        assert_eq!(
            OperatorCmd::parse("stop").unwrap().target_state(),
            Some(ArmState::Off)
        );
        assert_eq!(
            OperatorCmd::parse("deactivate").unwrap().target_state(),
            Some(ArmState::Ready)
        );
        assert_eq!(OperatorCmd::parse("errors").unwrap().target_state(), None);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(OperatorCmd::parse(""), Err(TcParseError::Empty)));
        assert!(matches!(
            OperatorCmd::parse("jump"),
            Err(TcParseError::Invalid(_))
        ));
    }
}
