//! Command resend hysteresis

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::motor::JointDems;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Remembers the last transmitted demand and suppresses near duplicates of it.
#[derive(Debug, Clone)]
pub struct CmdFilter {
    threshold_deg: i32,
    last_sent: Option<JointDems>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of filtering a demand.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum CmdDecision {
    /// The demand differs enough from the last sent one and should be transmitted.
    Send,

    /// The demand repeats the last sent one and is suppressed.
    Repeat,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdFilter {
    pub fn new(threshold_deg: i32) -> Self {
        Self {
            threshold_deg,
            last_sent: None,
        }
    }

    /// Decide whether `dems` should be sent.
    ///
    /// Anything is sent if nothing has been sent since the last reset, otherwise a joint must
    /// differ from the last sent demand by more than the threshold.
    pub fn check(&self, dems: &JointDems) -> CmdDecision {
        match self.last_sent {
            Some(ref last) if last.max_abs_diff(dems) <= self.threshold_deg => CmdDecision::Repeat,
            _ => CmdDecision::Send,
        }
    }

    /// Record that `dems` was transmitted.
    pub fn record_sent(&mut self, dems: JointDems) {
        self.last_sent = Some(dems);
    }

    /// Forget the last sent demand, so the next one is always sent.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }

    pub fn last_sent(&self) -> Option<&JointDems> {
        self.last_sent.as_ref()
    }
}

impl CmdDecision {
    /// Single character code used in the diagnostic log.
    pub fn code(self) -> char {
        match self {
            CmdDecision::Send => 'o',
            CmdDecision::Repeat => 'r',
        }
    }
}

impl fmt::Display for CmdDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
