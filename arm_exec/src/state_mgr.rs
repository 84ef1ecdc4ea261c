//! # State manager
//!
//! Owns the operational state of the arm and the log of recoverable faults. The manager is shared
//! between the operator console and the control loop, every read and check-and-set happens under
//! a single lock which is never held across I/O.
//!
//! Requests only move the state one step up the ladder `OFF -> STANDBY -> CALIBRATE -> READY ->
//! ACTIVE`, apart from `deactivate` (ACTIVE back to READY). Faults drop the arm to STANDBY and
//! `stop` reaches OFF from anywhere.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub use comms_if::eqpt::motor::ArmState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of entries kept in the fault log.
pub const FAULT_LOG_CAPACITY: usize = 15;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single entry of the fault log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultLogEntry {
    /// Monotonic time since the manager was created.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    pub msg: String,
}

/// The arm's state machine.
#[derive(Debug)]
pub struct StateMgr {
    epoch: Instant,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: ArmState,

    /// Most recent first.
    faults: VecDeque<FaultLogEntry>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StateMgr {
    /// Create a new manager in the `Off` state.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            inner: Mutex::new(Inner {
                state: ArmState::Off,
                faults: VecDeque::with_capacity(FAULT_LOG_CAPACITY),
            }),
        }
    }

    /// `Off` -> `Standby`
    pub fn standby(&self) -> bool {
        self.transition(ArmState::Off, ArmState::Standby)
    }

    /// `Standby` -> `Calibrate`
    pub fn calibrate(&self) -> bool {
        self.transition(ArmState::Standby, ArmState::Calibrate)
    }

    /// `Calibrate` -> `Ready`
    pub fn ready(&self) -> bool {
        self.transition(ArmState::Calibrate, ArmState::Ready)
    }

    /// `Ready` -> `Active`
    pub fn active(&self) -> bool {
        self.transition(ArmState::Ready, ArmState::Active)
    }

    /// `Active` -> `Ready`, stops actuation while keeping the target tracked.
    pub fn deactivate(&self) -> bool {
        self.transition(ArmState::Active, ArmState::Ready)
    }

    /// Any state -> `Off`.
    pub fn stop(&self) {
        let mut inner = self.lock();
        debug!("State {} -> {}", inner.state, ArmState::Off);
        inner.state = ArmState::Off;
    }

    /// Record a fault.
    ///
    /// The fault is always logged. If the arm is above `Standby` it drops back to `Standby` and
    /// `true` is returned, otherwise the state is left unchanged and `false` is returned.
    pub fn error<S: Into<String>>(&self, msg: S) -> bool {
        let entry = FaultLogEntry {
            timestamp_s: self.epoch.elapsed().as_secs_f64(),
            msg: msg.into(),
        };

        let mut inner = self.lock();

        if inner.faults.len() >= FAULT_LOG_CAPACITY {
            inner.faults.pop_back();
        }
        inner.faults.push_front(entry);

        if inner.state > ArmState::Standby {
            debug!("State {} -> {} on fault", inner.state, ArmState::Standby);
            inner.state = ArmState::Standby;
            true
        } else {
            false
        }
    }

    pub fn get_state(&self) -> ArmState {
        self.lock().state
    }

    /// Copy of the fault log, most recent first.
    pub fn get_errors(&self) -> Vec<FaultLogEntry> {
        self.lock().faults.iter().cloned().collect()
    }

    fn transition(&self, from: ArmState, to: ArmState) -> bool {
        let mut inner = self.lock();

        if inner.state == from {
            debug!("State {} -> {}", from, to);
            inner.state = to;
            true
        } else {
            debug!(
                "Rejected request for {} while in {} (only allowed from {})",
                to, inner.state, from
            );
            false
        }
    }

    /// Lock the inner state.
    ///
    /// A panic while holding the lock cannot leave the state half written, so poisoning is
    /// ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateMgr {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    /// Bring a new manager into `target` through the legal sequence.
    fn mgr_in(target: ArmState) -> StateMgr {
        let mgr = StateMgr::new();
        let steps: [fn(&StateMgr) -> bool; 4] = [
            StateMgr::standby,
            StateMgr::calibrate,
            StateMgr::ready,
            StateMgr::active,
        ];

        for step in steps.iter().take(target.code() as usize) {
            assert!(step(&mgr));
        }
        assert_eq!(mgr.get_state(), target);

        mgr
    }

    #[test]
    fn test_transitions_need_predecessor() {
        let requests: [(fn(&StateMgr) -> bool, ArmState, ArmState); 5] = [
            (StateMgr::standby, ArmState::Off, ArmState::Standby),
            (StateMgr::calibrate, ArmState::Standby, ArmState::Calibrate),
            (StateMgr::ready, ArmState::Calibrate, ArmState::Ready),
            (StateMgr::active, ArmState::Ready, ArmState::Active),
            (StateMgr::deactivate, ArmState::Active, ArmState::Ready),
        ];

        for (request, from, to) in requests.iter() {
            for state in ArmState::ALL.iter() {
                let mgr = mgr_in(*state);
                let accepted = request(&mgr);

                if state == from {
                    assert!(accepted, "{} should be accepted from {}", to, state);
                    assert_eq!(mgr.get_state(), *to);
                } else {
                    assert!(!accepted, "{} should be rejected from {}", to, state);
                    assert_eq!(mgr.get_state(), *state);
                }

                // Rejected requests are not faults
                assert!(mgr.get_errors().is_empty());
            }
        }
    }

    #[test]
    fn test_stop() {
        for state in ArmState::ALL.iter() {
            let mgr = mgr_in(*state);
            mgr.stop();
            assert_eq!(mgr.get_state(), ArmState::Off);
        }
    }

    #[test]
    fn test_error_drops_to_standby() {
        for state in ArmState::ALL.iter() {
            let mgr = mgr_in(*state);
            let changed = mgr.error("fault");

            assert_eq!(changed, *state > ArmState::Standby);
            assert_eq!(mgr.get_state(), (*state).min(ArmState::Standby));
            assert_eq!(mgr.get_errors().len(), 1);
        }
    }

    #[test]
    fn test_fault_log_bound() {
        let mgr = StateMgr::new();

        for i in 0..20 {
            mgr.error(format!("fault {}", i));
        }

        let errors = mgr.get_errors();
        assert_eq!(errors.len(), FAULT_LOG_CAPACITY);

        let msgs: Vec<&str> = errors.iter().map(|e| e.msg.as_str()).collect();
        let expected: Vec<String> = (5..20).rev().map(|i| format!("fault {}", i)).collect();
        assert_eq!(msgs, expected);

        assert!(errors
            .windows(2)
            .all(|pair| pair[0].timestamp_s >= pair[1].timestamp_s));
    }

    #[test]
    fn test_shared_between_threads() {
        let mgr = Arc::new(mgr_in(ArmState::Ready));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mgr = mgr.clone();
                std::thread::spawn(move || {
                    mgr.error(format!("thread {}", i));
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(mgr.get_state(), ArmState::Standby);
        assert_eq!(mgr.get_errors().len(), 4);
    }
}
