//! # User interface sink
//!
//! The control loop reports state changes and operator messages through [`UiSink`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::state_mgr::ArmState;
use crate::tracking::{CameraRay, Location};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of posted lines kept by [`ConsoleUi`].
pub const CONSOLE_LOG_LINES: usize = 15;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

pub trait UiSink {
    /// The arm's state changed.
    fn set_state(&mut self, state: ArmState);

    /// A formatted, timestamped message for the operator.
    fn add_log(&mut self, line: &str);

    /// A new target location was triangulated from the given rays.
    fn show_track(&mut self, _left: &CameraRay, _right: &CameraRay, _location: &Location) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Terminal user interface.
///
/// Keeps the most recent lines so the operator console can show them on request.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    lines: ConsoleLog,
}

/// Shared handle onto the lines posted to a [`ConsoleUi`].
#[derive(Debug, Default, Clone)]
pub struct ConsoleLog(Arc<Mutex<VecDeque<String>>>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for reading the posted lines from another thread.
    pub fn log(&self) -> ConsoleLog {
        self.lines.clone()
    }
}

impl UiSink for ConsoleUi {
    fn set_state(&mut self, state: ArmState) {
        println!("==== {} ====", state);
    }

    fn add_log(&mut self, line: &str) {
        self.lines.push(line);
    }
}

impl ConsoleLog {
    fn push(&self, line: &str) {
        let mut lines = self.0.lock().unwrap_or_else(PoisonError::into_inner);

        if lines.len() >= CONSOLE_LOG_LINES {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
    }

    /// The posted lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
