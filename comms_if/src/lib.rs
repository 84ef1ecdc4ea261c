//! # Communications interface crate.
//!
//! Provides every data structure which crosses a device or thread boundary: the wire format of the
//! motor controller link, camera detections, and operator commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator commands issued from the console
pub mod tc;

/// Command and response definitions for equipment (motor controller and cameras)
pub mod eqpt;
