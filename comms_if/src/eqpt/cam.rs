//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Resolution of a camera frame.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Resolution {
    /// Units: pixels
    pub width: u32,

    /// Units: pixels
    pub height: u32,
}

/// Location of the target within a single camera frame.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Detection {
    /// Centre of the target, measured from the top left corner of the frame.
    ///
    /// Units: pixels
    pub centre_px: [f64; 2],

    /// Orientation of the target's long axis.
    ///
    /// Units: degrees
    pub orientation_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Cameras of the stereo pair
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CamId {
    /// The camera mounted on the arm's left
    Left,

    /// The camera mounted on the arm's right
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height divided by width.
    pub fn aspect(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

impl CamId {
    /// The other camera of the pair.
    pub fn other(self) -> Self {
        match self {
            CamId::Left => CamId::Right,
            CamId::Right => CamId::Left,
        }
    }
}
