//! # Driver Controller Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::ReadError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Analogue stick axes of the driver's controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The driver's controller.
pub trait Controller {
    /// Current deflection of an axis, between -1 and +1.
    fn axis(&self, axis: StickAxis) -> Result<f64, ReadError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StickAxis {
    /// All axes in dashboard order.
    pub const ALL: [StickAxis; 4] = [
        StickAxis::LeftX,
        StickAxis::LeftY,
        StickAxis::RightX,
        StickAxis::RightY,
    ];

    /// Human readable label of the axis.
    pub fn label(&self) -> &'static str {
        match self {
            StickAxis::LeftX => "Left X",
            StickAxis::LeftY => "Left Y",
            StickAxis::RightX => "Right X",
            StickAxis::RightY => "Right Y",
        }
    }
}
