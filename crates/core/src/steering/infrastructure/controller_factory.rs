use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::steering::domain::unit_converter::UnitConverter;
use crate::steering::domain::yaw_controller::YawController;

use super::constant_rate_controller::{self, ConstantRateController};
use super::proportional_controller::{self, ProportionalController};

/// Yaw control law, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Constant,
    Proportional,
}

impl ControllerKind {
    pub const ALL: &[ControllerKind] = &[ControllerKind::Constant, ControllerKind::Proportional];
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Constant => write!(f, "constant"),
            ControllerKind::Proportional => write!(f, "proportional"),
        }
    }
}

impl FromStr for ControllerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<String> = Self::ALL.iter().map(ToString::to_string).collect();
                format!("Controller must be one of {}, got '{s}'", names.join(", "))
            })
    }
}

/// Builds a controller with its default gains for a frame of `frame_width` pixels.
pub fn create_controller(kind: ControllerKind, frame_width: u32) -> Box<dyn YawController> {
    let converter = UnitConverter::for_frame_width(frame_width);
    match kind {
        ControllerKind::Constant => Box::new(ConstantRateController::new(
            converter,
            constant_rate_controller::DEFAULT_YAW_SPEED_PX_PER_S,
            constant_rate_controller::DEFAULT_DEAD_ZONE_PX,
        )),
        ControllerKind::Proportional => Box::new(ProportionalController::new(
            converter,
            proportional_controller::DEFAULT_LEVER_FACTOR,
            proportional_controller::DEFAULT_MAX_PX_RATE,
            proportional_controller::DEFAULT_DEAD_ZONE_PX,
        )),
    }
}
