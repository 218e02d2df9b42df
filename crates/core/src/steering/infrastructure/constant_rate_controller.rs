use crate::steering::domain::unit_converter::UnitConverter;
use crate::steering::domain::yaw_controller::YawController;

pub const DEFAULT_YAW_SPEED_PX_PER_S: f64 = 5.0;
pub const DEFAULT_DEAD_ZONE_PX: f64 = 5.0;

/// Turns at a fixed speed toward the target whenever it is outside the
/// dead zone, regardless of how far off it is.
pub struct ConstantRateController {
    converter: UnitConverter,
    yaw_speed_px_per_s: f64,
    dead_zone_px: f64,
}

impl ConstantRateController {
    pub fn new(converter: UnitConverter, yaw_speed_px_per_s: f64, dead_zone_px: f64) -> Self {
        Self {
            converter,
            yaw_speed_px_per_s,
            dead_zone_px,
        }
    }
}

impl YawController for ConstantRateController {
    fn compute(&mut self, x_error_px: f64) -> f64 {
        let px_rate = if x_error_px.abs() < self.dead_zone_px {
            0.0
        } else {
            self.yaw_speed_px_per_s.copysign(x_error_px)
        };
        self.converter.px_delta_to_radian_delta(px_rate)
    }
}
