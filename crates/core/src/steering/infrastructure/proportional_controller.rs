use crate::steering::domain::unit_converter::UnitConverter;
use crate::steering::domain::yaw_controller::YawController;

pub const DEFAULT_LEVER_FACTOR: f64 = 0.1;
pub const DEFAULT_MAX_PX_RATE: f64 = 100.0;
pub const DEFAULT_DEAD_ZONE_PX: f64 = 5.0;

/// Turns at a speed proportional to the target's offset, capped at
/// `max_px_rate` in either direction.
pub struct ProportionalController {
    converter: UnitConverter,
    lever_factor: f64,
    max_px_rate: f64,
    dead_zone_px: f64,
}

impl ProportionalController {
    pub fn new(
        converter: UnitConverter,
        lever_factor: f64,
        max_px_rate: f64,
        dead_zone_px: f64,
    ) -> Self {
        Self {
            converter,
            lever_factor,
            max_px_rate,
            dead_zone_px,
        }
    }
}

impl YawController for ProportionalController {
    fn compute(&mut self, x_error_px: f64) -> f64 {
        let px_rate = if x_error_px.abs() < self.dead_zone_px {
            0.0
        } else {
            (x_error_px * self.lever_factor).clamp(-self.max_px_rate, self.max_px_rate)
        };
        self.converter.px_delta_to_radian_delta(px_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f64::consts::TAU;

    fn controller() -> ProportionalController {
        ProportionalController::new(
            UnitConverter::default(),
            DEFAULT_LEVER_FACTOR,
            DEFAULT_MAX_PX_RATE,
            DEFAULT_DEAD_ZONE_PX,
        )
    }

    #[rstest]
    #[case::inside_dead_zone(3.0, 0.0)]
    #[case::right(100.0, 10.0)]
    #[case::left(-100.0, -10.0)]
    #[case::capped_right(5000.0, 100.0)]
    #[case::capped_left(-5000.0, -100.0)]
    fn test_proportional_rate(#[case] error: f64, #[case] px_rate: f64) {
        assert_relative_eq!(controller().compute(error), px_rate * TAU / 640.0);
    }

    #[test]
    fn test_rate_grows_with_error() {
        let mut c = controller();
        assert!(c.compute(50.0) < c.compute(150.0));
    }
}
