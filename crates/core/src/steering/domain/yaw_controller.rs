use crate::shared::bounding_box::BoundingBox;

/// Turns the target's horizontal offset from the frame center into a yaw
/// rate in rad/s. Positive error (target right of center) yields a positive
/// (rightward) rate.
pub trait YawController: Send {
    fn compute(&mut self, x_error_px: f64) -> f64;
}

/// One frame's steering output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringCommand {
    pub x_error_px: f64,
    pub yaw_rate: f64,
}

/// Horizontal offset of the box's center marker from the frame's midline.
pub fn x_error(bbox: &BoundingBox, frame_width: u32) -> f64 {
    bbox.center().0 as f64 - frame_width as f64 / 2.0
}

/// Runs `controller` on the tracked box.
pub fn steer(
    controller: &mut dyn YawController,
    bbox: &BoundingBox,
    frame_width: u32,
) -> SteeringCommand {
    let x_error_px = x_error(bbox, frame_width);
    SteeringCommand {
        x_error_px,
        yaw_rate: controller.compute(x_error_px),
    }
}
