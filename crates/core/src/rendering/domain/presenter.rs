use crate::selection::domain::click_inbox::ClickEvent;
use crate::selection::domain::render_instruction::RenderInstruction;
use crate::shared::frame::Frame;
use crate::steering::domain::yaw_controller::SteeringCommand;

/// Session-level readouts shown next to the selection overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hud {
    pub fps: Option<f64>,
    pub steering: Option<SteeringCommand>,
}

/// User input gathered while a frame was on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresenterInput {
    pub quit: bool,
    /// At most one click per presented frame, in frame coordinates.
    pub click: Option<ClickEvent>,
    pub reset: bool,
    pub snapshot: bool,
}

/// Displays annotated frames and reports user input.
///
/// `present` must not block waiting for input: it polls whatever arrived
/// since the previous call and returns.
pub trait Presenter {
    fn present(
        &mut self,
        frame: &Frame,
        instruction: &RenderInstruction,
        hud: &Hud,
    ) -> Result<PresenterInput, Box<dyn std::error::Error>>;
}
