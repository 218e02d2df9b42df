use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::TARGET_LABEL;

use super::track_state::Mode;

/// What the overlay should show for one box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawnBox {
    pub bbox: BoundingBox,
    pub center: (i32, i32),
    pub label: String,
}

impl DrawnBox {
    pub fn detection(bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            bbox,
            center: bbox.center(),
            label: format!("Face {confidence:.2}"),
        }
    }

    pub fn target(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            center: bbox.center(),
            label: TARGET_LABEL.to_string(),
        }
    }
}

/// Per-frame output of the selection controller.
///
/// Pure data: painting it is the presenter's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderInstruction {
    pub mode: Mode,
    pub status: &'static str,
    pub boxes: Vec<DrawnBox>,
}

impl RenderInstruction {
    /// The tracked box, when one is drawn this frame.
    pub fn target(&self) -> Option<&DrawnBox> {
        match self.mode {
            Mode::Tracking => self.boxes.first(),
            Mode::Detecting => None,
        }
    }
}
