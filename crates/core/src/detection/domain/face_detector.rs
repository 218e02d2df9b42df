use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One detected face. The confidence only feeds the on-screen label;
/// selection never looks at it.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// Domain interface for face detection.
///
/// Returns detections in backend-defined order. Implementations may keep
/// inference sessions or scratch buffers, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
