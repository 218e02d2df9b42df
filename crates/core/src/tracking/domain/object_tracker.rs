use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("tracker updated before init")]
    NotInitialized,
    #[error("initial box {bbox:?} lies outside the {frame_width}x{frame_height} frame")]
    BoxOutsideFrame {
        bbox: BoundingBox,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("target too small to track: {width}x{height}")]
    TargetTooSmall { width: i32, height: i32 },
    #[error("frame size changed from {expected:?} to {actual:?}")]
    FrameSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("detector failed while tracking: {0}")]
    Detector(String),
}

/// Domain interface for single-target visual tracking.
///
/// `init` seeds the tracker on one frame; every later frame goes through
/// `update`, which yields the new box or `Ok(None)` when the target is lost.
/// A lost tracker keeps its internal state and may report the target again
/// on a later frame.
pub trait ObjectTracker: Send {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), TrackerError>;

    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, TrackerError>;
}
