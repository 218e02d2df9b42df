use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::object_tracker::{ObjectTracker, TrackerError};

/// Minimum overlap with the previous box for a detection to continue the track.
pub const DEFAULT_MIN_IOU: f64 = 0.1;

/// Tracks by re-running a face detector every frame and following the
/// detection that best overlaps the last known box.
///
/// Useful when the target changes appearance faster than a correlation
/// filter adapts. Only faces can be tracked this way.
pub struct RedetectTracker {
    detector: Box<dyn FaceDetector>,
    min_iou: f64,
    last: Option<BoundingBox>,
}

impl RedetectTracker {
    pub fn new(detector: Box<dyn FaceDetector>, min_iou: f64) -> Self {
        Self {
            detector,
            min_iou,
            last: None,
        }
    }
}

impl ObjectTracker for RedetectTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), TrackerError> {
        let clamped = bbox
            .clamp_to(frame.width(), frame.height())
            .ok_or(TrackerError::BoxOutsideFrame {
                bbox,
                frame_width: frame.width(),
                frame_height: frame.height(),
            })?;
        self.last = Some(clamped);
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, TrackerError> {
        let last = self.last.ok_or(TrackerError::NotInitialized)?;
        let detections = self
            .detector
            .detect(frame)
            .map_err(|e| TrackerError::Detector(e.to_string()))?;

        let best = detections
            .iter()
            .map(|d| (d.bbox, d.bbox.iou(&last)))
            .filter(|(_, iou)| *iou >= self.min_iou)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((bbox, _)) => {
                self.last = Some(bbox);
                Ok(Some(bbox))
            }
            None => Ok(None),
        }
    }
}
