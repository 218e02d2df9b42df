//! Box post-processing shared by the ONNX detector backends.

use crate::detection::domain::face_detector::Detection;
use crate::shared::bounding_box::BoundingBox;

/// Raw model output in frame coordinates, before suppression.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

impl ScoredBox {
    pub fn corners(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Converts to a [`Detection`] clipped to the frame.
    ///
    /// Returns `None` for boxes that collapse to nothing after clipping.
    pub fn into_detection(self, frame_width: u32, frame_height: u32) -> Option<Detection> {
        let bbox = BoundingBox::from_corners(self.x1, self.y1, self.x2, self.y2).ok()?;
        let clamped = bbox.clamp_to(frame_width, frame_height)?;
        Some(Detection::new(clamped, self.score))
    }
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes; 0 when they
/// are disjoint.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let overlap_w = a[2].min(b[2]) - a[0].max(b[0]);
    let overlap_h = a[3].min(b[3]) - a[1].max(b[1]);
    if overlap_w <= 0.0 || overlap_h <= 0.0 {
        return 0.0;
    }
    let area = |r: &[f64; 4]| (r[2] - r[0]) * (r[3] - r[1]);
    let inter = overlap_w * overlap_h;
    inter / (area(a) + area(b) - inter)
}

/// Greedy non-maximum suppression. Candidates are visited best score
/// first; each one is kept unless it overlaps an already kept box by more
/// than `iou_thresh`.
pub fn nms(candidates: &mut [ScoredBox], iou_thresh: f64) -> Vec<ScoredBox> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<ScoredBox> = Vec::new();
    for candidate in candidates.iter() {
        let corners = candidate.corners();
        if kept
            .iter()
            .all(|k| bbox_iou(&k.corners(), &corners) <= iou_thresh)
        {
            kept.push(candidate.clone());
        }
    }
    kept
}
