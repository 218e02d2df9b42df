use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{STATUS_DETECTING, STATUS_TRACKING, STATUS_TRACKING_FAILED};
use crate::shared::frame::Frame;
use crate::tracking::domain::object_tracker::ObjectTracker;

use super::click_inbox::ClickEvent;
use super::render_instruction::{DrawnBox, RenderInstruction};
use super::track_state::{Mode, TrackState};

/// Sequences face detection and single-target tracking.
///
/// Starts in [`Mode::Detecting`], where every frame goes through the
/// detector and a click inside a detected box hands that box to the tracker.
/// Once tracking, every frame goes through the tracker and clicks are
/// ignored. Losing the target only changes the status text; the controller
/// returns to detecting through [`SelectionController::reset`] alone.
pub struct SelectionController {
    detector: Box<dyn FaceDetector>,
    tracker: Box<dyn ObjectTracker>,
    state: TrackState,
}

impl SelectionController {
    pub fn new(detector: Box<dyn FaceDetector>, tracker: Box<dyn ObjectTracker>) -> Self {
        Self {
            detector,
            tracker,
            state: TrackState::new(),
        }
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn active_box(&self) -> Option<BoundingBox> {
        self.state.active_box
    }

    /// Drops the current target and goes back to detecting.
    pub fn reset(&mut self) {
        if self.state.is_tracking() {
            log::info!("Selection cleared, back to detecting");
        }
        self.state.clear();
    }

    /// Advances the state machine by one frame.
    ///
    /// Never fails: detector and tracker errors are logged and surface only
    /// as what the returned instruction shows.
    pub fn process(&mut self, frame: &Frame, click: Option<ClickEvent>) -> RenderInstruction {
        match self.state.mode {
            Mode::Detecting => self.process_detecting(frame, click),
            Mode::Tracking => {
                if let Some(c) = click {
                    log::debug!("Ignoring click at ({}, {}) while tracking", c.x, c.y);
                }
                self.process_tracking(frame)
            }
        }
    }

    fn process_detecting(&mut self, frame: &Frame, click: Option<ClickEvent>) -> RenderInstruction {
        let detections = self.detect(frame);

        if let Some(click) = click {
            match hit_test(&detections, click) {
                Some(selected) => {
                    if let Some(instruction) = self.try_select(frame, selected) {
                        return instruction;
                    }
                }
                None => log::debug!("Click at ({}, {}) hit no face", click.x, click.y),
            }
        }

        RenderInstruction {
            mode: Mode::Detecting,
            status: STATUS_DETECTING,
            boxes: detections
                .iter()
                .map(|d| DrawnBox::detection(d.bbox, d.confidence))
                .collect(),
        }
    }

    fn try_select(&mut self, frame: &Frame, bbox: BoundingBox) -> Option<RenderInstruction> {
        match self.tracker.init(frame, bbox) {
            Ok(()) => {
                log::info!(
                    "Tracking target at ({}, {}) {}x{}",
                    bbox.x(),
                    bbox.y(),
                    bbox.width(),
                    bbox.height()
                );
                self.state.start_tracking(bbox);
                Some(RenderInstruction {
                    mode: Mode::Tracking,
                    status: STATUS_TRACKING,
                    boxes: vec![DrawnBox::target(bbox)],
                })
            }
            Err(e) => {
                log::warn!("Tracker init failed, staying in detection: {e}");
                None
            }
        }
    }

    fn process_tracking(&mut self, frame: &Frame) -> RenderInstruction {
        let tracked = match self.tracker.update(frame) {
            Ok(Some(bbox)) => bbox.clamp_to(frame.width(), frame.height()),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Tracker update failed: {e}");
                None
            }
        };

        match tracked {
            Some(bbox) => {
                self.state.active_box = Some(bbox);
                RenderInstruction {
                    mode: Mode::Tracking,
                    status: STATUS_TRACKING,
                    boxes: vec![DrawnBox::target(bbox)],
                }
            }
            None => RenderInstruction {
                mode: Mode::Tracking,
                status: STATUS_TRACKING_FAILED,
                boxes: Vec::new(),
            },
        }
    }

    fn detect(&mut self, frame: &Frame) -> Vec<Detection> {
        let detections = match self.detector.detect(frame) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Face detection failed on frame {}: {e}", frame.index());
                return Vec::new();
            }
        };
        detections
            .into_iter()
            .filter_map(|d| {
                let bbox = d.bbox.clamp_to(frame.width(), frame.height())?;
                Some(Detection::new(bbox, d.confidence))
            })
            .collect()
    }
}

/// First detection, in detector order, whose box contains the click.
fn hit_test(detections: &[Detection], click: ClickEvent) -> Option<BoundingBox> {
    detections
        .iter()
        .map(|d| d.bbox)
        .find(|b| b.contains(click.x, click.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::domain::object_tracker::TrackerError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubDetector {
        detections: Vec<Detection>,
        fail: bool,
        calls: Arc<Mutex<usize>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err("camera glitch".into());
            }
            Ok(self.detections.clone())
        }
    }

    enum Update {
        Found(BoundingBox),
        Lost,
        Fail,
    }

    #[derive(Default)]
    struct TrackerLog {
        inits: Vec<BoundingBox>,
        updates: usize,
    }

    struct StubTracker {
        init_ok: bool,
        updates: VecDeque<Update>,
        log: Arc<Mutex<TrackerLog>>,
    }

    impl ObjectTracker for StubTracker {
        fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<(), TrackerError> {
            self.log.lock().unwrap().inits.push(bbox);
            if self.init_ok {
                Ok(())
            } else {
                Err(TrackerError::TargetTooSmall {
                    width: bbox.width(),
                    height: bbox.height(),
                })
            }
        }

        fn update(&mut self, _frame: &Frame) -> Result<Option<BoundingBox>, TrackerError> {
            self.log.lock().unwrap().updates += 1;
            match self.updates.pop_front() {
                Some(Update::Found(b)) => Ok(Some(b)),
                Some(Update::Lost) | None => Ok(None),
                Some(Update::Fail) => Err(TrackerError::NotInitialized),
            }
        }
    }

    // --- Helpers ---

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 200 * 150 * 3], 200, 150, 3, 0)
    }

    fn faces(boxes: &[BoundingBox]) -> Vec<Detection> {
        boxes.iter().map(|b| Detection::new(*b, 0.9)).collect()
    }

    struct Harness {
        controller: SelectionController,
        detector_calls: Arc<Mutex<usize>>,
        tracker_log: Arc<Mutex<TrackerLog>>,
    }

    fn harness(detections: Vec<Detection>, init_ok: bool, updates: Vec<Update>) -> Harness {
        let detector_calls = Arc::new(Mutex::new(0));
        let tracker_log = Arc::new(Mutex::new(TrackerLog::default()));
        let detector = StubDetector {
            detections,
            fail: false,
            calls: detector_calls.clone(),
        };
        let tracker = StubTracker {
            init_ok,
            updates: updates.into(),
            log: tracker_log.clone(),
        };
        Harness {
            controller: SelectionController::new(Box::new(detector), Box::new(tracker)),
            detector_calls,
            tracker_log,
        }
    }

    fn click(x: i32, y: i32) -> Option<ClickEvent> {
        Some(ClickEvent::new(x, y))
    }

    // --- Detecting ---

    #[test]
    fn test_starts_detecting_without_target() {
        let h = harness(vec![], true, vec![]);
        assert_eq!(h.controller.mode(), Mode::Detecting);
        assert_eq!(h.controller.active_box(), None);
    }

    #[test]
    fn test_detecting_draws_every_detection() {
        let mut h = harness(faces(&[bbox(0, 0, 20, 20), bbox(50, 50, 30, 30)]), true, vec![]);

        let out = h.controller.process(&frame(), None);

        assert_eq!(out.mode, Mode::Detecting);
        assert_eq!(out.status, STATUS_DETECTING);
        let drawn: Vec<_> = out.boxes.iter().map(|b| b.bbox).collect();
        assert_eq!(drawn, vec![bbox(0, 0, 20, 20), bbox(50, 50, 30, 30)]);
        assert_eq!(out.boxes[1].center, (65, 65));
        assert_eq!(out.boxes[0].label, "Face 0.90");
    }

    #[test]
    fn test_no_detections_draws_nothing() {
        let mut h = harness(vec![], true, vec![]);
        let out = h.controller.process(&frame(), None);
        assert_eq!(out.status, STATUS_DETECTING);
        assert!(out.boxes.is_empty());
    }

    #[test]
    fn test_detecting_without_click_is_idempotent() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![]);

        let first = h.controller.process(&frame(), None);
        let second = h.controller.process(&frame(), None);

        assert_eq!(first, second);
        assert_eq!(h.controller.state(), &TrackState::new());
        assert_eq!(*h.detector_calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_detector_error_is_treated_as_no_faces() {
        let calls = Arc::new(Mutex::new(0));
        let detector = StubDetector {
            detections: faces(&[bbox(10, 10, 50, 50)]),
            fail: true,
            calls,
        };
        let tracker = StubTracker {
            init_ok: true,
            updates: VecDeque::new(),
            log: Arc::new(Mutex::new(TrackerLog::default())),
        };
        let mut controller = SelectionController::new(Box::new(detector), Box::new(tracker));

        let out = controller.process(&frame(), click(20, 20));

        assert_eq!(out.status, STATUS_DETECTING);
        assert!(out.boxes.is_empty());
        assert_eq!(controller.mode(), Mode::Detecting);
    }

    #[test]
    fn test_detections_are_clamped_and_offscreen_ones_dropped() {
        let mut h = harness(
            faces(&[bbox(-10, -10, 30, 30), bbox(500, 500, 20, 20), bbox(190, 140, 40, 40)]),
            true,
            vec![],
        );

        let out = h.controller.process(&frame(), None);

        let drawn: Vec<_> = out.boxes.iter().map(|b| b.bbox).collect();
        assert_eq!(drawn, vec![bbox(0, 0, 20, 20), bbox(190, 140, 10, 10)]);
    }

    // --- Selection ---

    #[test]
    fn test_click_inside_box_starts_tracking() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50), bbox(100, 20, 40, 40)]), true, vec![]);

        let out = h.controller.process(&frame(), click(110, 30));

        assert_eq!(h.controller.mode(), Mode::Tracking);
        assert_eq!(h.controller.active_box(), Some(bbox(100, 20, 40, 40)));
        assert_eq!(h.tracker_log.lock().unwrap().inits, vec![bbox(100, 20, 40, 40)]);
        assert_eq!(out.mode, Mode::Tracking);
        assert_eq!(out.status, STATUS_TRACKING);
        assert_eq!(out.boxes, vec![DrawnBox::target(bbox(100, 20, 40, 40))]);
    }

    #[test]
    fn test_click_outside_all_boxes_is_discarded() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![]);

        let out = h.controller.process(&frame(), click(150, 100));

        assert_eq!(h.controller.state(), &TrackState::new());
        assert!(h.tracker_log.lock().unwrap().inits.is_empty());
        assert_eq!(out.status, STATUS_DETECTING);
        assert_eq!(out.boxes.len(), 1);
    }

    #[test]
    fn test_click_on_right_edge_misses() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![]);
        h.controller.process(&frame(), click(60, 20));
        assert_eq!(h.controller.mode(), Mode::Detecting);
    }

    #[test]
    fn test_click_with_no_detections_is_discarded() {
        let mut h = harness(vec![], true, vec![]);
        h.controller.process(&frame(), click(20, 20));
        assert_eq!(h.controller.mode(), Mode::Detecting);
        assert!(h.tracker_log.lock().unwrap().inits.is_empty());
    }

    #[test]
    fn test_overlapping_boxes_first_in_order_wins() {
        let mut h = harness(faces(&[bbox(0, 0, 100, 100), bbox(20, 20, 30, 30)]), true, vec![]);

        h.controller.process(&frame(), click(25, 25));

        assert_eq!(h.controller.active_box(), Some(bbox(0, 0, 100, 100)));
        assert_eq!(h.tracker_log.lock().unwrap().inits, vec![bbox(0, 0, 100, 100)]);
    }

    #[test]
    fn test_tracker_init_failure_keeps_detecting() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), false, vec![]);

        let out = h.controller.process(&frame(), click(20, 20));

        assert_eq!(h.controller.state(), &TrackState::new());
        assert_eq!(h.tracker_log.lock().unwrap().inits.len(), 1);
        assert_eq!(out.mode, Mode::Detecting);
        assert_eq!(out.status, STATUS_DETECTING);
        assert_eq!(out.boxes.len(), 1);

        h.controller.process(&frame(), None);
        assert_eq!(h.tracker_log.lock().unwrap().updates, 0);
    }

    // --- Tracking ---

    #[test]
    fn test_tracking_uses_tracker_not_detector() {
        let mut h = harness(
            faces(&[bbox(10, 10, 50, 50)]),
            true,
            vec![Update::Found(bbox(11, 10, 50, 50))],
        );
        h.controller.process(&frame(), click(20, 20));
        let detector_calls = *h.detector_calls.lock().unwrap();

        h.controller.process(&frame(), None);

        assert_eq!(*h.detector_calls.lock().unwrap(), detector_calls);
        assert_eq!(h.tracker_log.lock().unwrap().updates, 1);
    }

    #[test]
    fn test_lost_target_reports_failure_and_keeps_state() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![Update::Lost]);
        h.controller.process(&frame(), click(20, 20));

        let out = h.controller.process(&frame(), None);

        assert_eq!(out.mode, Mode::Tracking);
        assert_eq!(out.status, STATUS_TRACKING_FAILED);
        assert!(out.boxes.is_empty());
        assert_eq!(h.controller.mode(), Mode::Tracking);
        assert_eq!(h.controller.active_box(), Some(bbox(10, 10, 50, 50)));
    }

    #[test]
    fn test_tracker_error_reports_failure() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![Update::Fail]);
        h.controller.process(&frame(), click(20, 20));

        let out = h.controller.process(&frame(), None);

        assert_eq!(out.status, STATUS_TRACKING_FAILED);
        assert!(out.boxes.is_empty());
        assert_eq!(h.controller.mode(), Mode::Tracking);
    }

    #[test]
    fn test_offscreen_tracker_box_reports_failure() {
        let mut h = harness(
            faces(&[bbox(10, 10, 50, 50)]),
            true,
            vec![Update::Found(bbox(400, 400, 50, 50))],
        );
        h.controller.process(&frame(), click(20, 20));

        let out = h.controller.process(&frame(), None);

        assert_eq!(out.status, STATUS_TRACKING_FAILED);
        assert_eq!(h.controller.active_box(), Some(bbox(10, 10, 50, 50)));
    }

    #[test]
    fn test_tracker_recovers_after_loss() {
        let mut h = harness(
            faces(&[bbox(10, 10, 50, 50)]),
            true,
            vec![Update::Lost, Update::Found(bbox(30, 30, 50, 50))],
        );
        h.controller.process(&frame(), click(20, 20));

        h.controller.process(&frame(), None);
        let out = h.controller.process(&frame(), None);

        assert_eq!(out.status, STATUS_TRACKING);
        assert_eq!(h.controller.active_box(), Some(bbox(30, 30, 50, 50)));
    }

    #[test]
    fn test_clicks_ignored_while_tracking() {
        let mut h = harness(
            faces(&[bbox(10, 10, 50, 50), bbox(100, 20, 40, 40)]),
            true,
            vec![Update::Found(bbox(10, 10, 50, 50))],
        );
        h.controller.process(&frame(), click(20, 20));

        h.controller.process(&frame(), click(110, 30));

        assert_eq!(h.tracker_log.lock().unwrap().inits.len(), 1);
        assert_eq!(h.controller.active_box(), Some(bbox(10, 10, 50, 50)));
    }

    #[test]
    fn test_sustained_loss_never_returns_to_detecting() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![]);
        h.controller.process(&frame(), click(20, 20));

        for _ in 0..20 {
            h.controller.process(&frame(), None);
        }

        assert_eq!(h.controller.mode(), Mode::Tracking);
    }

    #[test]
    fn test_reset_returns_to_detecting() {
        let mut h = harness(faces(&[bbox(10, 10, 50, 50)]), true, vec![]);
        h.controller.process(&frame(), click(20, 20));

        h.controller.reset();
        let out = h.controller.process(&frame(), None);

        assert_eq!(h.controller.state(), &TrackState::new());
        assert_eq!(out.status, STATUS_DETECTING);
        assert_eq!(out.boxes.len(), 1);
    }

    #[test]
    fn test_click_then_track_end_to_end() {
        let mut h = harness(
            faces(&[bbox(10, 10, 50, 50)]),
            true,
            vec![Update::Found(bbox(12, 11, 50, 50))],
        );

        h.controller.process(&frame(), click(20, 20));
        assert_eq!(h.controller.mode(), Mode::Tracking);
        assert_eq!(h.controller.active_box(), Some(bbox(10, 10, 50, 50)));

        let out = h.controller.process(&frame(), None);

        assert_eq!(out.status, "Tracking");
        assert_eq!(out.boxes.len(), 1);
        assert_eq!(out.boxes[0].bbox, bbox(12, 11, 50, 50));
        assert_eq!(out.boxes[0].center, (37, 36));
        assert_eq!(h.controller.active_box(), Some(bbox(12, 11, 50, 50)));
    }

    #[test]
    fn test_hit_test_returns_first_containing_box() {
        let dets = faces(&[bbox(0, 0, 10, 10), bbox(5, 5, 10, 10), bbox(0, 0, 50, 50)]);
        assert_eq!(hit_test(&dets, ClickEvent::new(7, 7)), Some(bbox(0, 0, 10, 10)));
        assert_eq!(hit_test(&dets, ClickEvent::new(12, 12)), Some(bbox(5, 5, 10, 10)));
        assert_eq!(hit_test(&dets, ClickEvent::new(60, 60)), None);
    }
}
