use crate::shared::bounding_box::BoundingBox;

/// Which collaborator the controller consults for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Detecting,
    Tracking,
}

/// Controller-owned selection state.
///
/// `active_box` is the last box the tracker reported with confidence. It
/// survives frames where the target is lost so the tracker can recover
/// without a fresh selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackState {
    pub mode: Mode,
    pub active_box: Option<BoundingBox>,
}

impl TrackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_tracking(&mut self, bbox: BoundingBox) {
        self.mode = Mode::Tracking;
        self.active_box = Some(bbox);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_tracking(&self) -> bool {
        self.mode == Mode::Tracking
    }
}
