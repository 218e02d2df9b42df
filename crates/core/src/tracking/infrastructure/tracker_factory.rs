use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::domain::face_detector::FaceDetector;
use crate::tracking::domain::object_tracker::ObjectTracker;

use super::mosse_tracker::MosseTracker;
use super::redetect_tracker::{RedetectTracker, DEFAULT_MIN_IOU};

/// Tracker algorithm, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    Mosse,
    Redetect,
}

impl TrackerKind {
    pub const ALL: &[TrackerKind] = &[TrackerKind::Mosse, TrackerKind::Redetect];

    /// Whether building this tracker consumes a second face detector.
    pub fn needs_detector(&self) -> bool {
        matches!(self, TrackerKind::Redetect)
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerKind::Mosse => write!(f, "mosse"),
            TrackerKind::Redetect => write!(f, "redetect"),
        }
    }
}

impl FromStr for TrackerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<String> = Self::ALL.iter().map(ToString::to_string).collect();
                format!("Tracker must be one of {}, got '{s}'", names.join(", "))
            })
    }
}

pub fn create_tracker(
    kind: TrackerKind,
    redetector: Option<Box<dyn FaceDetector>>,
) -> Result<Box<dyn ObjectTracker>, Box<dyn std::error::Error>> {
    match kind {
        TrackerKind::Mosse => Ok(Box::new(MosseTracker::default())),
        TrackerKind::Redetect => {
            let detector = redetector.ok_or("The redetect tracker needs its own face detector")?;
            Ok(Box::new(RedetectTracker::new(detector, DEFAULT_MIN_IOU)))
        }
    }
}
