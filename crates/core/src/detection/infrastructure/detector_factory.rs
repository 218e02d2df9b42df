use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};

use super::model_resolver::{self, ProgressFn};
use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::onnx_yolo_detector::OnnxYoloDetector;

/// Face detector backend, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Yolo,
    Blazeface,
}

impl DetectorKind {
    pub const ALL: &[DetectorKind] = &[DetectorKind::Yolo, DetectorKind::Blazeface];

    /// Whether the backend can fetch its own model when none is given.
    pub fn has_default_model(&self) -> bool {
        matches!(self, DetectorKind::Yolo)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Yolo => write!(f, "yolo"),
            DetectorKind::Blazeface => write!(f, "blazeface"),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<String> = Self::ALL.iter().map(ToString::to_string).collect();
                format!("Detector must be one of {}, got '{s}'", names.join(", "))
            })
    }
}

/// Builds a detector of the requested kind.
///
/// `model_path` overrides the backend's default model. BlazeFace has no
/// default and requires it.
pub fn create_detector(
    kind: DetectorKind,
    model_path: Option<&Path>,
    confidence: f64,
    progress: Option<ProgressFn>,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    match kind {
        DetectorKind::Yolo => {
            let path = model_resolver::resolve(YOLO_MODEL_NAME, YOLO_MODEL_URL, model_path, progress)?;
            Ok(Box::new(OnnxYoloDetector::new(&path, confidence)?))
        }
        DetectorKind::Blazeface => {
            let path = model_path.ok_or("The blazeface detector requires --model <PATH>")?;
            let path = model_resolver::require_existing(path)?;
            Ok(Box::new(OnnxBlazefaceDetector::new(&path, confidence)?))
        }
    }
}
