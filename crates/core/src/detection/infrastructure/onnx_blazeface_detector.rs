//! Short-range BlazeFace detection on ONNX Runtime. Cheap enough to run on
//! every frame on a laptop CPU; small or distant faces are missed.
use std::path::Path;

use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::shared::frame::Frame;

use super::nms::{nms, ScoredBox};

const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

#[cfg(test)]
const NUM_ANCHORS: usize = 896;

/// Floats per anchor in the regression output: a box then six keypoints.
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        log::info!(
            "Loaded BlazeFace model {} (confidence {confidence})",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let input = ort::value::Tensor::from_array(resize_to_tensor(frame, INPUT_SIZE))?;
        let outputs = self.session.run(ort::inputs![input])?;
        // Output 0 holds box regressions [1, 896, 16], output 1 raw scores [1, 896, 1].
        if outputs.len() < 2 {
            return Err(format!("BlazeFace model has {} outputs, expected 2", outputs.len()).into());
        }

        let regressions = outputs[0].try_extract_array::<f32>()?;
        let logits = outputs[1].try_extract_array::<f32>()?;
        let mut candidates = decode(
            &self.anchors,
            regressions.as_slice().ok_or("BlazeFace regressions are not contiguous")?,
            logits.as_slice().ok_or("BlazeFace scores are not contiguous")?,
            self.confidence,
            (frame.width(), frame.height()),
        );

        Ok(nms(&mut candidates, NMS_IOU_THRESH)
            .into_iter()
            .filter_map(|b| b.into_detection(frame.width(), frame.height()))
            .collect())
    }
}

/// Turns per-anchor offsets into frame-space boxes, keeping those whose
/// sigmoid score reaches `confidence`.
fn decode(
    anchors: &[[f32; 2]],
    regressions: &[f32],
    logits: &[f32],
    confidence: f64,
    (frame_w, frame_h): (u32, u32),
) -> Vec<ScoredBox> {
    let side = INPUT_SIZE as f64;
    anchors
        .iter()
        .zip(logits)
        .zip(regressions.chunks_exact(REGRESSOR_STRIDE))
        .filter_map(|((anchor, &logit), reg)| {
            let score = sigmoid(logit) as f64;
            if score < confidence {
                return None;
            }
            let cx = anchor[0] as f64 + reg[0] as f64 / side;
            let cy = anchor[1] as f64 + reg[1] as f64 / side;
            let (half_w, half_h) = (reg[2] as f64 / side / 2.0, reg[3] as f64 / side / 2.0);
            Some(ScoredBox {
                x1: (cx - half_w) * frame_w as f64,
                y1: (cy - half_h) * frame_h as f64,
                x2: (cx + half_w) * frame_w as f64,
                y2: (cy + half_h) * frame_h as f64,
                score,
            })
        })
        .collect()
}

/// Stretches the frame to a `side`-pixel square (BlazeFace is trained
/// without letterboxing) as a [0, 1] NCHW tensor.
fn resize_to_tensor(frame: &Frame, side: u32) -> ndarray::Array4<f32> {
    let pixels = frame.as_ndarray();
    let (src_h, src_w) = (frame.height() as usize, frame.width() as usize);
    let n = side as usize;
    // Source index of the pixel under the centre of destination cell `i`.
    let nearest = |i: usize, len: usize| (((i as f64 + 0.5) * len as f64 / n as f64) as usize).min(len - 1);

    ndarray::Array4::from_shape_fn((1, 3, n, n), |(_, c, y, x)| {
        f32::from(pixels[[nearest(y, src_h), nearest(x, src_w), c]]) / 255.0
    })
}

/// Anchor centres of the short-range model: two per cell on a 16x16 grid
/// followed by six per cell on an 8x8 grid.
fn generate_anchors() -> Vec<[f32; 2]> {
    const LAYERS: [(usize, usize); 2] = [(8, 2), (16, 6)];
    LAYERS
        .iter()
        .flat_map(|&(stride, per_cell)| {
            let cells = INPUT_SIZE as usize / stride;
            (0..cells * cells).flat_map(move |cell| {
                let centre = |i: usize| (i as f32 + 0.5) / cells as f32;
                let anchor = [centre(cell % cells), centre(cell / cells)];
                std::iter::repeat(anchor).take(per_cell)
            })
        })
        .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
