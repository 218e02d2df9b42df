//! YOLO face detection on ONNX Runtime. Only the box and score columns of
//! the output are read; landmark columns from pose-style exports are skipped.
use std::path::Path;

use crate::detection::domain::face_detector::{Detection, FaceDetector};
use crate::shared::frame::Frame;

use super::nms::{nms, ScoredBox};

/// Input side used for models with a dynamic input shape.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.3;

/// Overlap above which the weaker of two boxes is suppressed.
const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Loads `model_path`. The network's square input side comes from its
    /// NCHW input shape, or [`DEFAULT_INPUT_SIZE`] when that is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        let input_size = fixed_input_side(&session).unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded YOLO face model {} (input {input_size}px, confidence {confidence})",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

/// Height of the first input when the model declares a static `[N, C, H, W]`.
fn fixed_input_side(session: &ort::session::Session) -> Option<u32> {
    let input = session.inputs().first()?;
    match input.dtype() {
        ort::value::ValueType::Tensor { shape, .. } if shape.len() == 4 && shape[2] > 0 => {
            Some(shape[2] as u32)
        }
        _ => None,
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor.clone())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // [1, features, detections] is the usual export; [1, detections, features] also occurs.
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Err(format!("YOLO output has too few features: {num_feats}").into());
        }

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let feature = |det: usize, f: usize| -> f64 {
            if transposed {
                data[f * num_dets + det] as f64
            } else {
                data[det * num_feats + f] as f64
            }
        };

        let mut raw = Vec::new();
        for i in 0..num_dets {
            let conf = feature(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            raw.push(letterboxed.unmap(cx, cy, w, h, conf));
        }

        let kept = nms(&mut raw, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .filter_map(|b| b.into_detection(frame.width(), frame.height()))
            .collect())
    }
}

/// Model input plus the transform that produced it.
struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterboxed {
    /// Maps a center/size box in model input space back to frame coordinates.
    fn unmap(&self, cx: f64, cy: f64, w: f64, h: f64, score: f64) -> ScoredBox {
        let px = self.pad_x as f64;
        let py = self.pad_y as f64;
        ScoredBox {
            x1: ((cx - w / 2.0) - px) / self.scale,
            y1: ((cy - h / 2.0) - py) / self.scale,
            x2: ((cx + w / 2.0) - px) / self.scale,
            y2: ((cy + h / 2.0) - py) / self.scale,
            score,
        }
    }
}

/// Gray used by YOLO for letterbox bars, as a normalized channel value.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Scales `frame` to fit a `side`-pixel square without distortion, centers
/// it on gray bars and lays it out as a normalized NCHW tensor.
fn letterbox(frame: &Frame, side: u32) -> Letterboxed {
    let (src_w, src_h) = (frame.width() as usize, frame.height() as usize);
    let scale = (side as f64 / src_w as f64).min(side as f64 / src_h as f64);
    let fit = |len: usize| ((len as f64 * scale).round() as u32).min(side);
    let (pad_x, pad_y) = ((side - fit(src_w)) / 2, (side - fit(src_h)) / 2);

    let n = side as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, n, n), PAD_VALUE);
    let pixels = frame.as_ndarray();

    // Nearest-neighbour sampling of the source for each content pixel.
    let sample = |dst: usize, pad: u32, len: usize| {
        (((dst - pad as usize) as f64 / scale) as usize).min(len - 1)
    };
    for ty in pad_y as usize..(pad_y + fit(src_h)) as usize {
        let sy = sample(ty, pad_y, src_h);
        for tx in pad_x as usize..(pad_x + fit(src_w)) as usize {
            let sx = sample(tx, pad_x, src_w);
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = f32::from(pixels[[sy, sx, c]]) / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, content 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let lb = letterbox(&frame, 640);

        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert!((lb.scale - 3.2).abs() < 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let lb = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        let x = lb.pad_x as usize + 1;
        assert!((lb.tensor[[0, 0, y, x]] - 1.0).abs() < 0.01);
        assert!((lb.tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        // 200x100 frame: scale 3.2, pad_y 160.
        // Frame box (50,25)-(150,75) → model center (320, 320), size 320x160.
        let frame = Frame::new(vec![0u8; 200 * 100 * 3], 200, 100, 3, 0);
        let lb = letterbox(&frame, 640);
        let b = lb.unmap(320.0, 320.0, 320.0, 160.0, 0.9);

        assert!((b.x1 - 50.0).abs() < 1e-6);
        assert!((b.y1 - 25.0).abs() < 1e-6);
        assert!((b.x2 - 150.0).abs() < 1e-6);
        assert!((b.y2 - 75.0).abs() < 1e-6);
        assert!((b.score - 0.9).abs() < 1e-9);
    }
}
