/// MOSSE correlation-filter tracker (Bolme et al., 2010).
///
/// Learns a filter in the Fourier domain whose correlation with the target
/// patch yields a sharp Gaussian peak. Each update correlates the filter with
/// the patch at the previous position, moves the box to the response peak,
/// and blends the new appearance into the filter. The target size is fixed
/// at the size chosen on init.
///
/// Loss is detected with the peak-to-sidelobe ratio (PSR): a weak or diffuse
/// response means the target is occluded or gone, and the filter is frozen
/// until a confident peak reappears.
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::domain::object_tracker::{ObjectTracker, TrackerError};

/// Longest template side in samples; larger targets are downsampled.
const MAX_TEMPLATE_SIDE: f64 = 64.0;

/// Shortest template side in samples. The response must extend past the
/// sidelobe exclusion window on both sides of the peak or PSR is undefined.
const MIN_TEMPLATE_SIDE: usize = 2 * SIDELOBE_EXCLUSION as usize + 2;

/// Smallest target accepted on init, in frame pixels.
const MIN_TARGET_SIDE: i32 = MIN_TEMPLATE_SIDE as i32;

/// Weight of the newest frame when updating the filter.
const LEARNING_RATE: f32 = 0.125;

/// Standard deviation of the desired Gaussian response, in template samples.
const TARGET_SIGMA: f32 = 2.0;

/// Added to the filter denominator to keep the division stable.
const REGULARIZATION: f32 = 1e-2;

/// Half-size of the window around the peak excluded from the sidelobe.
const SIDELOBE_EXCLUSION: i64 = 5;

/// PSR below which the target counts as lost.
pub const DEFAULT_PSR_THRESHOLD: f32 = 7.0;

pub struct MosseTracker {
    psr_threshold: f32,
    state: Option<MosseState>,
}

struct MosseState {
    bbox: BoundingBox,
    frame_size: (u32, u32),
    template_w: usize,
    template_h: usize,
    fft: Fft2d,
    window: Vec<f32>,
    target: Vec<Complex<f32>>,
    numerator: Vec<Complex<f32>>,
    denominator: Vec<Complex<f32>>,
}

impl MosseTracker {
    pub fn new(psr_threshold: f32) -> Self {
        Self {
            psr_threshold,
            state: None,
        }
    }
}

impl Default for MosseTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PSR_THRESHOLD)
    }
}

impl ObjectTracker for MosseTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<(), TrackerError> {
        let bbox = bbox
            .clamp_to(frame.width(), frame.height())
            .ok_or(TrackerError::BoxOutsideFrame {
                bbox,
                frame_width: frame.width(),
                frame_height: frame.height(),
            })?;
        if bbox.width() < MIN_TARGET_SIDE || bbox.height() < MIN_TARGET_SIDE {
            return Err(TrackerError::TargetTooSmall {
                width: bbox.width(),
                height: bbox.height(),
            });
        }

        let (template_w, template_h) = template_size(&bbox);
        let mut fft = Fft2d::new(template_w, template_h);
        let window = hann_window(template_w, template_h);

        let mut target = gaussian_response(template_w, template_h);
        fft.forward(&mut target);

        let luma = frame.to_luma();
        let mut spectrum = patch_spectrum(
            &luma,
            frame.width(),
            frame.height(),
            &bbox,
            template_w,
            template_h,
            &window,
        );
        fft.forward(&mut spectrum);

        let numerator = target
            .iter()
            .zip(&spectrum)
            .map(|(g, f)| g * f.conj())
            .collect();
        let denominator = spectrum.iter().map(|f| f * f.conj()).collect();

        log::debug!(
            "MOSSE init on {:?} with {}x{} template",
            bbox,
            template_w,
            template_h
        );

        self.state = Some(MosseState {
            bbox,
            frame_size: (frame.width(), frame.height()),
            template_w,
            template_h,
            fft,
            window,
            target,
            numerator,
            denominator,
        });
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>, TrackerError> {
        let state = self.state.as_mut().ok_or(TrackerError::NotInitialized)?;
        let actual = (frame.width(), frame.height());
        if actual != state.frame_size {
            return Err(TrackerError::FrameSizeMismatch {
                expected: state.frame_size,
                actual,
            });
        }

        let luma = frame.to_luma();
        let (tw, th) = (state.template_w, state.template_h);

        let mut response = patch_spectrum(
            &luma,
            frame.width(),
            frame.height(),
            &state.bbox,
            tw,
            th,
            &state.window,
        );
        state.fft.forward(&mut response);
        for ((r, a), b) in response
            .iter_mut()
            .zip(&state.numerator)
            .zip(&state.denominator)
        {
            *r = *r * (*a / (b.re + REGULARIZATION));
        }
        state.fft.inverse(&mut response);
        let plane: Vec<f32> = response.iter().map(|c| c.re).collect();

        let (peak_x, peak_y, psr) = peak_and_psr(&plane, tw, th);
        if psr < self.psr_threshold {
            log::debug!("MOSSE lost target (psr {psr:.2})");
            return Ok(None);
        }

        let scale_x = state.bbox.width() as f64 / tw as f64;
        let scale_y = state.bbox.height() as f64 / th as f64;
        let dx = ((peak_x as f64 - (tw / 2) as f64) * scale_x).round() as i32;
        let dy = ((peak_y as f64 - (th / 2) as f64) * scale_y).round() as i32;
        let moved = state.bbox.translated(dx, dy);
        if moved.clamp_to(frame.width(), frame.height()).is_none() {
            return Ok(None);
        }
        state.bbox = moved;

        let mut spectrum = patch_spectrum(
            &luma,
            frame.width(),
            frame.height(),
            &moved,
            tw,
            th,
            &state.window,
        );
        state.fft.forward(&mut spectrum);
        for (((a, b), g), f) in state
            .numerator
            .iter_mut()
            .zip(state.denominator.iter_mut())
            .zip(&state.target)
            .zip(&spectrum)
        {
            *a = g * f.conj() * LEARNING_RATE + *a * (1.0 - LEARNING_RATE);
            *b = f * f.conj() * LEARNING_RATE + *b * (1.0 - LEARNING_RATE);
        }

        Ok(Some(moved))
    }
}

// ---------------------------------------------------------------------------
// Template preparation
// ---------------------------------------------------------------------------

fn template_size(bbox: &BoundingBox) -> (usize, usize) {
    let longest = bbox.width().max(bbox.height()) as f64;
    let scale = (MAX_TEMPLATE_SIDE / longest).min(1.0);
    let w = ((bbox.width() as f64 * scale).round() as usize).max(MIN_TEMPLATE_SIDE);
    let h = ((bbox.height() as f64 * scale).round() as usize).max(MIN_TEMPLATE_SIDE);
    (w, h)
}

fn hann_window(w: usize, h: usize) -> Vec<f32> {
    let hann = |i: usize, n: usize| {
        0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos())
    };
    let mut window = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            window.push(hann(x, w) * hann(y, h));
        }
    }
    window
}

/// Desired correlation output: a Gaussian peak at the template center.
fn gaussian_response(w: usize, h: usize) -> Vec<Complex<f32>> {
    let cx = (w / 2) as f32;
    let cy = (h / 2) as f32;
    let denom = 2.0 * TARGET_SIGMA * TARGET_SIGMA;
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
            out.push(Complex::new((-d2 / denom).exp(), 0.0));
        }
    }
    out
}

/// Samples the box from the luma plane into a `w × h` template
/// (nearest neighbor, edge pixels replicated), then log-transforms,
/// normalizes and windows it.
fn patch_spectrum(
    luma: &[f32],
    frame_width: u32,
    frame_height: u32,
    bbox: &BoundingBox,
    w: usize,
    h: usize,
    window: &[f32],
) -> Vec<Complex<f32>> {
    let fw = frame_width as i64;
    let fh = frame_height as i64;
    let step_x = bbox.width() as f64 / w as f64;
    let step_y = bbox.height() as f64 / h as f64;

    let mut patch = Vec::with_capacity(w * h);
    for v in 0..h {
        let sy = (bbox.y() as f64 + (v as f64 + 0.5) * step_y).floor() as i64;
        let sy = sy.clamp(0, fh - 1) as usize;
        for u in 0..w {
            let sx = (bbox.x() as f64 + (u as f64 + 0.5) * step_x).floor() as i64;
            let sx = sx.clamp(0, fw - 1) as usize;
            patch.push((1.0 + luma[sy * frame_width as usize + sx]).ln());
        }
    }

    let n = patch.len() as f32;
    let mean = patch.iter().sum::<f32>() / n;
    let var = patch.iter().map(|p| (p - mean).powi(2)).sum::<f32>() / n;
    let std = var.sqrt() + 1e-5;

    patch
        .iter()
        .zip(window)
        .map(|(p, wv)| Complex::new((p - mean) / std * wv, 0.0))
        .collect()
}

/// Locates the response maximum and its peak-to-sidelobe ratio.
fn peak_and_psr(plane: &[f32], w: usize, h: usize) -> (usize, usize, f32) {
    let (peak_idx, peak) = plane
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
    let px = peak_idx % w;
    let py = peak_idx / w;

    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut count = 0usize;
    for y in 0..h {
        for x in 0..w {
            if (x as i64 - px as i64).abs() <= SIDELOBE_EXCLUSION
                && (y as i64 - py as i64).abs() <= SIDELOBE_EXCLUSION
            {
                continue;
            }
            let v = plane[y * w + x];
            sum += v;
            sum_sq += v * v;
            count += 1;
        }
    }
    if count == 0 {
        return (px, py, 0.0);
    }
    let mean = sum / count as f32;
    let std = (sum_sq / count as f32 - mean * mean).max(0.0).sqrt();
    if std <= f32::EPSILON {
        return (px, py, 0.0);
    }
    (px, py, (peak - mean) / std)
}

// ---------------------------------------------------------------------------
// 2D FFT
// ---------------------------------------------------------------------------

/// Row-column 2D FFT over a row-major `w × h` buffer.
struct Fft2d {
    w: usize,
    h: usize,
    row_forward: Arc<dyn Fft<f32>>,
    row_inverse: Arc<dyn Fft<f32>>,
    col_forward: Arc<dyn Fft<f32>>,
    col_inverse: Arc<dyn Fft<f32>>,
    transposed: Vec<Complex<f32>>,
}

impl Fft2d {
    fn new(w: usize, h: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            w,
            h,
            row_forward: planner.plan_fft_forward(w),
            row_inverse: planner.plan_fft_inverse(w),
            col_forward: planner.plan_fft_forward(h),
            col_inverse: planner.plan_fft_inverse(h),
            transposed: vec![Complex::new(0.0, 0.0); w * h],
        }
    }

    fn forward(&mut self, data: &mut [Complex<f32>]) {
        let (row, col) = (self.row_forward.clone(), self.col_forward.clone());
        self.transform(data, row.as_ref(), col.as_ref());
    }

    /// Inverse transform, normalized so `inverse(forward(x)) == x`.
    fn inverse(&mut self, data: &mut [Complex<f32>]) {
        let (row, col) = (self.row_inverse.clone(), self.col_inverse.clone());
        self.transform(data, row.as_ref(), col.as_ref());
        let norm = 1.0 / (self.w * self.h) as f32;
        for v in data.iter_mut() {
            *v *= norm;
        }
    }

    fn transform(&mut self, data: &mut [Complex<f32>], row: &dyn Fft<f32>, col: &dyn Fft<f32>) {
        let (w, h) = (self.w, self.h);
        row.process(data);
        for y in 0..h {
            for x in 0..w {
                self.transposed[x * h + y] = data[y * w + x];
            }
        }
        col.process(&mut self.transposed);
        for y in 0..h {
            for x in 0..w {
                data[y * w + x] = self.transposed[x * h + y];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const FRAME_SIZE: u32 = 128;

    /// Deterministic pseudo-random texture so the target has structure.
    fn texture(seed: u32, w: usize, h: usize) -> Vec<u8> {
        let mut state = seed;
        (0..w * h)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }

    /// Gray frame with a 32×32 textured square at `(x, y)`.
    fn frame_with_target(x: usize, y: usize) -> Frame {
        let size = FRAME_SIZE as usize;
        let patch = texture(7, 32, 32);
        let mut data = vec![100u8; size * size * 3];
        for py in 0..32 {
            for px in 0..32 {
                let v = patch[py * 32 + px];
                let offset = ((y + py) * size + (x + px)) * 3;
                data[offset..offset + 3].copy_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, FRAME_SIZE, FRAME_SIZE, 3, 0)
    }

    fn uniform_frame(value: u8) -> Frame {
        let size = FRAME_SIZE as usize;
        Frame::new(vec![value; size * size * 3], FRAME_SIZE, FRAME_SIZE, 3, 0)
    }

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    #[test]
    fn test_update_before_init_errors() {
        let mut tracker = MosseTracker::default();
        let result = tracker.update(&uniform_frame(0));
        assert!(matches!(result, Err(TrackerError::NotInitialized)));
    }

    #[test]
    fn test_init_rejects_box_outside_frame() {
        let mut tracker = MosseTracker::default();
        let result = tracker.init(&uniform_frame(0), bbox(500, 500, 32, 32));
        assert!(matches!(result, Err(TrackerError::BoxOutsideFrame { .. })));
    }

    #[test]
    fn test_init_rejects_tiny_target() {
        let mut tracker = MosseTracker::default();
        let result = tracker.init(&uniform_frame(0), bbox(10, 10, 4, 40));
        assert!(matches!(
            result,
            Err(TrackerError::TargetTooSmall {
                width: 4,
                height: 40
            })
        ));
    }

    #[rstest]
    #[case(8)]
    #[case(10)]
    #[case(11)]
    fn test_init_rejects_target_inside_sidelobe_window(#[case] side: i32) {
        let mut tracker = MosseTracker::default();
        let result = tracker.init(&frame_with_target(40, 40), bbox(40, 40, side, side));
        assert!(matches!(result, Err(TrackerError::TargetTooSmall { .. })));
    }

    #[rstest]
    #[case(12)]
    #[case(16)]
    fn test_smallest_accepted_target_tracks_on_same_frame(#[case] side: i32) {
        let frame = frame_with_target(40, 40);
        let mut tracker = MosseTracker::default();
        tracker.init(&frame, bbox(44, 44, side, side)).unwrap();

        assert_eq!(tracker.update(&frame).unwrap(), Some(bbox(44, 44, side, side)));
    }

    #[test]
    fn test_same_frame_keeps_box() {
        let frame = frame_with_target(40, 40);
        let mut tracker = MosseTracker::default();
        tracker.init(&frame, bbox(40, 40, 32, 32)).unwrap();

        let result = tracker.update(&frame).unwrap();

        assert_eq!(result, Some(bbox(40, 40, 32, 32)));
    }

    #[test]
    fn test_follows_translated_target() {
        let mut tracker = MosseTracker::default();
        tracker
            .init(&frame_with_target(40, 40), bbox(40, 40, 32, 32))
            .unwrap();

        let moved = tracker.update(&frame_with_target(43, 42)).unwrap().unwrap();

        assert!((moved.x() - 43).abs() <= 1, "x = {}", moved.x());
        assert!((moved.y() - 42).abs() <= 1, "y = {}", moved.y());
        assert_eq!((moved.width(), moved.height()), (32, 32));
    }

    #[test]
    fn test_blank_frame_reports_loss() {
        let mut tracker = MosseTracker::default();
        tracker
            .init(&frame_with_target(40, 40), bbox(40, 40, 32, 32))
            .unwrap();

        assert_eq!(tracker.update(&uniform_frame(100)).unwrap(), None);
    }

    #[test]
    fn test_recovers_after_loss() {
        let frame = frame_with_target(40, 40);
        let mut tracker = MosseTracker::default();
        tracker.init(&frame, bbox(40, 40, 32, 32)).unwrap();

        assert_eq!(tracker.update(&uniform_frame(100)).unwrap(), None);
        assert_eq!(
            tracker.update(&frame).unwrap(),
            Some(bbox(40, 40, 32, 32))
        );
    }

    #[test]
    fn test_frame_size_change_errors() {
        let mut tracker = MosseTracker::default();
        tracker
            .init(&frame_with_target(40, 40), bbox(40, 40, 32, 32))
            .unwrap();

        let small = Frame::new(vec![0u8; 64 * 64 * 3], 64, 64, 3, 1);
        assert!(matches!(
            tracker.update(&small),
            Err(TrackerError::FrameSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_template_size_downsamples_large_targets() {
        assert_eq!(template_size(&bbox(0, 0, 32, 16)), (32, 16));
        assert_eq!(template_size(&bbox(0, 0, 256, 128)), (64, 32));
        assert_eq!(template_size(&bbox(0, 0, 400, 8)), (64, MIN_TEMPLATE_SIDE));
    }

    #[test]
    fn test_fft_roundtrip_restores_input() {
        let mut fft = Fft2d::new(8, 4);
        let original: Vec<Complex<f32>> =
            (0..32).map(|i| Complex::new(i as f32, 0.0)).collect();
        let mut data = original.clone();

        fft.forward(&mut data);
        fft.inverse(&mut data);

        for (a, b) in data.iter().zip(&original) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-3);
            assert_relative_eq!(a.im, 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_peak_and_psr_finds_sharp_peak() {
        let mut plane: Vec<f32> = (0..400).map(|i| ((i * 37) % 11) as f32 * 0.01).collect();
        plane[10 * 20 + 7] = 5.0;

        let (x, y, psr) = peak_and_psr(&plane, 20, 20);

        assert_eq!((x, y), (7, 10));
        assert!(psr > DEFAULT_PSR_THRESHOLD);
    }

    #[test]
    fn test_peak_and_psr_flat_plane_is_zero() {
        let plane = vec![0.0f32; 400];
        let (_, _, psr) = peak_and_psr(&plane, 20, 20);
        assert_eq!(psr, 0.0);
    }
}
