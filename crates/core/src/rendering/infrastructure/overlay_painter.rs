use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::rendering::domain::presenter::Hud;
use crate::selection::domain::render_instruction::{DrawnBox, RenderInstruction};
use crate::selection::domain::track_state::Mode;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::STATUS_TRACKING_FAILED;
use crate::shared::frame::Frame;

use super::bitmap_font;

pub const DETECTION_COLOR: [u8; 3] = [0, 255, 0];
pub const TARGET_COLOR: [u8; 3] = [255, 0, 0];
pub const HUD_COLOR: [u8; 3] = [100, 255, 0];
const STATUS_COLOR: [u8; 3] = [255, 255, 255];

const LINE_THICKNESS: i32 = 2;
const CENTER_RADIUS: i32 = 3;
const TEXT_SCALE: i32 = 2;
const MARGIN: i32 = 6;

/// Burns a [`RenderInstruction`] and the HUD into a frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayPainter;

impl OverlayPainter {
    pub fn new() -> Self {
        Self
    }

    /// Returns an annotated copy; the input frame is left untouched.
    pub fn paint(&self, frame: &Frame, instruction: &RenderInstruction, hud: &Hud) -> Frame {
        let color = match instruction.mode {
            Mode::Detecting => DETECTION_COLOR,
            Mode::Tracking => TARGET_COLOR,
        };

        let mut canvas = match draw_shapes(frame, &instruction.boxes, color) {
            Some(canvas) => canvas,
            None => {
                log::debug!("Skipping box outlines on {}-channel frame", frame.channels());
                frame.clone()
            }
        };
        for drawn in &instruction.boxes {
            draw_label(&mut canvas, drawn, color);
        }

        let status_color = if instruction.status == STATUS_TRACKING_FAILED {
            TARGET_COLOR
        } else {
            STATUS_COLOR
        };
        bitmap_font::draw_text(
            &mut canvas,
            MARGIN,
            MARGIN,
            instruction.status,
            status_color,
            TEXT_SCALE,
        );

        let hud_line = hud_text(hud);
        if !hud_line.is_empty() {
            let y = MARGIN * 2 + bitmap_font::text_height(TEXT_SCALE);
            bitmap_font::draw_text(&mut canvas, MARGIN, y, &hud_line, HUD_COLOR, TEXT_SCALE);
        }

        canvas
    }
}

/// One-line summary of frame rate and steering, e.g. `FPS 29.8  YAW +0.049 RAD/S`.
pub fn hud_text(hud: &Hud) -> String {
    let mut parts = Vec::new();
    if let Some(fps) = hud.fps {
        parts.push(format!("FPS {fps:.1}"));
    }
    if let Some(cmd) = hud.steering {
        parts.push(format!(
            "ERR {:+.0}PX  YAW {:+.3} RAD/S",
            cmd.x_error_px, cmd.yaw_rate
        ));
    }
    parts.join("  ")
}

/// Outlines and centre rings for every box, drawn with `imageproc` on an
/// RGB copy of `frame`. `None` when the frame is not RGB.
fn draw_shapes(frame: &Frame, boxes: &[DrawnBox], color: [u8; 3]) -> Option<Frame> {
    if frame.channels() != 3 {
        return None;
    }
    let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())?;
    for drawn in boxes {
        outline(&mut img, &drawn.bbox, Rgb(color));
        for r in CENTER_RADIUS - 1..=CENTER_RADIUS {
            draw_hollow_circle_mut(&mut img, drawn.center, r, Rgb(color));
        }
    }
    Some(Frame::new(
        img.into_raw(),
        frame.width(),
        frame.height(),
        3,
        frame.index(),
    ))
}

/// `LINE_THICKNESS` nested rectangles, drawn inward from the box edges.
fn outline(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for k in 0..LINE_THICKNESS {
        let (w, h) = (bbox.width() - 2 * k, bbox.height() - 2 * k);
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x() + k, bbox.y() + k).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

fn draw_label(frame: &mut Frame, drawn: &DrawnBox, color: [u8; 3]) {
    let label_h = bitmap_font::text_height(TEXT_SCALE);
    let above = drawn.bbox.y() - label_h - LINE_THICKNESS - 1;
    // Labels for boxes touching the top edge go just inside the box instead.
    let y = if above >= 0 {
        above
    } else {
        drawn.bbox.y() + LINE_THICKNESS + 1
    };
    bitmap_font::draw_text(frame, drawn.bbox.x(), y, &drawn.label, color, TEXT_SCALE);
}
