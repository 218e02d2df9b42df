//! Tiny 3×5 bitmap font for burning overlay text into frames.

use crate::shared::frame::Frame;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;

/// Horizontal advance per character at the given scale.
pub fn advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * advance(scale)
}

pub fn text_height(scale: i32) -> i32 {
    GLYPH_HEIGHT * scale
}

/// Draws `text` with its top-left corner at `(x, y)`. Letters are rendered
/// uppercase; pixels outside the frame are skipped.
pub fn draw_text(frame: &mut Frame, x: i32, y: i32, text: &str, rgb: [u8; 3], scale: i32) {
    let mut cx = x;
    for c in text.chars() {
        draw_glyph(frame, cx, y, glyph(c), rgb, scale);
        cx += advance(scale);
    }
}

fn draw_glyph(frame: &mut Frame, x: i32, y: i32, rows: [u8; 5], rgb: [u8; 3], scale: i32) {
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                continue;
            }
            let px = x + col * scale;
            let py = y + row as i32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    frame.put_pixel(px + dx, py + dy, rgb);
                }
            }
        }
    }
}

/// Row bitmaps, most significant of the low three bits is the leftmost column.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'B' => [0x6, 0x5, 0x6, 0x5, 0x6],
        'C' => [0x3, 0x4, 0x4, 0x4, 0x3],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x3, 0x4, 0x5, 0x5, 0x3],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'J' => [0x1, 0x1, 0x1, 0x5, 0x2],
        'K' => [0x5, 0x5, 0x6, 0x5, 0x5],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x7, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x2, 0x5, 0x5, 0x5, 0x2],
        'P' => [0x6, 0x5, 0x6, 0x4, 0x4],
        'Q' => [0x2, 0x5, 0x5, 0x6, 0x3],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'U' => [0x5, 0x5, 0x5, 0x5, 0x7],
        'V' => [0x5, 0x5, 0x5, 0x5, 0x2],
        'W' => [0x5, 0x5, 0x7, 0x7, 0x5],
        'X' => [0x5, 0x5, 0x2, 0x5, 0x5],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        'Z' => [0x7, 0x1, 0x2, 0x4, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        ',' => [0x0, 0x0, 0x0, 0x2, 0x4],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '!' => [0x2, 0x2, 0x2, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '+' => [0x0, 0x2, 0x7, 0x2, 0x0],
        '=' => [0x0, 0x7, 0x0, 0x7, 0x0],
        '/' => [0x1, 0x1, 0x2, 0x4, 0x4],
        '%' => [0x5, 0x1, 0x2, 0x4, 0x5],
        '(' => [0x2, 0x4, 0x4, 0x4, 0x2],
        ')' => [0x2, 0x1, 0x1, 0x1, 0x2],
        _ => [0x6, 0x1, 0x2, 0x0, 0x2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 0)
    }

    fn lit(frame: &Frame) -> usize {
        frame.data().chunks(3).filter(|p| p.iter().any(|&v| v > 0)).count()
    }

    #[test]
    fn test_measurements_scale() {
        assert_eq!(text_width("FPS", 1), 12);
        assert_eq!(text_width("FPS", 2), 24);
        assert_eq!(text_height(3), 15);
    }

    #[test]
    fn test_space_draws_nothing() {
        let mut frame = blank(20, 10);
        draw_text(&mut frame, 0, 0, "   ", [255, 255, 255], 1);
        assert_eq!(lit(&frame), 0);
    }

    #[test]
    fn test_digit_one_pixel_count() {
        // '1' rows: 010 110 010 010 111 -> 8 pixels
        let mut frame = blank(10, 10);
        draw_text(&mut frame, 0, 0, "1", [255, 255, 255], 1);
        assert_eq!(lit(&frame), 8);
        assert_eq!(frame.pixel(1, 0), &[255, 255, 255]);
        assert_eq!(frame.pixel(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_scale_multiplies_pixels() {
        let mut frame = blank(20, 20);
        draw_text(&mut frame, 0, 0, "1", [255, 255, 255], 2);
        assert_eq!(lit(&frame), 32);
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        assert_eq!(glyph('t'), glyph('T'));
    }

    #[test]
    fn test_text_partially_offscreen_is_clipped() {
        let mut frame = blank(6, 6);
        draw_text(&mut frame, -2, -2, "TRACKING", [255, 0, 0], 1);
        assert!(lit(&frame) > 0);
    }
}
