//! Tiny 3x5 bitmap font for diagnostic text, so annotation needs no font
//! files. Lowercase is drawn as uppercase; unknown characters leave a gap.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

/// Rows top to bottom, 3 bits each, bit 2 is the left column.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c.to_ascii_uppercase() {
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
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '/' => [0x1, 0x1, 0x2, 0x4, 0x4],
        '(' => [0x2, 0x4, 0x4, 0x4, 0x2],
        ')' => [0x2, 0x1, 0x1, 0x1, 0x2],
        ' ' => [0x0; 5],
        _ => return None,
    };
    Some(rows)
}

/// Horizontal advance of one character.
fn advance(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale
}

pub fn line_height(scale: u32) -> u32 {
    (GLYPH_H + 2) * scale
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * advance(scale)
}

/// Draw `text` with its top-left at `(x, y)`. Pixels off the canvas are
/// clipped.
pub fn draw_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1);
    let mut cx = x;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if (bits >> (GLYPH_W - 1 - col)) & 1 == 1 {
                        let px = cx + (col * scale) as i32;
                        let py = y + (row as u32 * scale) as i32;
                        draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(scale, scale), color);
                    }
                }
            }
        }
        cx += advance(scale) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_lit_cells() {
        let mut img = RgbImage::new(20, 10);
        draw_text(&mut img, 0, 0, "1", Rgb([255, 255, 255]), 1);
        // '1' top row is 0b010
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
        // bottom row is solid
        assert_eq!(img.get_pixel(0, 4), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(2, 4), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_clips_off_canvas() {
        let mut img = RgbImage::new(4, 4);
        draw_text(&mut img, -3, -3, "IPD: 63.0 MM", Rgb([255, 0, 0]), 2);
        draw_text(&mut img, 100, 100, "ROLL", Rgb([255, 0, 0]), 2);
    }

    #[test]
    fn test_metrics() {
        assert_eq!(text_width("ABC", 2), 24);
        assert_eq!(line_height(2), 14);
        assert!(glyph('%').is_none());
        assert_eq!(glyph('a'), glyph('A'));
    }
}
