//! Diagnostic annotation: anchor markers plus a text block of the
//! measurements, for calibrating against real frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::dimensions::ProductDimensions;
use crate::glyphs;
use crate::landmarks::Point;
use crate::measurement::FacialMeasurement;

const EYE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const NOSE_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const FOREHEAD_COLOR: Rgb<u8> = Rgb([255, 64, 64]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const PANEL_COLOR: Rgb<u8> = Rgb([24, 24, 24]);
const MARGIN: i32 = 8;

/// Draw markers and the measurement report onto `canvas`.
pub fn annotate(
    canvas: &mut RgbImage,
    measurement: &FacialMeasurement,
    dimensions: Option<&ProductDimensions>,
) {
    if canvas.width() == 0 || canvas.height() == 0 {
        return;
    }

    let radius = (canvas.width().min(canvas.height()) / 160).max(2) as i32;
    marker(canvas, measurement.eye_center, radius, EYE_COLOR);
    marker(canvas, measurement.nose_bridge, radius, NOSE_COLOR);
    marker(canvas, measurement.forehead_center, radius, FOREHEAD_COLOR);

    let scale = (canvas.width() / 320 * 2).max(2);
    let lines = report_lines(measurement, dimensions);
    let line_h = glyphs::line_height(scale);
    let panel_w = lines
        .iter()
        .map(|l| glyphs::text_width(l, scale))
        .max()
        .unwrap_or(0)
        + 2 * scale;
    let panel_h = line_h * lines.len() as u32 + scale;

    draw_filled_rect_mut(
        canvas,
        Rect::at(MARGIN - scale as i32, MARGIN - scale as i32).of_size(panel_w.max(1), panel_h.max(1)),
        PANEL_COLOR,
    );
    for (i, line) in lines.iter().enumerate() {
        let y = MARGIN + (i as u32 * line_h) as i32;
        glyphs::draw_text(canvas, MARGIN, y, line, TEXT_COLOR, scale);
    }
}

fn marker(canvas: &mut RgbImage, at: Point, radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(canvas, (at.x, at.y), radius, color);
}

/// Text block shown by [`annotate`].
pub fn report_lines(
    measurement: &FacialMeasurement,
    dimensions: Option<&ProductDimensions>,
) -> Vec<String> {
    let mut lines = vec![
        format!("IPD: {:.1} MM", measurement.ipd_mm),
        format!("FACE: {:.1} MM", measurement.face_width_mm),
        format!("YAW: {:.1} DEG", measurement.head_yaw_degrees()),
        format!("ROLL: {:.1} DEG", measurement.head_roll_degrees()),
    ];
    match dimensions {
        Some(ProductDimensions::Glasses(g)) => {
            lines.push(format!("FRAME: {:.0}X{:.0} MM", g.frame_width_mm, g.frame_height_mm));
        }
        Some(ProductDimensions::Hat(h)) => {
            lines.push(format!("HAT: {:.0}X{:.0} MM", h.hat_width_mm, h.hat_height_mm));
        }
        None => {}
    }
    lines
}
