//! Alpha blitting of product sprites onto camera frames.
//!
//! The canvas may be RGB or BGR; blending is per channel, so the sprite only
//! has to use the same channel order as the canvas.

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::Serialize;

use crate::error::{FitError, Result};

/// Outcome of a blit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Blit {
    /// Sprite rectangle does not touch the canvas; nothing was written.
    Outside,
    /// Canvas rectangle that was blended, after clipping.
    Blended {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// A sprite must carry an alpha channel and cover at least one pixel.
pub fn check_sprite(sprite: &DynamicImage) -> Result<()> {
    if !sprite.color().has_alpha() {
        return Err(FitError::InvalidSprite(format!(
            "expected an alpha channel, got {:?}",
            sprite.color()
        )));
    }
    if sprite.width() == 0 || sprite.height() == 0 {
        return Err(FitError::InvalidSprite("empty sprite".into()));
    }
    Ok(())
}

/// Composite `sprite` with its top-left corner at `(x, y)`.
///
/// `(x, y)` may lie partly or fully outside the canvas. A sprite rejected
/// by [`check_sprite`] leaves the canvas untouched.
pub fn composite(canvas: &mut RgbImage, sprite: &DynamicImage, x: i64, y: i64) -> Result<Blit> {
    check_sprite(sprite)?;

    match sprite {
        DynamicImage::ImageRgba8(rgba) => Ok(blend(canvas, rgba, x, y)),
        other => Ok(blend(canvas, &other.to_rgba8(), x, y)),
    }
}

/// `canvas = canvas * (1 - a) + sprite * a` over the intersection, with
/// `a = alpha / 255`.
fn blend(canvas: &mut RgbImage, sprite: &RgbaImage, x: i64, y: i64) -> Blit {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let (sprite_w, sprite_h) = (sprite.width() as i64, sprite.height() as i64);

    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + sprite_w).min(canvas_w);
    let end_y = (y + sprite_h).min(canvas_h);

    if end_x <= start_x || end_y <= start_y {
        return Blit::Outside;
    }

    for cy in start_y..end_y {
        for cx in start_x..end_x {
            let src = sprite.get_pixel((cx - x) as u32, (cy - y) as u32);
            let alpha = src[3] as f32 / 255.0;
            if alpha == 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
            for c in 0..3 {
                dst[c] = (dst[c] as f32 * (1.0 - alpha) + src[c] as f32 * alpha) as u8;
            }
        }
    }

    Blit::Blended {
        x: start_x as u32,
        y: start_y as u32,
        width: (end_x - start_x) as u32,
        height: (end_y - start_y) as u32,
    }
}
