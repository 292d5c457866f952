//! Sizing, posing and compositing a product sprite onto a face.
//!
//! Every stage returns a [`Result`]; [`place`] is the boundary where a
//! failure turns into "leave the frame alone and report nothing".

use image::{imageops, DynamicImage, Rgba, RgbaImage, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use serde::Serialize;

use crate::compositor::{self, Blit};
use crate::dimensions::{GlassesDimensions, HatDimensions, ProductDimensions, ProductKind};
use crate::error::{FitError, Result};
use crate::landmarks::Point;
use crate::measurement::FacialMeasurement;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    Glasses,
    Hat,
    /// Eye-centered, sized from eye distance, no pose correction.
    Basic,
}

/// How far the head pose is from the range where the 2D warp is trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadPose {
    pub yaw_degrees: f32,
    pub roll_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementResult {
    pub mode: PlacementMode,
    /// Top-left corner of the sprite in frame pixels.
    pub position: Point,
    pub size_px: (u32, u32),
    /// Physical size the pixel size was derived from.
    pub size_mm: Option<(f32, f32)>,
    pub accuracy: Accuracy,
    pub head_pose: HeadPose,
    pub rotation_applied: bool,
    pub yaw_offset_px: i32,
    pub blit: Blit,
}

/// Geometry decided before any pixels are touched.
#[derive(Debug, Clone, PartialEq)]
struct Plan {
    mode: PlacementMode,
    width: u32,
    height: u32,
    x: i64,
    y: i64,
    size_mm: Option<(f32, f32)>,
    rotation: Option<f32>,
    yaw_offset: i32,
}

/// Place `sprite` on `canvas` for the given product.
///
/// Returns `None` and leaves `canvas` untouched when the sprite or the
/// measurement is missing, or when any stage fails.
pub fn place(
    canvas: &mut RgbImage,
    sprite: Option<&DynamicImage>,
    measurement: Option<&FacialMeasurement>,
    kind: &ProductKind,
    dimensions: Option<&ProductDimensions>,
    tuning: &Tuning,
) -> Option<PlacementResult> {
    let (Some(sprite), Some(measurement)) = (sprite, measurement) else {
        log::debug!("{kind}: nothing to place (sprite or measurement missing)");
        return None;
    };

    match try_place(canvas, sprite, measurement, kind, dimensions, tuning) {
        Ok(result) => Some(result),
        Err(e) => {
            log::warn!("{kind}: placement skipped: {e}");
            None
        }
    }
}

pub fn try_place(
    canvas: &mut RgbImage,
    sprite: &DynamicImage,
    measurement: &FacialMeasurement,
    kind: &ProductKind,
    dimensions: Option<&ProductDimensions>,
    tuning: &Tuning,
) -> Result<PlacementResult> {
    compositor::check_sprite(sprite)?;

    let plan = match (kind, dimensions) {
        (ProductKind::Glasses, Some(ProductDimensions::Glasses(g))) => {
            plan_glasses(measurement, g, tuning)?
        }
        (ProductKind::Hat, Some(ProductDimensions::Hat(h))) => plan_hat(measurement, h, tuning)?,
        _ => plan_basic(measurement, sprite, tuning)?,
    };
    check_extent(&plan, canvas)?;
    let position = Point::new(
        i32::try_from(plan.x).map_err(|_| FitError::DegenerateGeometry("x out of range"))?,
        i32::try_from(plan.y).map_err(|_| FitError::DegenerateGeometry("y out of range"))?,
    );

    let resized = resize_sprite(&sprite.to_rgba8(), plan.width, plan.height);
    let posed = match plan.rotation {
        Some(theta) => rotate_sprite(&resized, theta),
        None => resized,
    };
    let blit = compositor::composite(canvas, &DynamicImage::ImageRgba8(posed), plan.x, plan.y)?;

    let accuracy = match plan.mode {
        PlacementMode::Basic => Accuracy::Low,
        _ => classify(measurement, tuning),
    };

    log::debug!(
        "{kind}: {:?} {}x{} at ({}, {}) rotation={:?} yaw_offset={}",
        plan.mode,
        plan.width,
        plan.height,
        plan.x,
        plan.y,
        plan.rotation,
        plan.yaw_offset
    );

    Ok(PlacementResult {
        mode: plan.mode,
        position,
        size_px: (plan.width, plan.height),
        size_mm: plan.size_mm,
        accuracy,
        head_pose: HeadPose {
            yaw_degrees: measurement.head_yaw_degrees(),
            roll_degrees: measurement.head_roll_degrees(),
        },
        rotation_applied: plan.rotation.is_some(),
        yaw_offset_px: plan.yaw_offset,
        blit,
    })
}

fn plan_glasses(m: &FacialMeasurement, g: &GlassesDimensions, tuning: &Tuning) -> Result<Plan> {
    let (width, height) = target_size(g.frame_width_mm, g.frame_height_mm, m.pixels_per_mm)?;
    let yaw_offset = yaw_offset(m, width, tuning.glasses_yaw_factor, tuning);

    Ok(Plan {
        mode: PlacementMode::Glasses,
        width,
        height,
        x: m.eye_center.x as i64 - (width / 2) as i64 + yaw_offset as i64,
        y: m.eye_center.y as i64 - (height / 2) as i64,
        size_mm: Some((g.frame_width_mm, g.frame_height_mm)),
        rotation: roll_rotation(m, tuning),
        yaw_offset,
    })
}

fn plan_hat(m: &FacialMeasurement, h: &HatDimensions, tuning: &Tuning) -> Result<Plan> {
    let (width, height) = target_size(h.hat_width_mm, h.hat_height_mm, m.pixels_per_mm)?;
    let yaw_offset = yaw_offset(m, width, tuning.hat_yaw_factor, tuning);
    let overlap = (tuning.hat_overlap * height as f32) as i64;

    Ok(Plan {
        mode: PlacementMode::Hat,
        width,
        height,
        x: m.forehead_center.x as i64 - (width / 2) as i64 + yaw_offset as i64,
        y: m.forehead_center.y as i64 - height as i64 + overlap,
        size_mm: Some((h.hat_width_mm, h.hat_height_mm)),
        rotation: roll_rotation(m, tuning),
        yaw_offset,
    })
}

fn plan_basic(m: &FacialMeasurement, sprite: &DynamicImage, tuning: &Tuning) -> Result<Plan> {
    let width = (m.ipd_pixels * tuning.basic_width_factor) as u32;
    let height = (width as f32 * sprite.height() as f32 / sprite.width() as f32) as u32;
    if width == 0 || height == 0 {
        return Err(FitError::DegenerateGeometry("basic placement size is zero"));
    }

    Ok(Plan {
        mode: PlacementMode::Basic,
        width,
        height,
        x: m.eye_center.x as i64 - (width / 2) as i64,
        y: m.eye_center.y as i64 - (height / 2) as i64,
        size_mm: None,
        rotation: None,
        yaw_offset: 0,
    })
}

fn target_size(width_mm: f32, height_mm: f32, pixels_per_mm: f32) -> Result<(u32, u32)> {
    let width = width_mm * pixels_per_mm;
    let height = height_mm * pixels_per_mm;
    if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
        return Err(FitError::DegenerateGeometry("target size below one pixel"));
    }
    Ok((width as u32, height as u32))
}

/// A sprite may grow to at most this many canvas widths or heights.
const MAX_CANVAS_SCALE: u32 = 4;

fn check_extent(plan: &Plan, canvas: &RgbImage) -> Result<()> {
    let max_width = canvas.width().saturating_mul(MAX_CANVAS_SCALE);
    let max_height = canvas.height().saturating_mul(MAX_CANVAS_SCALE);
    if plan.width > max_width || plan.height > max_height {
        return Err(FitError::DegenerateGeometry("sprite would dwarf the frame"));
    }
    Ok(())
}

fn roll_rotation(m: &FacialMeasurement, tuning: &Tuning) -> Option<f32> {
    (m.head_roll_radians.abs() > tuning.roll_threshold_rad).then_some(m.head_roll_radians)
}

fn yaw_offset(m: &FacialMeasurement, width: u32, factor: f32, tuning: &Tuning) -> i32 {
    if m.head_yaw_radians.abs() > tuning.yaw_threshold_rad {
        (m.head_yaw_radians * width as f32 * factor) as i32
    } else {
        0
    }
}

/// Coarse trust label: how close yaw and roll come to the correction
/// thresholds.
pub fn classify(m: &FacialMeasurement, tuning: &Tuning) -> Accuracy {
    let ratio = (m.head_yaw_radians.abs() / tuning.yaw_threshold_rad)
        .max(m.head_roll_radians.abs() / tuning.roll_threshold_rad);
    if ratio < 0.5 {
        Accuracy::High
    } else if ratio <= 1.0 {
        Accuracy::Medium
    } else {
        Accuracy::Low
    }
}

/// Resize both axes independently; the catalog decides the aspect.
pub fn resize_sprite(sprite: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(sprite, width, height, imageops::FilterType::Triangle)
}

/// Rotate about the sprite center, keeping its size. Positive angles turn
/// clockwise on screen, the same sense as the eye-line roll in image
/// coordinates. Uncovered corners are transparent.
pub fn rotate_sprite(sprite: &RgbaImage, radians: f32) -> RgbaImage {
    rotate_about_center(sprite, radians, Interpolation::Bilinear, Rgba([0, 0, 0, 0]))
}
