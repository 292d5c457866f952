//! Facial measurements derived from a landmark set.
//!
//! Scale comes from assuming the wearer has a population-average
//! inter-pupillary distance; there is no camera calibration. Yaw is taken
//! from the normalized depth of the two ear landmarks and is an orientation
//! proxy rather than a calibrated angle.

use serde::Serialize;

use crate::error::{FitError, Result};
use crate::landmarks::{indices, LandmarkSet, Point};
use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialMeasurement {
    pub ipd_pixels: f32,
    /// Real-world IPD the scale is anchored to.
    pub ipd_mm: f32,
    pub pixels_per_mm: f32,
    pub face_width_pixels: f32,
    pub face_width_mm: f32,
    pub head_yaw_radians: f32,
    pub head_roll_radians: f32,
    pub eye_center: Point,
    pub nose_bridge: Point,
    pub forehead_center: Point,
    pub image_size: (u32, u32),
}

/// Measurement rounded for a response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSummary {
    pub ipd_mm: f32,
    pub face_width_mm: f32,
    pub head_yaw_degrees: f32,
    pub head_roll_degrees: f32,
    pub pixels_per_mm: f32,
}

/// Measurement at calibration precision (pixels kept, 2-4 decimals).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementDetail {
    pub ipd_pixels: f32,
    pub ipd_mm: f32,
    pub pixels_per_mm: f32,
    pub face_width_pixels: f32,
    pub face_width_mm: f32,
}

/// Physical scaling against the older sizing rule of a fixed multiple of
/// the eye distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingComparison {
    pub reference_frame_width_mm: f32,
    pub scaled_width_pixels: u32,
    pub eye_distance_width_pixels: u32,
    /// `scaled / eye_distance`, 0 when the eye-distance width is 0.
    pub scaling_ratio: f32,
}

/// Derive a [`FacialMeasurement`] from detector output.
pub fn measure(
    landmarks: &LandmarkSet,
    image_size: (u32, u32),
    tuning: &Tuning,
) -> Result<FacialMeasurement> {
    landmarks.validate()?;

    let ipd_pixels = landmarks.distance_2d(indices::LEFT_EYE_INNER, indices::RIGHT_EYE_INNER)?;
    if !ipd_pixels.is_finite() {
        return Err(FitError::DegenerateGeometry("inner eye distance is not finite"));
    }
    if ipd_pixels <= f32::EPSILON {
        return Err(FitError::DegenerateGeometry("inner eye corners coincide"));
    }
    if tuning.reference_ipd_mm <= 0.0 || tuning.calibration_multiplier <= 0.0 {
        return Err(FitError::DegenerateGeometry("non-positive scale tuning"));
    }

    let pixels_per_mm = (ipd_pixels / tuning.reference_ipd_mm) * tuning.calibration_multiplier;

    let face_width_pixels = landmarks.distance_2d(indices::LEFT_CHEEK, indices::RIGHT_CHEEK)?;
    let face_width_mm = face_width_pixels / pixels_per_mm;

    let left_ear = landmarks.point_3d(indices::LEFT_EAR)?;
    let right_ear = landmarks.point_3d(indices::RIGHT_EAR)?;
    // Folded into (-pi/2, pi/2] so equal ear x always reads as frontal.
    let head_yaw_radians = (right_ear[0] - left_ear[0]).atan2((right_ear[2] - left_ear[2]).abs());

    let left_outer = landmarks.point_2d(indices::LEFT_EYE_OUTER)?;
    let right_outer = landmarks.point_2d(indices::RIGHT_EYE_OUTER)?;
    let head_roll_radians = (right_outer[1] - left_outer[1]).atan2(right_outer[0] - left_outer[0]);

    let left_inner = landmarks.point_2d(indices::LEFT_EYE_INNER)?;
    let right_inner = landmarks.point_2d(indices::RIGHT_EYE_INNER)?;
    let eye_center = Point::new(
        ((left_inner[0] + right_inner[0]) / 2.0).floor() as i32,
        ((left_inner[1] + right_inner[1]) / 2.0).floor() as i32,
    );

    let measurement = FacialMeasurement {
        ipd_pixels,
        ipd_mm: tuning.reference_ipd_mm,
        pixels_per_mm,
        face_width_pixels,
        face_width_mm,
        head_yaw_radians,
        head_roll_radians,
        eye_center,
        nose_bridge: pixel(landmarks.point_2d(indices::NOSE_BRIDGE)?),
        forehead_center: pixel(landmarks.point_2d(indices::FOREHEAD_CENTER)?),
        image_size,
    };

    log::debug!(
        "measured ipd={:.1}px ppm={:.3} face={:.1}mm yaw={:.1}° roll={:.1}°",
        measurement.ipd_pixels,
        measurement.pixels_per_mm,
        measurement.face_width_mm,
        measurement.head_yaw_degrees(),
        measurement.head_roll_degrees()
    );

    Ok(measurement)
}

fn pixel(p: [f32; 2]) -> Point {
    Point::new(p[0].round() as i32, p[1].round() as i32)
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

impl FacialMeasurement {
    pub fn head_yaw_degrees(&self) -> f32 {
        self.head_yaw_radians.to_degrees()
    }

    pub fn head_roll_degrees(&self) -> f32 {
        self.head_roll_radians.to_degrees()
    }

    pub fn detail(&self) -> MeasurementDetail {
        MeasurementDetail {
            ipd_pixels: round_to(self.ipd_pixels, 2),
            ipd_mm: round_to(self.ipd_mm, 2),
            pixels_per_mm: round_to(self.pixels_per_mm, 4),
            face_width_pixels: round_to(self.face_width_pixels, 2),
            face_width_mm: round_to(self.face_width_mm, 2),
        }
    }

    /// How wide a `frame_width_mm` frame comes out, next to the
    /// eye-distance rule used by basic placement.
    pub fn compare_scaling(&self, frame_width_mm: f32, tuning: &Tuning) -> ScalingComparison {
        let scaled = (frame_width_mm * self.pixels_per_mm) as u32;
        let eye_distance = (self.ipd_pixels * tuning.basic_width_factor) as u32;
        let scaling_ratio = if eye_distance > 0 {
            round_to(scaled as f32 / eye_distance as f32, 2)
        } else {
            0.0
        };
        ScalingComparison {
            reference_frame_width_mm: frame_width_mm,
            scaled_width_pixels: scaled,
            eye_distance_width_pixels: eye_distance,
            scaling_ratio,
        }
    }

    pub fn summary(&self) -> MeasurementSummary {
        MeasurementSummary {
            ipd_mm: round_to(self.ipd_mm, 1),
            face_width_mm: round_to(self.face_width_mm, 1),
            head_yaw_degrees: round_to(self.head_yaw_degrees(), 1),
            head_roll_degrees: round_to(self.head_roll_degrees(), 1),
            pixels_per_mm: round_to(self.pixels_per_mm, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frontal face: eyes level, ears at equal depth.
    fn face() -> LandmarkSet {
        let mut points_2d = vec![[0.0, 0.0]; indices::MESH_SIZE];
        let mut points_3d = vec![[0.0, 0.0, 0.0]; indices::MESH_SIZE];
        points_2d[indices::LEFT_EYE_INNER] = [100.0, 200.0];
        points_2d[indices::RIGHT_EYE_INNER] = [160.0, 200.0];
        points_2d[indices::LEFT_EYE_OUTER] = [70.0, 200.0];
        points_2d[indices::RIGHT_EYE_OUTER] = [190.0, 200.0];
        points_2d[indices::LEFT_CHEEK] = [40.0, 260.0];
        points_2d[indices::RIGHT_CHEEK] = [220.0, 260.0];
        points_2d[indices::NOSE_BRIDGE] = [130.2, 205.6];
        points_2d[indices::FOREHEAD_CENTER] = [130.0, 140.0];
        points_3d[indices::LEFT_EAR] = [0.5, 0.5, 0.1];
        points_3d[indices::RIGHT_EAR] = [0.5, 0.5, 0.1];
        LandmarkSet::new(points_2d, points_3d)
    }

    #[test]
    fn test_reference_scale() {
        let m = measure(&face(), (320, 320), &Tuning::default()).unwrap();
        assert_eq!(m.ipd_pixels, 60.0);
        assert!((m.pixels_per_mm - 60.0 / 63.0 * 2.5).abs() < 1e-4);
        assert!((m.pixels_per_mm - 2.381).abs() < 1e-3);
        assert_eq!(m.ipd_mm, 63.0);
    }

    #[test]
    fn test_face_width() {
        let m = measure(&face(), (320, 320), &Tuning::default()).unwrap();
        assert_eq!(m.face_width_pixels, 180.0);
        assert!((m.face_width_mm - 180.0 / m.pixels_per_mm).abs() < 1e-4);
    }

    #[test]
    fn test_level_head_has_no_pose() {
        let m = measure(&face(), (320, 320), &Tuning::default()).unwrap();
        assert_eq!(m.head_roll_radians, 0.0);
        assert_eq!(m.head_yaw_radians, 0.0);
    }

    #[test]
    fn test_roll_from_eye_slope() {
        let mut set = face();
        set.points_2d[indices::RIGHT_EYE_OUTER] = [190.0, 320.0];
        let m = measure(&set, (320, 320), &Tuning::default()).unwrap();
        assert!((m.head_roll_radians - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_from_ear_depth() {
        let mut set = face();
        set.points_3d[indices::RIGHT_EAR] = [0.6, 0.5, 0.2];
        let m = measure(&set, (320, 320), &Tuning::default()).unwrap();
        // atan2(0.1, 0.1)
        assert!((m.head_yaw_radians - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_ignores_depth_sign() {
        for dz in [0.05, -0.05] {
            let mut set = face();
            set.points_3d[indices::LEFT_EAR] = [0.5, 0.5, 0.1];
            set.points_3d[indices::RIGHT_EAR] = [0.5, 0.5, 0.1 + dz];
            let m = measure(&set, (320, 320), &Tuning::default()).unwrap();
            assert_eq!(m.head_yaw_radians, 0.0, "dz = {dz}");
        }

        let mut set = face();
        set.points_3d[indices::RIGHT_EAR] = [0.6, 0.5, 0.0];
        let m = measure(&set, (320, 320), &Tuning::default()).unwrap();
        // atan2(0.1, |-0.1|)
        assert!((m.head_yaw_radians - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_eye_distance() {
        let mut set = face();
        set.points_2d[indices::RIGHT_EYE_INNER] = [f32::INFINITY, 200.0];
        let err = measure(&set, (320, 320), &Tuning::default()).unwrap_err();
        assert!(matches!(err, FitError::DegenerateGeometry(_)));

        // finite coordinates whose distance overflows
        let mut set = face();
        set.points_2d[indices::LEFT_EYE_INNER] = [-3.0e38, 200.0];
        set.points_2d[indices::RIGHT_EYE_INNER] = [3.0e38, 200.0];
        let err = measure(&set, (320, 320), &Tuning::default()).unwrap_err();
        assert!(matches!(err, FitError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_scaling_comparison() {
        let m = measure(&face(), (320, 320), &Tuning::default()).unwrap();
        let cmp = m.compare_scaling(135.0, &Tuning::default());
        // 135 * 2.381 against 60 * 2
        assert_eq!(cmp.scaled_width_pixels, 321);
        assert_eq!(cmp.eye_distance_width_pixels, 120);
        assert!((cmp.scaling_ratio - 2.68).abs() < 0.011);

        let d = m.detail();
        assert_eq!(d.ipd_pixels, 60.0);
        assert_eq!(d.pixels_per_mm, 2.381);
        assert_eq!(d.face_width_mm, 75.6);
    }

    #[test]
    fn test_anchors() {
        let mut set = face();
        set.points_2d[indices::RIGHT_EYE_INNER] = [161.0, 201.0];
        let m = measure(&set, (320, 320), &Tuning::default()).unwrap();
        assert_eq!(m.eye_center, Point::new(130, 200));
        assert_eq!(m.nose_bridge, Point::new(130, 206));
        assert_eq!(m.forehead_center, Point::new(130, 140));
    }

    #[test]
    fn test_coincident_eyes_are_degenerate() {
        let mut set = face();
        set.points_2d[indices::RIGHT_EYE_INNER] = [100.0, 200.0];
        let err = measure(&set, (320, 320), &Tuning::default()).unwrap_err();
        assert!(matches!(err, FitError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_no_face() {
        let err = measure(&LandmarkSet::default(), (320, 320), &Tuning::default()).unwrap_err();
        assert_eq!(err, FitError::NoFaceDetected);
    }

    #[test]
    fn test_summary_rounding() {
        let m = measure(&face(), (320, 320), &Tuning::default()).unwrap();
        let s = m.summary();
        assert_eq!(s.ipd_mm, 63.0);
        assert_eq!(s.pixels_per_mm, 2.381);
        assert_eq!(s.face_width_mm, 75.6);
    }
}
