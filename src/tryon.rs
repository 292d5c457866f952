use fitrs_vision::detection::{self, Confidence, PersonDetection};
use fitrs_vision::dimensions::{self, GlassesDimensions, Recommendation};
use fitrs_vision::landmarks::indices;
use fitrs_vision::measurement::{
    self, FacialMeasurement, MeasurementDetail, MeasurementSummary, ScalingComparison,
};
use fitrs_vision::{overlay, placement};
use fitrs_vision::{
    LandmarkSet, PlacementResult, Point, ProductDimensions, ProductKind, SpriteProvider, Tuning,
};
use image::RgbImage;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::ProductCatalog;

#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub product_type: ProductKind,
    pub product_id: String,
    pub show_measurements: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Applied,
    NoFace,
    NotApplied,
}

#[derive(Debug, Clone, Serialize)]
pub struct TryOnResponse {
    pub frame_id: Uuid,
    pub status: FrameStatus,
    pub product_type: ProductKind,
    pub product_id: String,
    pub product_applied: bool,
    pub detection_confidence: Confidence,
    /// Strongest person box after overlap suppression.
    pub person_bbox: Option<[f32; 4]>,
    pub facial_measurements: Option<MeasurementSummary>,
    pub product_dimensions: Option<ProductDimensions>,
    pub dimensions_source: Option<&'static str>,
    pub placement: Option<PlacementResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementsResponse {
    pub facial_measurements: Option<MeasurementSummary>,
    pub recommended_products: Option<Recommendation>,
    pub measurement_accuracy: &'static str,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationResponse {
    pub custom_dimensions: GlassesDimensions,
    pub facial_measurements: Option<MeasurementSummary>,
    pub placement: Option<PlacementResult>,
    /// Frame width in pixels implied by the custom dimensions.
    pub scaling_factor: Option<f32>,
    pub error: Option<String>,
}

/// Frame width the debug report scales, a typical adult frame.
pub const DEBUG_FRAME_WIDTH_MM: f32 = 135.0;

#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub landmarks_found: bool,
    pub landmarks_detected: usize,
    pub person_detections: usize,
    pub confidence: Confidence,
    pub person_bbox: Option<[f32; 4]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyPoints {
    pub left_eye_inner: [f32; 2],
    pub right_eye_inner: [f32; 2],
    pub eye_center: Point,
    pub nose_bridge: Point,
}

/// Frame size that would sit right on this face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecommendation {
    pub optimal_frame_width_mm: f32,
    pub optimal_frame_height_mm: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugResponse {
    pub image_size: (u32, u32),
    pub detection: DetectionReport,
    pub facial_measurements: Option<MeasurementDetail>,
    pub scaling_comparison: Option<ScalingComparison>,
    pub key_points: Option<KeyPoints>,
    pub recommendations: Option<FrameRecommendation>,
    pub error: Option<String>,
}

/// Measure → resolve → place → annotate, one frame at a time.
pub struct TryOn<S> {
    pub catalog: ProductCatalog,
    pub sprites: S,
    pub tuning: Tuning,
}

impl<S: SpriteProvider> TryOn<S> {
    pub fn new(catalog: ProductCatalog, sprites: S, tuning: Tuning) -> Self {
        Self {
            catalog,
            sprites,
            tuning,
        }
    }

    /// Process one frame in place. Never fails: whatever cannot be done is
    /// left out of the frame and the response.
    pub fn process(
        &self,
        frame: &mut RgbImage,
        landmarks: Option<&LandmarkSet>,
        persons: &[PersonDetection],
        request: &TryOnRequest,
    ) -> TryOnResponse {
        let frame_id = Uuid::new_v4();
        let DetectionReport {
            confidence: detection_confidence,
            person_bbox,
            ..
        } = detect(landmarks, persons);

        let measurement = self.measure(landmarks, frame.dimensions());
        let resolved = measurement.as_ref().and_then(|m| {
            dimensions::resolve(&self.catalog, &request.product_type, &request.product_id, m)
        });
        let dims = resolved.as_ref().map(|r| r.dimensions());

        let sprite = self
            .sprites
            .sprite(&request.product_type, &request.product_id);
        if sprite.is_none() && measurement.is_some() {
            log::warn!(
                "frame {frame_id}: no sprite for {}/{}",
                request.product_type,
                request.product_id
            );
        }

        let placement = placement::place(
            frame,
            sprite,
            measurement.as_ref(),
            &request.product_type,
            dims,
            &self.tuning,
        );

        if request.show_measurements {
            if let Some(m) = &measurement {
                overlay::annotate(frame, m, dims);
            }
        }

        let status = match (&measurement, &placement) {
            (None, _) => FrameStatus::NoFace,
            (Some(_), Some(_)) => FrameStatus::Applied,
            (Some(_), None) => FrameStatus::NotApplied,
        };
        log::debug!("frame {frame_id}: {status:?} confidence={detection_confidence:?}");

        TryOnResponse {
            frame_id,
            status,
            product_type: request.product_type.clone(),
            product_id: request.product_id.clone(),
            product_applied: placement.is_some(),
            detection_confidence,
            person_bbox,
            facial_measurements: measurement.as_ref().map(FacialMeasurement::summary),
            product_dimensions: dims.cloned(),
            dimensions_source: resolved.as_ref().map(|r| r.source()),
            placement,
        }
    }

    /// Measurements plus generic sizing for every product kind.
    pub fn measure_only(
        &self,
        landmarks: Option<&LandmarkSet>,
        image_size: (u32, u32),
    ) -> MeasurementsResponse {
        match self.try_measure(landmarks, image_size) {
            Ok(m) => MeasurementsResponse {
                facial_measurements: Some(m.summary()),
                recommended_products: Some(dimensions::recommend(&m)),
                measurement_accuracy: if m.pixels_per_mm > 0.0 { "high" } else { "low" },
                error: None,
            },
            Err(e) => MeasurementsResponse {
                facial_measurements: None,
                recommended_products: None,
                measurement_accuracy: "low",
                error: Some(e.to_string()),
            },
        }
    }

    /// Place glasses with user-supplied dimensions, to check a sprite's
    /// catalog sizes against a real face.
    pub fn calibrate(
        &self,
        frame: &mut RgbImage,
        landmarks: Option<&LandmarkSet>,
        product_id: &str,
        custom: GlassesDimensions,
    ) -> CalibrationResponse {
        let m = match self.try_measure(landmarks, frame.dimensions()) {
            Ok(m) => m,
            Err(e) => {
                return CalibrationResponse {
                    custom_dimensions: custom,
                    facial_measurements: None,
                    placement: None,
                    scaling_factor: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let dims = ProductDimensions::Glasses(custom.clone());
        let sprite = self.sprites.sprite(&ProductKind::Glasses, product_id);
        let placement = placement::place(
            frame,
            sprite,
            Some(&m),
            &ProductKind::Glasses,
            Some(&dims),
            &self.tuning,
        );
        let scaling_factor = ((m.pixels_per_mm * custom.frame_width_mm) * 10.0).round() / 10.0;

        CalibrationResponse {
            error: placement
                .is_none()
                .then(|| format!("glasses sprite for {product_id} could not be placed")),
            custom_dimensions: custom,
            facial_measurements: Some(m.summary()),
            placement,
            scaling_factor: Some(scaling_factor),
        }
    }

    /// Raw measurements, scaling and key points for checking the sizing
    /// by hand. Nothing is drawn.
    pub fn debug_measurements(
        &self,
        landmarks: Option<&LandmarkSet>,
        persons: &[PersonDetection],
        image_size: (u32, u32),
    ) -> DebugResponse {
        let report = detect(landmarks, persons);

        let m = match self.try_measure(landmarks, image_size) {
            Ok(m) => m,
            Err(e) => {
                return DebugResponse {
                    image_size,
                    detection: report,
                    facial_measurements: None,
                    scaling_comparison: None,
                    key_points: None,
                    recommendations: None,
                    error: Some(e.to_string()),
                }
            }
        };

        // measure() validated the set, so these indices exist.
        let key_points = landmarks.and_then(|l| {
            Some(KeyPoints {
                left_eye_inner: l.point_2d(indices::LEFT_EYE_INNER).ok()?,
                right_eye_inner: l.point_2d(indices::RIGHT_EYE_INNER).ok()?,
                eye_center: m.eye_center,
                nose_bridge: m.nose_bridge,
            })
        });

        DebugResponse {
            image_size,
            detection: report,
            facial_measurements: Some(m.detail()),
            scaling_comparison: Some(m.compare_scaling(DEBUG_FRAME_WIDTH_MM, &self.tuning)),
            key_points,
            recommendations: Some(frame_recommendation(m.ipd_mm)),
            error: None,
        }
    }

    fn measure(
        &self,
        landmarks: Option<&LandmarkSet>,
        image_size: (u32, u32),
    ) -> Option<FacialMeasurement> {
        match self.try_measure(landmarks, image_size) {
            Ok(m) => Some(m),
            Err(e) if e.is_no_face() => {
                log::debug!("no usable face: {e}");
                None
            }
            Err(e) => {
                log::warn!("measurement failed: {e}");
                None
            }
        }
    }

    fn try_measure(
        &self,
        landmarks: Option<&LandmarkSet>,
        image_size: (u32, u32),
    ) -> fitrs_vision::error::Result<FacialMeasurement> {
        let landmarks = landmarks.ok_or(fitrs_vision::FitError::NoFaceDetected)?;
        measurement::measure(landmarks, image_size, &self.tuning)
    }
}

/// Combine both detectors after dropping overlapping person boxes.
fn detect(landmarks: Option<&LandmarkSet>, persons: &[PersonDetection]) -> DetectionReport {
    let persons = detection::nms(persons, detection::PERSON_IOU_THRESHOLD);
    let landmarks_found = landmarks.is_some_and(|l| !l.is_empty());
    DetectionReport {
        landmarks_found,
        landmarks_detected: landmarks.map_or(0, LandmarkSet::len),
        person_detections: persons.len(),
        confidence: detection::confidence(landmarks_found, &persons),
        person_bbox: detection::best_person(&persons).map(|p| p.bbox),
    }
}

fn frame_recommendation(ipd_mm: f32) -> FrameRecommendation {
    let round1 = |v: f32| (v * 10.0).round() / 10.0;
    FrameRecommendation {
        optimal_frame_width_mm: round1(ipd_mm * 1.1),
        optimal_frame_height_mm: round1(ipd_mm * 0.4),
    }
}
