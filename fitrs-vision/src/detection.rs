//! Person boxes from the auxiliary object detector.
//!
//! They never feed the placement math; they only back up the landmark
//! detector when reporting how confident we are that a face is present.

use serde::{Deserialize, Serialize};

/// Overlap above which two person boxes count as the same person.
pub const PERSON_IOU_THRESHOLD: f32 = 0.45;

/// Person detection from the object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetection {
    pub bbox: [f32; 4], // x1, y1, x2, y2
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Highest scoring detection.
pub fn best_person(detections: &[PersonDetection]) -> Option<&PersonDetection> {
    detections
        .iter()
        .filter(|d| d.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

/// Both detectors agreeing is high confidence, either one alone is medium.
pub fn confidence(landmarks_found: bool, persons: &[PersonDetection]) -> Confidence {
    match (landmarks_found, best_person(persons).is_some()) {
        (true, true) => Confidence::High,
        (true, false) | (false, true) => Confidence::Medium,
        (false, false) => Confidence::Low,
    }
}

impl PersonDetection {
    pub fn area(&self) -> f32 {
        let [x1, y1, x2, y2] = self.bbox;
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    /// Intersection over union of the two boxes, 0 when either is empty.
    pub fn iou(&self, other: &PersonDetection) -> f32 {
        let [ax1, ay1, ax2, ay2] = self.bbox;
        let [bx1, by1, bx2, by2] = other.bbox;
        let overlap_w = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let overlap_h = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let inter = overlap_w * overlap_h;
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// Greedy non-maximum suppression: strongest box first, later boxes are
/// dropped when they overlap a kept one by more than `iou_threshold`.
/// Detections with a non-finite score are discarded.
pub fn nms(detections: &[PersonDetection], iou_threshold: f32) -> Vec<PersonDetection> {
    let mut ranked: Vec<PersonDetection> = detections
        .iter()
        .filter(|d| d.score.is_finite())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<PersonDetection> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(bbox: [f32; 4], score: f32) -> PersonDetection {
        PersonDetection { bbox, score }
    }

    #[test]
    fn test_iou() {
        let a = person([10.0, 10.0, 30.0, 30.0], 0.5);
        let b = person([20.0, 10.0, 40.0, 30.0], 0.5);
        // 200 shared out of 600
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(a.iou(&a), 1.0);

        let apart = person([100.0, 100.0, 110.0, 110.0], 0.5);
        assert_eq!(a.iou(&apart), 0.0);

        let empty = person([5.0, 5.0, 5.0, 5.0], 0.5);
        assert_eq!(empty.iou(&empty), 0.0);
    }

    #[test]
    fn test_nms() {
        let detections = vec![
            person([10.0, 10.0, 30.0, 30.0], 0.9),
            person([12.0, 12.0, 32.0, 32.0], 0.8),
            person([100.0, 100.0, 120.0, 120.0], 0.85),
        ];

        let result = nms(&detections, 0.3);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].score, 0.9);
        assert_eq!(result[1].score, 0.85);
    }

    #[test]
    fn test_nms_drops_nan_scores() {
        let detections = vec![
            person([0.0, 0.0, 10.0, 10.0], f32::NAN),
            person([50.0, 50.0, 60.0, 60.0], 0.4),
        ];
        let result = nms(&detections, PERSON_IOU_THRESHOLD);
        assert_eq!(result, vec![person([50.0, 50.0, 60.0, 60.0], 0.4)]);
        assert!(nms(&[], PERSON_IOU_THRESHOLD).is_empty());
    }

    #[test]
    fn test_confidence() {
        let persons = vec![person([0.0, 0.0, 50.0, 80.0], 0.7)];
        assert_eq!(confidence(true, &persons), Confidence::High);
        assert_eq!(confidence(true, &[]), Confidence::Medium);
        assert_eq!(confidence(false, &persons), Confidence::Medium);
        assert_eq!(confidence(false, &[]), Confidence::Low);
    }

    #[test]
    fn test_best_person() {
        let persons = vec![
            person([0.0, 0.0, 1.0, 1.0], 0.2),
            person([0.0, 0.0, 2.0, 2.0], 0.9),
            person([0.0, 0.0, 3.0, 3.0], f32::NAN),
        ];
        assert_eq!(best_person(&persons).unwrap().score, 0.9);
        assert!(best_person(&[]).is_none());
    }
}
