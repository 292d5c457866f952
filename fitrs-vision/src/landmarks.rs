//! Face-mesh landmark sets as produced by the external landmark detector.
//!
//! 2D points are pixel coordinates in the frame the detector saw, 3D points
//! are the detector's normalized (x, y, z) output. Both follow the 468-point
//! face-mesh index scheme; only the subset in [`indices`] is read here.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Named face-mesh indices.
pub mod indices {
    pub const LEFT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const NOSE_BRIDGE: usize = 6;
    pub const FOREHEAD_CENTER: usize = 151;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const LEFT_EAR: usize = 127;
    pub const RIGHT_EAR: usize = 356;

    /// Every index the measurement step reads.
    pub const REQUIRED: [usize; 11] = [
        LEFT_EYE_INNER,
        RIGHT_EYE_INNER,
        LEFT_EYE_OUTER,
        RIGHT_EYE_OUTER,
        NOSE_BRIDGE,
        FOREHEAD_CENTER,
        CHIN,
        LEFT_CHEEK,
        RIGHT_CHEEK,
        LEFT_EAR,
        RIGHT_EAR,
    ];

    /// Number of points in a full face mesh.
    pub const MESH_SIZE: usize = 468;
}

/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    #[serde(rename = "landmarks_2d", default)]
    pub points_2d: Vec<[f32; 2]>,
    #[serde(rename = "landmarks_3d", default)]
    pub points_3d: Vec<[f32; 3]>,
}

impl LandmarkSet {
    pub fn new(points_2d: Vec<[f32; 2]>, points_3d: Vec<[f32; 3]>) -> Self {
        Self {
            points_2d,
            points_3d,
        }
    }

    pub fn len(&self) -> usize {
        self.points_2d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_2d.is_empty() || self.points_3d.is_empty()
    }

    /// Checks the set describes one face: non-empty, 2D/3D in lockstep, and
    /// long enough to contain every required index.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() || self.points_2d.len() != self.points_3d.len() {
            return Err(FitError::NoFaceDetected);
        }
        let len = self.len();
        match indices::REQUIRED.iter().copied().find(|&i| i >= len) {
            Some(index) => Err(FitError::MissingLandmark { index, len }),
            None => Ok(()),
        }
    }

    pub fn point_2d(&self, index: usize) -> Result<[f32; 2]> {
        self.points_2d
            .get(index)
            .copied()
            .ok_or(FitError::MissingLandmark {
                index,
                len: self.points_2d.len(),
            })
    }

    pub fn point_3d(&self, index: usize) -> Result<[f32; 3]> {
        self.points_3d
            .get(index)
            .copied()
            .ok_or(FitError::MissingLandmark {
                index,
                len: self.points_3d.len(),
            })
    }

    /// Euclidean pixel distance between two 2D landmarks.
    pub fn distance_2d(&self, a: usize, b: usize) -> Result<f32> {
        let pa = self.point_2d(a)?;
        let pb = self.point_2d(b)?;
        let dx = pb[0] - pa[0];
        let dy = pb[1] - pa[1];
        Ok((dx * dx + dy * dy).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(len: usize) -> LandmarkSet {
        LandmarkSet::new(vec![[0.0, 0.0]; len], vec![[0.0, 0.0, 0.0]; len])
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(
            LandmarkSet::default().validate(),
            Err(FitError::NoFaceDetected)
        );
    }

    #[test]
    fn test_validate_mismatched_lengths() {
        let set = LandmarkSet::new(vec![[0.0, 0.0]; 468], vec![[0.0, 0.0, 0.0]; 400]);
        assert_eq!(set.validate(), Err(FitError::NoFaceDetected));
    }

    #[test]
    fn test_validate_short_set() {
        let err = mesh(300).validate().unwrap_err();
        assert!(matches!(err, FitError::MissingLandmark { len: 300, .. }));
        assert!(err.is_no_face());
        assert!(mesh(indices::MESH_SIZE).validate().is_ok());
    }

    #[test]
    fn test_distance() {
        let mut set = mesh(10);
        set.points_2d[1] = [3.0, 4.0];
        assert_eq!(set.distance_2d(0, 1).unwrap(), 5.0);
        assert!(set.distance_2d(0, 10).is_err());
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{"landmarks_2d": [[1, 2], [3.5, 4]], "landmarks_3d": [[0.1, 0.2, -0.3], [0, 0, 0]]}"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.points_2d[1], [3.5, 4.0]);
        assert_eq!(set.points_3d[0][2], -0.3);
    }
}
