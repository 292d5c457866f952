use thiserror::Error;

/// Per-frame failure. None of these are fatal: callers fall back to the
/// untouched frame and leave the corresponding result field empty.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("landmark {index} missing (only {len} landmarks)")]
    MissingLandmark { index: usize, len: usize },
    #[error("invalid sprite: {0}")]
    InvalidSprite(String),
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
}

impl FitError {
    /// A short landmark set means the detector did not give us a usable face.
    pub fn is_no_face(&self) -> bool {
        matches!(
            self,
            FitError::NoFaceDetected | FitError::MissingLandmark { .. }
        )
    }
}

pub type Result<T, E = FitError> = std::result::Result<T, E>;
