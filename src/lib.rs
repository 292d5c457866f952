pub mod catalog;
pub mod config;
pub mod sprites;
pub mod tryon;

// Re-export vision types for convenience
pub use fitrs_vision::{
    compositor, detection, dimensions, measurement, overlay, placement, FacialMeasurement,
    LandmarkSet, PlacementResult, Point, ProductDimensions, ProductKind, Tuning,
};
