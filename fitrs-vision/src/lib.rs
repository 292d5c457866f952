pub mod compositor;
pub mod detection;
pub mod dimensions;
pub mod error;
pub mod glyphs;
pub mod landmarks;
pub mod measurement;
pub mod overlay;
pub mod placement;
pub mod tuning;

// Re-export commonly used types
pub use dimensions::{Catalog, ProductDimensions, ProductKind, Resolved};
pub use error::FitError;
pub use landmarks::{LandmarkSet, Point};
pub use measurement::{FacialMeasurement, MeasurementSummary};
pub use placement::PlacementResult;
pub use tuning::Tuning;

/// Read-only access to product sprites, owned by the surrounding service.
pub trait SpriteProvider {
    fn sprite(&self, kind: &ProductKind, product_id: &str) -> Option<&image::DynamicImage>;
}
