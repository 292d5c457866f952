//! Physical product sizes and how to find them.

use std::f32::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::measurement::FacialMeasurement;

const GENERIC_BRIDGE_WIDTH_MM: f32 = 18.0;
const GENERIC_TEMPLE_LENGTH_MM: f32 = 140.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductKind {
    Glasses,
    Hat,
    Other(String),
}

impl ProductKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "glasses" => ProductKind::Glasses,
            "hat" => ProductKind::Hat,
            other => ProductKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProductKind::Glasses => "glasses",
            ProductKind::Hat => "hat",
            ProductKind::Other(s) => s,
        }
    }
}

impl From<String> for ProductKind {
    fn from(s: String) -> Self {
        ProductKind::parse(&s)
    }
}

impl From<ProductKind> for String {
    fn from(kind: ProductKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassesDimensions {
    pub frame_width_mm: f32,
    pub frame_height_mm: f32,
    pub lens_width_mm: f32,
    pub lens_height_mm: f32,
    pub bridge_width_mm: f32,
    pub temple_length_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatDimensions {
    pub hat_width_mm: f32,
    pub hat_height_mm: f32,
    pub head_circumference_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductDimensions {
    Glasses(GlassesDimensions),
    Hat(HatDimensions),
}

impl ProductDimensions {
    /// Overall (width, height) in millimeters.
    pub fn outline_mm(&self) -> (f32, f32) {
        match self {
            ProductDimensions::Glasses(g) => (g.frame_width_mm, g.frame_height_mm),
            ProductDimensions::Hat(h) => (h.hat_width_mm, h.hat_height_mm),
        }
    }
}

/// Where a set of dimensions came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "dimensions", rename_all = "lowercase")]
pub enum Resolved {
    /// Taken verbatim from the catalog.
    Found(ProductDimensions),
    /// Derived from the wearer's measurements.
    Synthesized(ProductDimensions),
}

impl Resolved {
    pub fn dimensions(&self) -> &ProductDimensions {
        match self {
            Resolved::Found(d) | Resolved::Synthesized(d) => d,
        }
    }

    pub fn into_dimensions(self) -> ProductDimensions {
        match self {
            Resolved::Found(d) | Resolved::Synthesized(d) => d,
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self, Resolved::Found(_))
    }

    pub fn source(&self) -> &'static str {
        match self {
            Resolved::Found(_) => "catalog",
            Resolved::Synthesized(_) => "synthesized",
        }
    }
}

/// Read-only product catalog.
pub trait Catalog {
    fn dimensions(&self, kind: &ProductKind, id: &str) -> Option<ProductDimensions>;
}

/// Catalog entry first, measurement-derived generic sizing otherwise.
pub fn resolve<C: Catalog + ?Sized>(
    catalog: &C,
    kind: &ProductKind,
    id: &str,
    measurement: &FacialMeasurement,
) -> Option<Resolved> {
    if let Some(dimensions) = catalog.dimensions(kind, id) {
        log::debug!("{kind}/{id}: catalog dimensions {:?}", dimensions.outline_mm());
        return Some(Resolved::Found(dimensions));
    }
    let synthesized = synthesize(kind, measurement)?;
    log::debug!(
        "{kind}/{id}: not in catalog, synthesized {:?}",
        synthesized.outline_mm()
    );
    Some(Resolved::Synthesized(synthesized))
}

/// Generic dimensions that fit the measured face. `None` for kinds without
/// a sizing rule.
pub fn synthesize(kind: &ProductKind, measurement: &FacialMeasurement) -> Option<ProductDimensions> {
    match kind {
        ProductKind::Glasses => Some(ProductDimensions::Glasses(generic_glasses(measurement))),
        ProductKind::Hat => Some(ProductDimensions::Hat(generic_hat(measurement))),
        ProductKind::Other(_) => None,
    }
}

pub fn generic_glasses(measurement: &FacialMeasurement) -> GlassesDimensions {
    let frame_width_mm = measurement.ipd_mm * 1.1;
    let lens_width_mm = measurement.ipd_mm;
    GlassesDimensions {
        frame_width_mm,
        frame_height_mm: frame_width_mm * 0.4,
        lens_width_mm,
        lens_height_mm: lens_width_mm * 0.35,
        bridge_width_mm: GENERIC_BRIDGE_WIDTH_MM,
        temple_length_mm: GENERIC_TEMPLE_LENGTH_MM,
    }
}

pub fn generic_hat(measurement: &FacialMeasurement) -> HatDimensions {
    let face = measurement.face_width_mm;
    HatDimensions {
        hat_width_mm: face * 1.2,
        hat_height_mm: face * 0.8,
        head_circumference_mm: face * PI,
    }
}

/// Generic sizing for every product kind, for a measure-only response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub glasses: GlassesDimensions,
    pub hat: HatDimensions,
}

pub fn recommend(measurement: &FacialMeasurement) -> Recommendation {
    Recommendation {
        glasses: generic_glasses(measurement),
        hat: generic_hat(measurement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;
    use std::collections::HashMap;

    struct MapCatalog(HashMap<(ProductKind, String), ProductDimensions>);

    impl Catalog for MapCatalog {
        fn dimensions(&self, kind: &ProductKind, id: &str) -> Option<ProductDimensions> {
            self.0.get(&(kind.clone(), id.to_string())).cloned()
        }
    }

    fn measurement() -> FacialMeasurement {
        FacialMeasurement {
            ipd_pixels: 60.0,
            ipd_mm: 63.0,
            pixels_per_mm: 2.381,
            face_width_pixels: 300.0,
            face_width_mm: 140.0,
            head_yaw_radians: 0.0,
            head_roll_radians: 0.0,
            eye_center: Point::new(160, 200),
            nose_bridge: Point::new(160, 210),
            forehead_center: Point::new(160, 140),
            image_size: (320, 320),
        }
    }

    fn aviator() -> ProductDimensions {
        ProductDimensions::Glasses(GlassesDimensions {
            frame_width_mm: 145.0,
            frame_height_mm: 55.0,
            lens_width_mm: 62.0,
            lens_height_mm: 42.0,
            bridge_width_mm: 20.0,
            temple_length_mm: 145.0,
        })
    }

    fn catalog() -> MapCatalog {
        let mut map = HashMap::new();
        map.insert((ProductKind::Glasses, "classic_aviator".to_string()), aviator());
        MapCatalog(map)
    }

    #[test]
    fn test_catalog_hit_is_verbatim() {
        let resolved = resolve(&catalog(), &ProductKind::Glasses, "classic_aviator", &measurement()).unwrap();
        assert!(resolved.is_catalog());
        assert_eq!(resolved.dimensions(), &aviator());
    }

    #[test]
    fn test_unknown_glasses_synthesized() {
        let resolved = resolve(&catalog(), &ProductKind::Glasses, "unknown_id", &measurement()).unwrap();
        assert_eq!(resolved.source(), "synthesized");
        let ProductDimensions::Glasses(g) = resolved.into_dimensions() else {
            panic!("expected glasses dimensions");
        };
        assert!((g.frame_width_mm - 69.3).abs() < 1e-4);
        assert!((g.frame_height_mm - 69.3 * 0.4).abs() < 1e-4);
        assert_eq!(g.lens_width_mm, 63.0);
        assert!((g.lens_height_mm - 22.05).abs() < 1e-4);
        assert_eq!(g.bridge_width_mm, 18.0);
        assert_eq!(g.temple_length_mm, 140.0);
    }

    #[test]
    fn test_unknown_hat_synthesized() {
        let resolved = resolve(&catalog(), &ProductKind::Hat, "beanie", &measurement()).unwrap();
        let ProductDimensions::Hat(h) = resolved.dimensions() else {
            panic!("expected hat dimensions");
        };
        assert!((h.hat_width_mm - 168.0).abs() < 1e-3);
        assert!((h.hat_height_mm - 112.0).abs() < 1e-3);
        assert!((h.head_circumference_mm - 140.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_other_kind_has_no_sizing() {
        let kind = ProductKind::parse("scarf");
        assert_eq!(kind, ProductKind::Other("scarf".into()));
        assert!(resolve(&catalog(), &kind, "x", &measurement()).is_none());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ProductKind::parse("Glasses"), ProductKind::Glasses);
        assert_eq!(ProductKind::parse(" hat "), ProductKind::Hat);
        assert_eq!(ProductKind::Hat.to_string(), "hat");
    }
}
