use serde::{Deserialize, Serialize};

/// Empirical knobs for measurement and placement.
///
/// None of these are physical constants. `calibration_multiplier` in
/// particular compensates for how conservatively the landmark detector
/// places eye corners and has to be re-fitted whenever the detector changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Assumed real-world inter-pupillary distance (population average).
    pub reference_ipd_mm: f32,
    pub calibration_multiplier: f32,
    /// Roll beyond which the sprite is rotated.
    pub roll_threshold_rad: f32,
    /// Yaw beyond which the sprite is shifted horizontally.
    pub yaw_threshold_rad: f32,
    pub glasses_yaw_factor: f32,
    pub hat_yaw_factor: f32,
    /// Fraction of the hat height that hangs below the forehead point.
    pub hat_overlap: f32,
    /// Sprite width as a multiple of the eye distance for untyped products.
    pub basic_width_factor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            reference_ipd_mm: 63.0,
            calibration_multiplier: 2.5,
            roll_threshold_rad: 0.1,
            yaw_threshold_rad: 0.1,
            glasses_yaw_factor: 0.3,
            hat_yaw_factor: 0.2,
            hat_overlap: 0.3,
            basic_width_factor: 2.0,
        }
    }
}
