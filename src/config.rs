//! Optics parameters of the imaging system and the cutoff frequency derived
//! from them.

use serde::{Deserialize, Serialize};

/// Describes the optical system that acquired the image.
///
/// The spatial frequency cutoff of a diffraction-limited system is
/// `fcut = 2 * NA / wavelength`; frequencies beyond it carry only noise.
/// Lengths must share one unit (the cutoff then comes out in its inverse).
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub struct OpticsConfig {
    /// Pixel size of the detector projected into sample space,
    /// e.g. 7.4 / (100 * 1.5) um for a 7.4 um camera pixel behind a
    /// 100x objective with a 1.5x optovar.
    pub pixel_size: f64,
    /// Emission wavelength, e.g. 0.598 um for an FM dye bound to a
    /// phospholipid membrane.
    pub wavelength: f64,
    /// Numerical aperture of the imaging lens, e.g. 1.4.
    pub numerical_aperture: f64,
}

impl Default for OpticsConfig {
    fn default() -> Self {
        OpticsConfig {
            pixel_size: 7.4 / (100.0 * 1.5),
            wavelength: 0.598,
            numerical_aperture: 1.4,
        }
    }
}

impl OpticsConfig {
    /// The spatial frequency cutoff of the imaging system.
    pub fn cutoff_frequency(&self) -> f32 {
        (2.0 * self.numerical_aperture / self.wavelength) as f32
    }
}
