//! Elementwise helpers shared by the filters: index-space distances,
//! spectrum component extraction and intensity normalization.
//!
//! The pipeline itself only consumes [`amplitudes`], [`phases`] and
//! [`normalize_sum`]; the remaining extractors ([`real_part`],
//! [`imaginary_part`], [`log_power_spectrum`]) are display hooks for host
//! applications that render the spectrum in other representations.

use ndarray::{ArrayD, ArrayViewMut2};
use num_complex::Complex32;

/// Euclidean distance between two integer coordinates of equal rank.
///
/// Both coordinates index the same array, so the caller has already checked
/// the ranks match.
pub fn index_distance(a: &[usize], b: &[usize]) -> f32 {
    let mut sq = 0.0f32;
    for (&ai, &bi) in a.iter().zip(b.iter()) {
        let d = ai as f32 - bi as f32;
        sq += d * d;
    }
    sq.sqrt()
}

/// Magnitude of each spectrum sample.
pub fn amplitudes(spectrum: &ArrayD<Complex32>) -> ArrayD<f32> {
    spectrum.mapv(|c| c.norm())
}

/// Argument (phase angle) of each spectrum sample.
pub fn phases(spectrum: &ArrayD<Complex32>) -> ArrayD<f32> {
    spectrum.mapv(|c| c.arg())
}

/// Real component of each spectrum sample.
pub fn real_part(spectrum: &ArrayD<Complex32>) -> ArrayD<f32> {
    spectrum.mapv(|c| c.re)
}

/// Imaginary component of each spectrum sample.
pub fn imaginary_part(spectrum: &ArrayD<Complex32>) -> ArrayD<f32> {
    spectrum.mapv(|c| c.im)
}

/// Generalized log power spectrum, `ln(1 + |F|)`, the usual display scaling
/// for Fourier magnitudes.
pub fn log_power_spectrum(spectrum: &ArrayD<Complex32>) -> ArrayD<f32> {
    spectrum.mapv(|c| (1.0 + c.norm()).ln())
}

/// Scales the image so its pixel values sum to one.
///
/// The sum is accumulated in f64 to keep large images stable. Returns `false`
/// without touching the image when the sum is zero or not finite.
pub fn normalize_sum(mut img: ArrayViewMut2<f32>) -> bool {
    let sum: f64 = img.iter().map(|&v| v as f64).sum();
    if sum == 0.0 || !sum.is_finite() {
        return false;
    }
    img.mapv_inplace(|v| (v as f64 / sum) as f32);
    true
}
