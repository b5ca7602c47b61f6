//! Image filters applied around the Fourier transform of a microscopy image.
//!
//! Filters are organized by their domain of operation: spatial-domain filters
//! run before the forward transform or after the inverse transform, and
//! frequency-domain filters operate on the complex spectrum in between.
//!
//! Each filter implements the `Filter` trait defined in the `filter` module
//! and registers itself with the `register_filter` macro, so a pipeline (or a
//! host application) can pick them up from the global registry.

/// Core filter interfaces and shared components.
/// Defines the `Filter` trait and supporting structures used by all filter
/// implementations.
pub mod filter;

/// Sum-to-one intensity normalization of the spatial-domain result.
pub mod normalize;

/// Super-Gaussian attenuation of above-cutoff spatial frequencies.
pub mod smooth_bandpass;
