//! Super-Gaussian frequency-domain filtering of microscopy images.
//!
//! Images acquired through lenses carry no genuine detail beyond the spatial
//! frequency cutoff of the optics; anything finer is noise. This crate removes
//! the above-cutoff frequencies by attenuating the Fourier transform of an
//! image with a super-Gaussian roll-off and transforming back, while leaving
//! the forward/inverse transforms themselves to `realfft`/`rustfft`.
//!
//! The crate is meant to be embedded as a processing plugin inside a larger
//! interactive viewer application: filters register themselves in a global
//! registry, report progress, honor abort flags and expose per-run timing, so
//! a host GUI can drive them without knowing the concrete types.

pub mod config;
pub mod data_container;
pub mod filters;
pub mod math_tools;
pub mod pipeline;
pub mod transform;

pub use config::OpticsConfig;
pub use data_container::ImageFilterData;
pub use filters::filter::{Filter, FilterConfig, FilterDomain, FilterError, FilterExecution};
pub use filters::normalize::NormalizeIntensity;
pub use filters::smooth_bandpass::SmoothBandpass;
pub use pipeline::Pipeline;
pub use transform::{FourierTransform, RealFftTransform, TransformError};
