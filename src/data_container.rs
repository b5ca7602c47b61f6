//! Data structures carried through the filter pipeline: the spatial-domain
//! image, its complex spectrum and the derived amplitude/phase planes.

use ndarray::{Array2, ArrayD, IxDyn};
use num_complex::Complex32;

/// Transient record passed from filter to filter during one pipeline run.
///
/// Everything in here is constructed per invocation and discarded once the
/// filtered image has been handed back to the caller. Filters receive the
/// record by reference and return a new one, so a host application can keep
/// the unfiltered input around for display.
///
/// # Fields
/// - `pixel_size`: spatial sampling distance, if known.
/// - `height`, `width`: dimensions of the spatial-domain image in pixels.
/// - `img`: the spatial-domain image.
/// - `spectrum`: complex frequency-domain samples; empty until the forward
///   transform has run. Kept N-dimensional since frequency-domain filters do
///   not care about the rank of the transform that produced it.
/// - `origin`: coordinate of the zero-frequency sample in `spectrum`, one
///   entry per spectrum dimension, set by the transform that produced it.
/// - `amplitudes`, `phases`: magnitude and argument of each spectrum sample,
///   recomputed after the frequency-domain filters ran (host applications
///   display these as power/phase spectra).
#[derive(Clone, Debug)]
pub struct ImageFilterData {
    pub pixel_size: Option<f32>,
    pub height: usize,
    pub width: usize,
    pub img: Array2<f32>,
    pub spectrum: ArrayD<Complex32>,
    pub origin: Vec<usize>,
    pub amplitudes: ArrayD<f32>,
    pub phases: ArrayD<f32>,
}

impl Default for ImageFilterData {
    fn default() -> Self {
        ImageFilterData {
            pixel_size: None,
            height: 0,
            width: 0,
            img: Array2::zeros((0, 0)),
            spectrum: ArrayD::zeros(IxDyn(&[0])),
            origin: vec![],
            amplitudes: ArrayD::zeros(IxDyn(&[0])),
            phases: ArrayD::zeros(IxDyn(&[0])),
        }
    }
}

impl ImageFilterData {
    /// Wraps a spatial-domain image; the frequency-domain fields stay empty
    /// until a forward transform fills them in.
    pub fn from_image(img: Array2<f32>) -> Self {
        let (height, width) = img.dim();
        ImageFilterData {
            height,
            width,
            img,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_image_records_dimensions() {
        let data = ImageFilterData::from_image(Array2::zeros((3, 5)));
        assert_eq!(data.height, 3);
        assert_eq!(data.width, 5);
        assert!(data.origin.is_empty());
        assert_eq!(data.spectrum.len(), 0);
    }
}
