//! Narrow Fourier-transform capability used by the pipeline.
//!
//! The frequency-domain filters only need three things from a transform:
//! a forward transform producing a complex array, an inverse transform back
//! to a real image, and the coordinate of the zero-frequency sample in the
//! layout that particular transform produces. Everything else (plan caching,
//! half-spectrum storage, normalization) stays behind this trait so the
//! filters remain library-agnostic.

use ndarray::{Array1, Array2, ArrayD, Axis, Ix2};
use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("input image is empty, both dimensions must be at least 1")]
    EmptyImage,
    #[error("image shape ({found_rows}, {found_cols}) does not match the planned shape ({rows}, {cols})")]
    ImageShapeMismatch {
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },
    #[error("spectrum shape {found:?} does not match the planned shape {expected:?}")]
    SpectrumShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error(transparent)]
    Fft(#[from] realfft::FftError),
}

/// Forward/inverse Fourier transform over a fixed image shape.
///
/// Implementations own the layout of the spectrum they produce and report the
/// zero-frequency coordinate through [`FourierTransform::dc_origin`]; callers
/// must not assume any particular convention.
pub trait FourierTransform: Send + Sync {
    /// Computes the complex spectrum of a real spatial-domain image.
    fn forward(&self, img: &Array2<f32>) -> Result<ArrayD<Complex32>, TransformError>;

    /// Transforms a spectrum back into a real spatial-domain image,
    /// normalized so that `inverse(forward(x)) == x`.
    fn inverse(&self, spectrum: &ArrayD<Complex32>) -> Result<Array2<f32>, TransformError>;

    /// Coordinate of the zero-frequency sample in a spectrum of the given
    /// shape, one entry per dimension.
    fn dc_origin(&self, spectrum_shape: &[usize]) -> Vec<usize>;
}

/// Zero-frequency coordinate for mirrored half-spectrum layouts that store
/// the redundant half along the first axis: last index on the first axis,
/// center of every other axis. Useful when feeding spectra produced by such
/// transforms straight into the frequency-domain filters.
pub fn mirrored_half_spectrum_origin(shape: &[usize]) -> Vec<usize> {
    let mut origin: Vec<usize> = shape.iter().map(|extent| extent / 2).collect();
    if let (Some(o), Some(extent)) = (origin.first_mut(), shape.first()) {
        *o = extent.saturating_sub(1);
    }
    origin
}

/// 2D transform backed by `realfft` along the rows and `rustfft` down the
/// columns.
///
/// The forward direction computes a real-to-complex transform of every row
/// (keeping only the non-redundant `cols / 2 + 1` frequency bins), then a
/// full complex transform down every column, and finally rotates the first
/// axis so the zero-frequency row sits at `rows / 2`. The spectrum shape is
/// therefore `(rows, cols / 2 + 1)` with the DC sample at `(rows / 2, 0)`.
///
/// Plans are created once per image shape and reused across invocations, the
/// same way the plans are cached alongside the scan data in the viewer
/// application hosting these filters.
pub struct RealFftTransform {
    rows: usize,
    cols: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,
    col_forward: Arc<dyn Fft<f32>>,
    col_inverse: Arc<dyn Fft<f32>>,
}

impl RealFftTransform {
    /// Plans forward and inverse transforms for `rows x cols` images.
    pub fn new(rows: usize, cols: usize) -> Result<Self, TransformError> {
        if rows == 0 || cols == 0 {
            return Err(TransformError::EmptyImage);
        }
        let mut real_planner = RealFftPlanner::<f32>::new();
        let r2c = real_planner.plan_fft_forward(cols);
        let c2r = real_planner.plan_fft_inverse(cols);
        let mut planner = FftPlanner::<f32>::new();
        let col_forward = planner.plan_fft_forward(rows);
        let col_inverse = planner.plan_fft_inverse(rows);
        Ok(RealFftTransform {
            rows,
            cols,
            r2c,
            c2r,
            col_forward,
            col_inverse,
        })
    }

    /// Number of non-redundant frequency bins per row.
    pub fn bins(&self) -> usize {
        self.cols / 2 + 1
    }

    fn spectrum_shape(&self) -> Vec<usize> {
        vec![self.rows, self.bins()]
    }
}

impl FourierTransform for RealFftTransform {
    fn forward(&self, img: &Array2<f32>) -> Result<ArrayD<Complex32>, TransformError> {
        let (found_rows, found_cols) = img.dim();
        if found_rows != self.rows || found_cols != self.cols {
            return Err(TransformError::ImageShapeMismatch {
                rows: self.rows,
                cols: self.cols,
                found_rows,
                found_cols,
            });
        }

        // r2c along each row
        let mut spectrum = Array2::<Complex32>::zeros((self.rows, self.bins()));
        for (row, mut out_row) in img.outer_iter().zip(spectrum.outer_iter_mut()) {
            let mut input = row.to_vec();
            let mut output = self.r2c.make_output_vec();
            self.r2c.process(&mut input, &mut output)?;
            out_row.assign(&Array1::from(output));
        }

        // full complex transform down each column
        for mut col in spectrum.axis_iter_mut(Axis(1)) {
            let mut buf = col.to_vec();
            self.col_forward.process(&mut buf);
            col.assign(&Array1::from(buf));
        }

        // rotate the first axis so the zero-frequency row sits in the center
        let mut shifted = Array2::<Complex32>::zeros((self.rows, self.bins()));
        for i in 0..self.rows {
            shifted
                .row_mut((i + self.rows / 2) % self.rows)
                .assign(&spectrum.row(i));
        }

        Ok(shifted.into_dyn())
    }

    fn inverse(&self, spectrum: &ArrayD<Complex32>) -> Result<Array2<f32>, TransformError> {
        let expected = self.spectrum_shape();
        if spectrum.shape() != expected.as_slice() {
            return Err(TransformError::SpectrumShapeMismatch {
                expected,
                found: spectrum.shape().to_vec(),
            });
        }
        let spectrum = spectrum
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| TransformError::SpectrumShapeMismatch {
                expected: self.spectrum_shape(),
                found: spectrum.shape().to_vec(),
            })?;

        // undo the center rotation of the first axis
        let mut unshifted = Array2::<Complex32>::zeros((self.rows, self.bins()));
        for i in 0..self.rows {
            unshifted
                .row_mut(i)
                .assign(&spectrum.row((i + self.rows / 2) % self.rows));
        }

        // inverse complex transform down each column, unnormalized
        for mut col in unshifted.axis_iter_mut(Axis(1)) {
            let mut buf = col.to_vec();
            self.col_inverse.process(&mut buf);
            col.assign(&Array1::from(buf));
        }

        // c2r along each row; total scaling 1 / (rows * cols) covers both passes
        let scale = 1.0 / (self.rows * self.cols) as f32;
        let mut img = Array2::<f32>::zeros((self.rows, self.cols));
        let nyquist = if self.cols % 2 == 0 {
            Some(self.bins() - 1)
        } else {
            None
        };
        for (row, mut out_row) in unshifted.outer_iter().zip(img.outer_iter_mut()) {
            let mut input = row.to_vec();
            // realfft rejects residual imaginary parts in the DC and Nyquist
            // bins, which the column passes leave behind as rounding noise
            input[0].im = 0.0;
            if let Some(n) = nyquist {
                input[n].im = 0.0;
            }
            let mut output = self.c2r.make_output_vec();
            self.c2r.process(&mut input, &mut output)?;
            out_row.assign(&Array1::from_iter(output.into_iter().map(|v| v * scale)));
        }

        Ok(img)
    }

    fn dc_origin(&self, _spectrum_shape: &[usize]) -> Vec<usize> {
        vec![self.rows / 2, 0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn test_image(rows: usize, cols: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, cols), |(i, j)| {
            (i as f32 * 0.7 - j as f32 * 1.3).sin() + 0.25 * (i * cols + j) as f32
        })
    }

    #[test]
    fn test_round_trip_even_width() {
        let img = test_image(8, 6);
        let transform = RealFftTransform::new(8, 6).unwrap();
        let spectrum = transform.forward(&img).unwrap();
        assert_eq!(spectrum.shape(), &[8, 4]);
        let restored = transform.inverse(&spectrum).unwrap();
        for (a, b) in img.iter().zip(restored.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_round_trip_odd_width() {
        let img = test_image(5, 7);
        let transform = RealFftTransform::new(5, 7).unwrap();
        let spectrum = transform.forward(&img).unwrap();
        assert_eq!(spectrum.shape(), &[5, 4]);
        let restored = transform.inverse(&spectrum).unwrap();
        for (a, b) in img.iter().zip(restored.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_dc_sample_holds_image_sum() {
        let img = test_image(6, 6);
        let transform = RealFftTransform::new(6, 6).unwrap();
        let spectrum = transform.forward(&img).unwrap();
        let origin = transform.dc_origin(spectrum.shape());
        assert_eq!(origin, vec![3, 0]);
        let dc = spectrum[origin.as_slice()];
        assert_abs_diff_eq!(dc.re, img.sum(), epsilon = 1e-3);
        assert_abs_diff_eq!(dc.im, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_constant_image_concentrates_at_dc() {
        let img = Array2::from_elem((4, 4), 1.0f32);
        let transform = RealFftTransform::new(4, 4).unwrap();
        let spectrum = transform.forward(&img).unwrap();
        let origin = transform.dc_origin(spectrum.shape());
        assert_abs_diff_eq!(spectrum[origin.as_slice()].re, 16.0, epsilon = 1e-4);
        // any off-origin sample is numerically zero
        assert_abs_diff_eq!(spectrum[[0, 1]].norm(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_shape_mismatches_are_rejected() {
        let transform = RealFftTransform::new(4, 4).unwrap();
        assert!(matches!(
            transform.forward(&Array2::zeros((4, 5))),
            Err(TransformError::ImageShapeMismatch { .. })
        ));
        assert!(matches!(
            transform.inverse(&ArrayD::zeros(ndarray::IxDyn(&[4, 4]))),
            Err(TransformError::SpectrumShapeMismatch { .. })
        ));
        assert!(matches!(
            RealFftTransform::new(0, 4),
            Err(TransformError::EmptyImage)
        ));
    }

    #[test]
    fn test_mirrored_half_spectrum_origin_convention() {
        assert_eq!(mirrored_half_spectrum_origin(&[4, 4]), vec![3, 2]);
        assert_eq!(mirrored_half_spectrum_origin(&[8, 5, 6]), vec![7, 2, 3]);
        assert_eq!(mirrored_half_spectrum_origin(&[1]), vec![0]);
    }
}
