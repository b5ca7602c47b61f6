//! Sum-to-one intensity normalization of the spatial-domain image, applied
//! after the inverse transform so the filtered result can be used directly
//! as a convolution kernel or probability map.

use crate::data_container::ImageFilterData;
use crate::filters::filter::{Filter, FilterConfig, FilterDomain, FilterError};
use crate::math_tools::normalize_sum;
use filter_macros::{register_filter, CopyStaticFields};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

/// Scales all pixel values so that they sum to 1.
///
/// A degenerate image (zero or non-finite sum) is passed through unchanged
/// with a warning; rescaling it would only produce NaNs.
#[register_filter]
#[derive(Clone, Debug, CopyStaticFields)]
pub struct NormalizeIntensity {
    /// Total intensity of the last input image, for host-app display.
    #[static_field]
    last_sum: Option<f64>,
}

impl NormalizeIntensity {
    /// Total intensity the last input image had before normalization.
    pub fn last_sum(&self) -> Option<f64> {
        self.last_sum
    }
}

impl Filter for NormalizeIntensity {
    fn new() -> Self
    where
        Self: Sized,
    {
        NormalizeIntensity { last_sum: None }
    }

    fn reset(&mut self, _shape: &[usize]) {
        self.last_sum = None;
    }

    fn show_data(&mut self, _data: &ImageFilterData) {
        // NOOP
    }

    fn config(&self) -> FilterConfig {
        FilterConfig {
            name: "Normalize Intensity".to_string(),
            description: "Scales all pixel values so that they sum to 1.".to_string(),
            hyperlink: None,
            domain: FilterDomain::SpatialAfterFft,
        }
    }

    fn filter(
        &mut self,
        input_data: &ImageFilterData,
        _progress_lock: &mut Arc<RwLock<Option<f32>>>,
        _abort_flag: &Arc<AtomicBool>,
    ) -> Result<ImageFilterData, FilterError> {
        let mut output_data = input_data.clone();
        self.last_sum = Some(input_data.img.iter().map(|&v| v as f64).sum());
        if !normalize_sum(output_data.img.view_mut()) {
            log::warn!("image sum is zero or not finite, skipping normalization");
        }
        Ok(output_data)
    }
}
