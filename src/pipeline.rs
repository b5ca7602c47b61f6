//! The processing pipeline: forward transform, frequency-domain filters,
//! inverse transform, spatial post-filters.
//!
//! The pipeline owns a [`FourierTransform`] and an ordered set of filters and
//! drives one synchronous run over a spatial-domain image. Per-filter timing
//! and completion status are recorded so a host application can show them
//! next to each filter, the same way it shows progress and abort controls.

use crate::data_container::ImageFilterData;
use crate::filters::filter::{
    Filter, FilterDomain, FilterError, FilterExecution, FILTER_REGISTRY,
};
use crate::math_tools;
use crate::transform::FourierTransform;
use ndarray::Array2;
use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::{Arc, RwLock};
use std::time::Instant;

pub struct Pipeline {
    transform: Box<dyn FourierTransform>,
    filters: Vec<Box<dyn Filter>>,
    executions: Vec<FilterExecution>,
}

impl Pipeline {
    /// Creates an empty pipeline around a transform; filters are added with
    /// [`Pipeline::push_filter`].
    pub fn new(transform: Box<dyn FourierTransform>) -> Self {
        Pipeline {
            transform,
            filters: vec![],
            executions: vec![],
        }
    }

    /// Creates a pipeline holding a clone of every filter in the global
    /// registry. Filters run grouped by domain; within one domain the order
    /// is alphabetical by name to keep runs reproducible.
    pub fn with_registered_filters(transform: Box<dyn FourierTransform>) -> Self {
        let mut pipeline = Pipeline::new(transform);
        if let Ok(registry) = FILTER_REGISTRY.lock() {
            for filter in &*registry {
                pipeline.filters.push(filter.clone());
            }
        }
        pipeline
            .filters
            .sort_by_key(|f| (f.config().domain, f.config().name));
        pipeline
    }

    /// Appends a filter; it runs in its domain's slot in insertion order.
    pub fn push_filter(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    /// The filters this pipeline will run.
    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    /// Timing and completion records of the most recent run.
    pub fn executions(&self) -> &[FilterExecution] {
        &self.executions
    }

    /// Resets every filter for a new spectrum shape.
    pub fn reset(&mut self, shape: &[usize]) {
        for filter in self.filters.iter_mut() {
            filter.reset(shape);
        }
    }

    /// Runs the full pipeline over a spatial-domain image.
    ///
    /// Spatial pre-filters, forward transform, frequency filters, inverse
    /// transform, spatial post-filters. When the abort flag is raised the
    /// remaining filters are skipped, the partially processed stage is
    /// discarded, and the data accumulated so far is returned; the skipped
    /// stage shows up in [`Pipeline::executions`] with `completed == false`.
    pub fn run(
        &mut self,
        img: &Array2<f32>,
        progress_lock: &mut Arc<RwLock<Option<f32>>>,
        abort_flag: &Arc<AtomicBool>,
    ) -> Result<ImageFilterData, FilterError> {
        let start = Instant::now();
        self.executions.clear();

        let mut data = ImageFilterData::from_image(img.clone());

        data = self.run_domain(FilterDomain::SpatialBeforeFft, data, progress_lock, abort_flag)?;
        if self.aborted() {
            return Ok(data);
        }

        data.spectrum = self.transform.forward(&data.img)?;
        data.origin = self.transform.dc_origin(data.spectrum.shape());
        data.amplitudes = math_tools::amplitudes(&data.spectrum);
        data.phases = math_tools::phases(&data.spectrum);

        data = self.run_domain(FilterDomain::Frequency, data, progress_lock, abort_flag)?;
        if self.aborted() {
            return Ok(data);
        }

        data.img = self.transform.inverse(&data.spectrum)?;

        data = self.run_domain(FilterDomain::SpatialAfterFft, data, progress_lock, abort_flag)?;

        log::info!("pipeline run finished in {:?}", start.elapsed());
        Ok(data)
    }

    /// True when the most recent filter stage was cut short by the abort
    /// flag.
    fn aborted(&self) -> bool {
        self.executions.last().is_some_and(|e| !e.completed)
    }

    fn run_domain(
        &mut self,
        domain: FilterDomain,
        mut data: ImageFilterData,
        progress_lock: &mut Arc<RwLock<Option<f32>>>,
        abort_flag: &Arc<AtomicBool>,
    ) -> Result<ImageFilterData, FilterError> {
        for filter in self
            .filters
            .iter_mut()
            .filter(|f| f.config().domain == domain)
        {
            let name = filter.config().name;
            let filter_start = Instant::now();
            match filter.filter(&data, progress_lock, abort_flag) {
                Ok(output) => {
                    let completed = !abort_flag.load(Relaxed);
                    log::info!("{} took {:?}", name, filter_start.elapsed());
                    self.executions.push(FilterExecution {
                        name,
                        processing_time: filter_start.elapsed(),
                        completed,
                    });
                    if !completed {
                        // drop the partial output, keep what we had
                        return Ok(data);
                    }
                    data = output;
                }
                Err(err) => {
                    log::error!("{} failed: {}", name, err);
                    return Err(err);
                }
            }
        }
        Ok(data)
    }
}
