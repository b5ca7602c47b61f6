//! The `Filter` trait and related structures for managing filters and their
//! configuration. Filters are applied to in-flight pipeline data
//! (`ImageFilterData`) and register themselves in a global, thread-safe
//! registry so a host application can discover them dynamically.

use crate::data_container::ImageFilterData;
use crate::transform::TransformError;
#[allow(unused_imports)] // this dependency is required by the `register_filter` macro
use ctor::ctor;
use downcast_rs::Downcast;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors a filter can report. All of them are raised synchronously before or
/// during the elementwise pass; nothing is retried.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("spectrum is empty, every dimension must be at least 1")]
    EmptySpectrum,
    #[error("origin has {found} coordinates but the spectrum has {expected} dimensions")]
    OriginDimensionMismatch { expected: usize, found: usize },
    #[error("cutoff frequency must be positive and finite, got {0}")]
    InvalidCutoff(f32),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

pub trait CopyStaticFieldsTrait: Downcast {
    fn copy_static_fields_from(&mut self, other: &dyn CopyStaticFieldsTrait);
}
downcast_rs::impl_downcast!(CopyStaticFieldsTrait);

/// The `Filter` trait defines the structure and behavior of an image filter.
///
/// Filters must implement:
/// - A `new` function to initialize a filter with default parameters.
/// - A `reset` function that is called when a new image is loaded.
/// - A `show_data` function that caches whatever the host application may
///   want to display for this filter.
/// - A `config` function to provide metadata for the filter.
/// - A `filter` function to apply the filter to an `ImageFilterData`.
///
/// To add a filter, create a struct deriving `Clone`, `Debug` and
/// `CopyStaticFields`, implement this trait for it and register it with the
/// `register_filter` attribute macro; the module then needs to be listed in
/// `src/filters/mod.rs` to be included in the registry.
pub trait Filter: Send + Sync + Debug + CloneBoxedFilter + CopyStaticFieldsTrait {
    /// Creates a new instance of the filter with default parameters.
    fn new() -> Self
    where
        Self: Sized;

    /// Resets the filter for a new spectrum shape. Useful when loading a new
    /// image or reconfiguring the transform.
    fn reset(&mut self, shape: &[usize]);

    /// Caches display data for the host application. Optional.
    fn show_data(&mut self, data: &ImageFilterData);

    /// Returns the filter configuration, including name, description and
    /// domain.
    fn config(&self) -> FilterConfig;

    /// Applies the filter to the given data.
    ///
    /// # Arguments
    ///
    /// - `input_data`: the `ImageFilterData` to be processed.
    /// - `progress_lock`: shared progress indicator in `[0, 1]`, `None` when
    ///   idle (only worth updating for filters that take a while).
    /// - `abort_flag`: cooperative cancellation; a filter that observes the
    ///   flag returns early with whatever it has, and the pipeline marks the
    ///   run as not completed.
    ///
    /// # Returns
    /// A new `ImageFilterData` containing the filtered data, or a
    /// `FilterError` naming the violated invariant.
    fn filter(
        &mut self,
        input_data: &ImageFilterData,
        progress_lock: &mut Arc<RwLock<Option<f32>>>,
        abort_flag: &Arc<AtomicBool>,
    ) -> Result<ImageFilterData, FilterError>;
}

/// The `FilterDomain` enum specifies the domain and execution order of
/// filters within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterDomain {
    /// Spatial-domain filters that run before the forward transform.
    SpatialBeforeFft,
    /// Filters that operate on the complex spectrum.
    Frequency,
    /// Spatial-domain filters that run after the inverse transform.
    SpatialAfterFft,
}

/// Configuration and metadata of a filter.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// The name of the filter, used for identification and display.
    pub name: String,
    /// A description of the filter, explaining its purpose.
    pub description: String,
    /// An optional hyperlink to a DOI or reference, with an optional label.
    pub hyperlink: Option<(Option<String>, String)>, // (optional_label, url)
    /// The domain in which the filter operates.
    pub domain: FilterDomain,
}

/// Timing and completion record of a single filter execution within a
/// pipeline run.
#[derive(Debug, Clone)]
pub struct FilterExecution {
    /// Name of the executed filter.
    pub name: String,
    /// Wall-clock time the filter spent.
    pub processing_time: Duration,
    /// `false` when the filter was aborted mid-pass.
    pub completed: bool,
}

/// A trait to allow cloning of boxed filters.
/// This is necessary because `Box<dyn Filter>` cannot be cloned directly.
pub trait CloneBoxedFilter {
    fn clone_box(&self) -> Box<dyn Filter>;
}

impl<T> CloneBoxedFilter for T
where
    T: 'static + Filter + Clone,
{
    fn clone_box(&self) -> Box<dyn Filter> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Filter> {
    fn clone(&self) -> Box<dyn Filter> {
        self.as_ref().clone_box()
    }
}

/// A registry to manage and retrieve registered filters.
#[derive(Debug)]
pub struct FilterRegistry {
    pub filters: HashMap<String, Box<dyn Filter>>,
}

impl FilterRegistry {
    /// Registers a new filter of type `F` into the global registry.
    pub fn register_filter<F: Filter + 'static>() {
        let filter_instance = F::new();

        let uuid = Uuid::new_v4().to_string();

        // Store mapping from filter name to UUID
        let name = filter_instance.config().name.clone();
        {
            let mut map = FILTER_INSTANCE_UUIDS.lock().unwrap();
            map.insert(name, uuid.clone());
        }

        let mut registry = FILTER_REGISTRY.lock().unwrap();
        registry
            .filters
            .insert(uuid.clone(), Box::new(filter_instance));
    }

    /// Retrieves a registered filter by its UUID key.
    pub fn get_filter(&self, uuid: &str) -> Option<&Box<dyn Filter>> {
        self.filters.get(uuid)
    }

    /// Looks up the UUID a filter name was registered under.
    pub fn uuid_for(name: &str) -> Option<String> {
        FILTER_INSTANCE_UUIDS.lock().unwrap().get(name).cloned()
    }

    /// Returns a mutable iterator over all the registered filters.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Filter>> {
        self.filters.values_mut()
    }
}

impl<'a> IntoIterator for &'a FilterRegistry {
    type Item = &'a Box<dyn Filter>;
    type IntoIter = std::collections::hash_map::Values<'a, String, Box<dyn Filter>>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.values()
    }
}

/// A global, thread-safe filter registry.
///
/// Filters annotated with `#[register_filter]` insert themselves here at
/// program start, so a host application can enumerate them without knowing
/// the concrete types.
pub static FILTER_REGISTRY: Lazy<Mutex<FilterRegistry>> = Lazy::new(|| {
    Mutex::new(FilterRegistry {
        filters: HashMap::new(),
    })
});

static FILTER_INSTANCE_UUIDS: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_filters_are_registered() {
        for name in ["Smooth Bandpass", "Normalize Intensity"] {
            let uuid =
                FilterRegistry::uuid_for(name).unwrap_or_else(|| panic!("{name} not registered"));
            let registry = FILTER_REGISTRY.lock().unwrap();
            let filter = registry.get_filter(&uuid).unwrap();
            assert_eq!(filter.config().name, name);
        }
    }

    #[test]
    fn test_domains_order_around_the_transform() {
        assert!(FilterDomain::SpatialBeforeFft < FilterDomain::Frequency);
        assert!(FilterDomain::Frequency < FilterDomain::SpatialAfterFft);
    }
}
