//! The lifecycle every measure implements.
//!
//! The host drives a measure through
//! `Initialize → {Reload, Update, GetString, ExecuteBang, CustomFunc}* → Finalize`.
//! Reload may arrive right after Initialize, repeatedly, or not at all before
//! an Update, so implementations must not depend on a particular order.

use crate::error::{MeasureError, Result};
use crate::host::HostApi;
use crate::marshal::StringOutput;

/// A measure implementation plugged into the entry point dispatch.
///
/// Every call happens on the host's update thread for this instance; the
/// instance is never shared between concurrent calls.
pub trait Measure: Send + Sized + 'static {
    /// Builds the instance. Cacheable host values (measure name, skin,
    /// window, settings file) should be queried here.
    fn initialize(host: &dyn HostApi) -> Result<Self>;

    /// Re-reads the options. `max_value` is left untouched unless the
    /// measure wants to report a fixed maximum.
    fn reload(&mut self, _host: &dyn HostApi, _max_value: &mut f64) {}

    /// Computes the numeric value for this update cycle.
    fn update(&mut self, host: &dyn HostApi) -> f64;

    /// The string value, or `None` to make the host use the number from
    /// [`Measure::update`] instead.
    fn get_string(&mut self, _host: &dyn HostApi) -> Option<&StringOutput> {
        None
    }

    /// Handles a bang sent to the measure.
    fn execute_bang(&mut self, _host: &dyn HostApi, _args: &str) -> Result<()> {
        Err(MeasureError::UnsupportedOperation("ExecuteBang"))
    }

    /// Handles a section variable function call. `Ok(None)` leaves the
    /// original text unchanged.
    fn custom_func(
        &mut self,
        _host: &dyn HostApi,
        _args: &[String],
    ) -> Result<Option<&StringOutput>> {
        Err(MeasureError::UnsupportedOperation("CustomFunc"))
    }

    /// Releases measure resources before the handle is freed.
    fn finalize(&mut self, _host: &dyn HostApi) {}
}
