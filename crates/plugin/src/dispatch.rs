//! Typed entry point dispatch.
//!
//! [`Plugin`] owns the handle registry of one measure type and implements the
//! per-instance state machine `Uninitialized → Live → Finalized`: a handle is
//! live from [`Plugin::initialize`] until [`Plugin::finalize`] releases it, and
//! every other call on a handle outside that window fails with
//! [`MeasureError::HandleNotFound`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::sync::Arc;

use drizzle_core::{Handle, HandleRegistry, HostApi, LogLevel, Measure, MeasureError, Result, StringOutput};
use parking_lot::Mutex;

use crate::host::BoxedHost;

/// A live measure together with the host proxy it talks to.
struct Instance<M> {
    measure: M,
    host: BoxedHost,
}

impl<M: Measure> Instance<M> {
    /// Runs measure code, turning a panic into an Error log and `fallback`.
    fn guarded<R>(
        &mut self,
        entry: &'static str,
        fallback: R,
        call: impl FnOnce(&mut M, &dyn HostApi) -> R,
    ) -> R {
        let Instance { measure, host } = self;
        let host: &dyn HostApi = &**host;

        match catch_unwind(AssertUnwindSafe(|| call(measure, host))) {
            Ok(value) => value,
            Err(payload) => {
                let message = format!("{entry} failed: {}", panic_message(&*payload));
                tracing::error!(entry, "{message}");
                host.log(LogLevel::Error, &message);
                fallback
            }
        }
    }
}

type Shared<M> = Arc<Mutex<Instance<M>>>;

/// Dispatcher for one measure type.
///
/// The registry lock is only held while a handle is looked up, inserted or
/// removed. Calls into the measure run under the instance's own lock.
pub struct Plugin<M> {
    registry: Mutex<HandleRegistry<Shared<M>>>,
}

impl<M: Measure> Plugin<M> {
    /// Creates an empty dispatcher, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            registry: parking_lot::const_mutex(HandleRegistry::new()),
        }
    }

    /// Builds a measure and registers it.
    ///
    /// Construction failures are logged through `host` and returned; the
    /// caller should hand the null sentinel to the host.
    pub fn initialize(&self, host: BoxedHost) -> Result<Handle> {
        let built = catch_unwind(AssertUnwindSafe(|| M::initialize(&*host)));

        let measure = match built {
            Ok(Ok(measure)) => measure,
            Ok(Err(err)) => return Err(initialization_failed(&*host, err.to_string())),
            Err(payload) => {
                return Err(initialization_failed(&*host, panic_message(&*payload)));
            }
        };

        let instance = Arc::new(Mutex::new(Instance { measure, host }));
        let allocated = self.registry.lock().allocate(Arc::clone(&instance));
        let handle = match allocated {
            Ok(handle) => handle,
            Err(err) => {
                let mut instance = instance.lock();
                instance.guarded("Finalize", (), |measure, host| measure.finalize(host));
                return Err(initialization_failed(&*instance.host, err.to_string()));
            }
        };
        tracing::debug!(handle = handle.raw(), "measure initialized");
        Ok(handle)
    }

    /// Forwards a configuration reload, swapping in a fresh host proxy when given.
    pub fn reload(&self, handle: Handle, host: Option<BoxedHost>, max_value: &mut f64) -> Result<()> {
        let shared = self.resolve(handle)?;
        let mut instance = shared.lock();

        if let Some(host) = host {
            instance.host = host;
        }
        instance.guarded("Reload", (), |measure, host| measure.reload(host, max_value));
        Ok(())
    }

    /// Computes the numeric value. A panicking measure yields 0.
    pub fn update(&self, handle: Handle) -> Result<f64> {
        let shared = self.resolve(handle)?;
        let mut instance = shared.lock();
        Ok(instance.guarded("Update", 0.0, |measure, host| measure.update(host)))
    }

    /// Returns the current string buffer, or null for "use the number".
    pub fn get_string(&self, handle: Handle) -> Result<*const u16> {
        let shared = self.resolve(handle)?;
        let mut instance = shared.lock();
        Ok(instance.guarded("GetString", ptr::null(), |measure, host| {
            measure
                .get_string(host)
                .map_or(ptr::null(), StringOutput::as_ptr)
        }))
    }

    /// Forwards a bang. Rejected bangs are logged, never raised.
    pub fn execute_bang(&self, handle: Handle, args: &str) -> Result<()> {
        let shared = self.resolve(handle)?;
        let mut instance = shared.lock();
        instance.guarded("ExecuteBang", (), |measure, host| {
            if let Err(err) = measure.execute_bang(host, args) {
                host.log(LogLevel::Error, &err.to_string());
            }
        });
        Ok(())
    }

    /// Forwards a section variable function call.
    ///
    /// Returns null to leave the original text unchanged, including when the
    /// measure rejects the call.
    pub fn custom_func(&self, handle: Handle, args: &[String]) -> Result<*const u16> {
        let shared = self.resolve(handle)?;
        let mut instance = shared.lock();
        Ok(instance.guarded("CustomFunc", ptr::null(), |measure, host| {
            match measure.custom_func(host, args) {
                Ok(output) => output.map_or(ptr::null(), StringOutput::as_ptr),
                Err(err) => {
                    host.log(LogLevel::Error, &err.to_string());
                    ptr::null()
                }
            }
        }))
    }

    /// Disposes the measure and releases its handle. The handle is dead afterwards.
    pub fn finalize(&self, handle: Handle) -> Result<()> {
        let shared = self.resolve(handle)?;
        shared
            .lock()
            .guarded("Finalize", (), |measure, host| measure.finalize(host));

        self.registry.lock().release(handle)?;
        tracing::debug!(handle = handle.raw(), "measure finalized");
        Ok(())
    }

    /// Logs through the host proxy of a live measure.
    pub fn log(&self, handle: Handle, level: LogLevel, message: &str) -> Result<()> {
        let shared = self.resolve(handle)?;
        shared.lock().host.log(level, message);
        Ok(())
    }

    /// Number of live measures.
    pub fn live_measures(&self) -> usize {
        self.registry.lock().len()
    }

    fn resolve(&self, handle: Handle) -> Result<Shared<M>> {
        self.registry
            .lock()
            .resolve(handle)
            .cloned()
            .ok_or(MeasureError::HandleNotFound(handle.raw()))
    }
}

impl<M: Measure> Default for Plugin<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn initialization_failed(host: &dyn HostApi, reason: String) -> MeasureError {
    let err = MeasureError::Initialization(reason);
    tracing::error!(error = %err, "measure construction failed");
    host.log(LogLevel::Error, &format!("Failed to initialize Measure! {err}"));
    err
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
