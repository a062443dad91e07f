//! Selection of the host proxy handed to a measure.

use std::ffi::c_void;
use std::ptr::NonNull;

use drizzle_core::{ConsoleHost, HostApi};

/// A host proxy owned by a measure instance.
pub type BoxedHost = Box<dyn HostApi + Send>;

/// Wraps the API context the host passed to Initialize or Reload.
pub fn from_context(rm: NonNull<c_void>) -> BoxedHost {
    #[cfg(windows)]
    {
        Box::new(crate::rainmeter::RainmeterHost::new(rm))
    }

    #[cfg(not(windows))]
    {
        tracing::warn!(
            context = rm.as_ptr() as usize,
            "the host API is only available on Windows, using the console host"
        );
        Box::new(ConsoleHost::new())
    }
}

/// Picks the proxy for Initialize.
///
/// Debug builds fall back to the console host when no context is supplied,
/// which lets a test driver call the entry points directly. Release builds
/// have nothing to log through and return `None`.
pub fn select(rm: *mut c_void) -> Option<BoxedHost> {
    match NonNull::new(rm) {
        Some(rm) => Some(from_context(rm)),
        None if cfg!(debug_assertions) => Some(Box::new(ConsoleHost::new())),
        None => None,
    }
}
