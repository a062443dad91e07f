//! Raw adapters behind the exported entry points.
//!
//! These turn host pointers into typed values, call the [`Plugin`] and apply
//! the boundary policy: nothing is raised across the C ABI. A null handle is
//! a measure whose Initialize failed and every call on it is skipped. A
//! non-null handle the registry does not know is a host contract violation;
//! it panics (and so aborts the host) in debug builds and degrades to the
//! neutral return value in release builds.

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};

use drizzle_core::marshal::{from_host_args, from_host_string};
use drizzle_core::{Handle, LogLevel, Measure, MeasureError, Result};

use crate::dispatch::Plugin;
use crate::host;

/// `Initialize(void** data, void* rm)`.
///
/// # Safety
///
/// `data` must be null or writable; `rm` must be null or the host's API context.
pub unsafe fn initialize<M: Measure>(plugin: &Plugin<M>, data: *mut *mut c_void, rm: *mut c_void) {
    let Some(slot) = NonNull::new(data) else {
        tracing::error!("Initialize called without a data slot");
        return;
    };

    let handle = match host::select(rm) {
        Some(host) => plugin.initialize(host).ok(),
        None => {
            tracing::error!(error = %MeasureError::HostUnavailable, "measure not created");
            None
        }
    };

    // SAFETY: checked non-null above; the host owns the slot.
    unsafe { slot.as_ptr().write(handle.map_or(ptr::null_mut(), Handle::as_ptr)) };
}

/// `Reload(void* data, void* rm, double* maxValue)`.
///
/// # Safety
///
/// `rm` must be null or the host's API context; `max_value` must be null or writable.
pub unsafe fn reload<M: Measure>(
    plugin: &Plugin<M>,
    data: *mut c_void,
    rm: *mut c_void,
    max_value: *mut f64,
) {
    let mut unused = 0.0;
    // SAFETY: the caller guarantees `max_value` is null or writable.
    let max_value = unsafe { max_value.as_mut() }.unwrap_or(&mut unused);
    let host = NonNull::new(rm).map(host::from_context);

    let Some(handle) = live("Reload", data) else {
        return;
    };
    settle("Reload", plugin.reload(handle, host, max_value), ());
}

/// `double Update(void* data)`.
pub fn update<M: Measure>(plugin: &Plugin<M>, data: *mut c_void) -> f64 {
    match live("Update", data) {
        Some(handle) => settle("Update", plugin.update(handle), 0.0),
        None => 0.0,
    }
}

/// `LPCWSTR GetString(void* data)`.
pub fn get_string<M: Measure>(plugin: &Plugin<M>, data: *mut c_void) -> *const u16 {
    match live("GetString", data) {
        Some(handle) => settle("GetString", plugin.get_string(handle), ptr::null()),
        None => ptr::null(),
    }
}

/// `void ExecuteBang(void* data, LPCWSTR args)`.
///
/// # Safety
///
/// `args` must be null or a NUL-terminated wide string.
pub unsafe fn execute_bang<M: Measure>(plugin: &Plugin<M>, data: *mut c_void, args: *const u16) {
    let Some(handle) = live("ExecuteBang", data) else {
        return;
    };
    // SAFETY: forwarded from the caller.
    let result = match unsafe { from_host_string(args, "ExecuteBang") } {
        Ok(args) => plugin.execute_bang(handle, &args),
        Err(err) => plugin.log(handle, LogLevel::Error, &err.to_string()),
    };
    settle("ExecuteBang", result, ());
}

/// `LPCWSTR CustomFunc(void* data, int argc, const WCHAR* argv[])`.
///
/// # Safety
///
/// `argv` must hold `argc` NUL-terminated wide strings.
pub unsafe fn custom_func<M: Measure>(
    plugin: &Plugin<M>,
    data: *mut c_void,
    argc: c_int,
    argv: *const *const u16,
) -> *const u16 {
    let Some(handle) = live("CustomFunc", data) else {
        return ptr::null();
    };
    // SAFETY: forwarded from the caller.
    let result = match unsafe { from_host_args(argc, argv) } {
        Ok(args) => plugin.custom_func(handle, &args),
        Err(err) => plugin
            .log(handle, LogLevel::Error, &err.to_string())
            .map(|()| ptr::null()),
    };
    settle("CustomFunc", result, ptr::null())
}

/// `void Finalize(void* data)`.
///
/// A null `data` belongs to a measure whose Initialize failed; there is
/// nothing to release.
pub fn finalize<M: Measure>(plugin: &Plugin<M>, data: *mut c_void) {
    if let Some(handle) = live("Finalize", data) {
        settle("Finalize", plugin.finalize(handle), ());
    }
}

/// The handle behind `data`, or `None` for the null sentinel of a measure
/// that never initialized. The host keeps calling such measures, so this is
/// not a contract violation.
fn live(entry: &'static str, data: *mut c_void) -> Option<Handle> {
    let handle = Handle::from_ptr(data);
    if handle.is_none() {
        tracing::warn!(entry, "skipped, the measure is not initialized");
    }
    handle
}

fn settle<T>(entry: &'static str, result: Result<T>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(entry, error = %err, "host contract violation");
            if cfg!(debug_assertions) && err.is_contract_violation() {
                panic!("{entry}: {err}");
            }
            fallback
        }
    }
}
