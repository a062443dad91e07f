//! Conversions between Rust strings and the host's null-terminated UTF-16 strings.
//!
//! Host-owned strings are only borrowed for the duration of a call and copied
//! into a `String`. Plugin-owned strings live in a [`StringOutput`], which keeps
//! at most one buffer alive per logical output.

use std::ffi::c_int;
use std::ptr;

use crate::error::{MeasureError, Result};

/// A plugin-owned, null-terminated wide string.
///
/// The heap allocation never moves, so the pointer handed to the host stays
/// valid until the buffer is dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct WideBuffer {
    units: Box<[u16]>,
}

impl WideBuffer {
    /// Encodes `text` as UTF-16 with a trailing NUL.
    pub fn new(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();

        #[cfg(test)]
        tests::LIVE_BUFFERS.with(|live| live.set(live.get() + 1));

        Self {
            units: units.into_boxed_slice(),
        }
    }

    /// Pointer to the first code unit, valid while `self` is alive.
    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }

    /// The code units without the terminator.
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.units.len() - 1]
    }

    /// Decodes the buffer back into a `String`.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

#[cfg(test)]
impl Drop for WideBuffer {
    fn drop(&mut self) {
        tests::LIVE_BUFFERS.with(|live| live.set(live.get() - 1));
    }
}

/// Allocates host-readable memory for `text`. The plugin keeps ownership.
pub fn to_host_string(text: &str) -> WideBuffer {
    WideBuffer::new(text)
}

/// Copies a host-owned wide string into a `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated UTF-16 string that stays
/// valid for the duration of this call.
pub unsafe fn from_host_string(ptr: *const u16, context: &'static str) -> Result<String> {
    if ptr.is_null() {
        return Err(MeasureError::marshal(context, "received a null string pointer"));
    }

    let mut len = 0usize;
    // SAFETY: the caller guarantees NUL termination.
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }

    // SAFETY: `len` units were just read successfully.
    let units = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf16(units).map_err(|e| MeasureError::marshal(context, e.to_string()))
}

/// Copies the `argv` array of a `CustomFunc` call.
///
/// # Safety
///
/// `argv` must be null (only when `argc` is zero) or point to `argc` valid
/// wide string pointers.
pub unsafe fn from_host_args(argc: c_int, argv: *const *const u16) -> Result<Vec<String>> {
    let count = usize::try_from(argc)
        .map_err(|_| MeasureError::marshal("CustomFunc", format!("negative argc {argc}")))?;

    if count == 0 {
        return Ok(Vec::new());
    }
    if argv.is_null() {
        return Err(MeasureError::marshal("CustomFunc", "received a null argv"));
    }

    (0..count)
        // SAFETY: the caller guarantees `argc` readable entries.
        .map(|i| unsafe { from_host_string(*argv.add(i), "CustomFunc") })
        .collect()
}

/// Owning slot for one logical string output of a measure.
///
/// [`StringOutput::recycle_and_set`] is the only way to replace the content:
/// the new buffer is installed before the old one is freed, so the output
/// never dangles and never holds more than one buffer.
#[derive(Debug, Default)]
pub struct StringOutput {
    current: Option<WideBuffer>,
}

impl StringOutput {
    /// Creates an empty output; its pointer is null until the first set.
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Replaces the content with `text` and returns the new host pointer.
    pub fn recycle_and_set(&mut self, text: &str) -> *const u16 {
        let previous = self.current.replace(to_host_string(text));
        drop(previous);
        self.as_ptr()
    }

    /// Host pointer to the current content, or null when empty.
    pub fn as_ptr(&self) -> *const u16 {
        self.current
            .as_ref()
            .map_or(ptr::null(), WideBuffer::as_ptr)
    }

    /// Current content, if any.
    pub fn get(&self) -> Option<String> {
        self.current.as_ref().map(WideBuffer::to_string_lossy)
    }

    /// Returns true when nothing has been set yet.
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Frees the current buffer.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
