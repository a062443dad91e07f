//! Opaque measure handles and the slot table behind them.
//!
//! A [`Handle`] packs a slot index and a generation counter into a single
//! non-zero machine word, so it can travel through the host as a `void*`.
//! Releasing a slot bumps its generation: a handle kept by the host after
//! `Finalize` no longer matches and resolves to [`MeasureError::HandleNotFound`].
//!
//! Index and generation each take half of the word. On 32-bit targets that is
//! 65,535 slots and 65,536 generations per slot. A slot whose generation is
//! used up is retired instead of reused, so a stale handle never aliases a
//! live one; allocation fails with [`MeasureError::HandlesExhausted`] once
//! no slot is left.

use std::ffi::c_void;
use std::num::NonZeroUsize;

use crate::error::{MeasureError, Result};

const INDEX_BITS: u32 = usize::BITS / 2;
const INDEX_MASK: usize = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (INDEX_MASK as u64 & u32::MAX as u64) as u32;
/// Slot indices are stored offset by one, so `INDEX_MASK` itself is the last usable token.
const MAX_SLOTS: usize = INDEX_MASK;

/// Opaque token identifying a live measure instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroUsize);

impl Handle {
    fn new(index: usize, generation: u32) -> Self {
        // The stored index is offset by one so the token is never zero.
        let raw = ((generation as usize) << INDEX_BITS) | ((index + 1) & INDEX_MASK);
        match NonZeroUsize::new(raw) {
            Some(raw) => Handle(raw),
            None => unreachable!("slot index is offset by one"),
        }
    }

    /// Reconstructs a handle from the raw value the host gave back.
    ///
    /// Returns `None` for the null sentinel.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Handle)
    }

    /// Reconstructs a handle from the host's `void*` data pointer.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        Self::from_raw(ptr as usize)
    }

    /// The raw token value.
    pub fn raw(self) -> usize {
        self.0.get()
    }

    /// The token as the host-facing data pointer. Never dereferenced.
    pub fn as_ptr(self) -> *mut c_void {
        self.raw() as *mut c_void
    }

    fn index(self) -> usize {
        (self.raw() & INDEX_MASK).wrapping_sub(1)
    }

    fn generation(self) -> u32 {
        (self.raw() >> INDEX_BITS) as u32
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena mapping handles to plugin-owned values.
///
/// Not synchronized; wrap it in a mutex when it is shared between threads.
pub struct HandleRegistry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    live: usize,
    capacity: usize,
}

impl<T> HandleRegistry<T> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self::with_capacity(MAX_SLOTS)
    }

    /// Creates an empty registry holding at most `capacity` slots.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            capacity: if capacity < MAX_SLOTS { capacity } else { MAX_SLOTS },
        }
    }

    /// Stores a value and returns the handle that now owns it.
    ///
    /// Fails when every slot is live or retired; `value` is dropped.
    pub fn allocate(&mut self, value: T) -> Result<Handle> {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].value = Some(value);
                index
            }
            None if self.slots.len() >= self.capacity => {
                return Err(MeasureError::HandlesExhausted(self.slots.len()));
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                self.slots.len() - 1
            }
        };

        self.live += 1;
        let handle = Handle::new(index, self.slots[index].generation);
        tracing::trace!(handle = handle.raw(), live = self.live, "allocated measure handle");
        Ok(handle)
    }

    /// Looks up the value behind a handle.
    pub fn resolve(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Looks up a raw host value, failing on null or unknown handles.
    pub fn resolve_or_fail(&self, raw: usize) -> Result<&T> {
        Handle::from_raw(raw)
            .and_then(|handle| self.resolve(handle))
            .ok_or(MeasureError::HandleNotFound(raw))
    }

    /// Invalidates the handle and hands the value back for disposal.
    pub fn release(&mut self, handle: Handle) -> Result<T> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .ok_or(MeasureError::HandleNotFound(handle.raw()))?;

        let value = slot
            .value
            .take()
            .ok_or(MeasureError::HandleNotFound(handle.raw()))?;

        self.live -= 1;
        if slot.generation < GENERATION_MASK {
            slot.generation += 1;
            self.free.push(handle.index());
        } else {
            tracing::debug!(handle = handle.raw(), "measure handle slot retired");
        }

        tracing::trace!(handle = handle.raw(), live = self.live, "released measure handle");
        Ok(value)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true when no handle is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_resolve() {
        let mut registry = HandleRegistry::new();
        let a = registry.allocate("a").unwrap();
        let b = registry.allocate("b").unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.resolve(a), Some(&"a"));
        assert_eq!(registry.resolve(b), Some(&"b"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_handle_is_never_null() {
        let mut registry = HandleRegistry::new();
        let handle = registry.allocate(1).unwrap();
        assert!(!handle.as_ptr().is_null());
        assert_eq!(Handle::from_ptr(handle.as_ptr()), Some(handle));
        assert_eq!(Handle::from_raw(0), None);
    }

    #[test]
    fn test_resolve_or_fail_rejects_null() {
        let registry: HandleRegistry<u8> = HandleRegistry::new();
        let err = registry.resolve_or_fail(0).unwrap_err();
        assert!(matches!(err, MeasureError::HandleNotFound(0)));
    }

    #[test]
    fn test_release_returns_value_and_invalidates() {
        let mut registry = HandleRegistry::new();
        let handle = registry.allocate(String::from("measure")).unwrap();

        assert_eq!(registry.release(handle).unwrap(), "measure");
        assert!(registry.resolve(handle).is_none());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve_or_fail(handle.raw()),
            Err(MeasureError::HandleNotFound(_))
        ));
        assert!(registry.release(handle).is_err());
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut registry = HandleRegistry::new();
        let old = registry.allocate(1).unwrap();
        registry.release(old).unwrap();

        let new = registry.allocate(2).unwrap();
        assert_ne!(old, new);
        assert!(registry.resolve(old).is_none());
        assert_eq!(registry.resolve(new), Some(&2));
    }

    #[test]
    fn test_allocation_fails_past_capacity() {
        let mut registry = HandleRegistry::with_capacity(2);
        let a = registry.allocate('a').unwrap();
        registry.allocate('b').unwrap();

        assert!(matches!(
            registry.allocate('c'),
            Err(MeasureError::HandlesExhausted(2))
        ));

        registry.release(a).unwrap();
        let c = registry.allocate('c').unwrap();
        assert_eq!(registry.resolve(c), Some(&'c'));
    }

    #[test]
    fn test_capacity_is_clamped_to_index_space() {
        let registry: HandleRegistry<()> = HandleRegistry::with_capacity(usize::MAX);
        assert_eq!(registry.capacity, MAX_SLOTS);
    }

    #[test]
    fn test_slot_is_retired_when_generations_run_out() {
        let mut registry = HandleRegistry::with_capacity(1);
        let first = registry.allocate(1).unwrap();
        registry.release(first).unwrap();

        registry.slots[0].generation = GENERATION_MASK;
        let last = registry.allocate(2).unwrap();
        registry.release(last).unwrap();

        assert!(registry.resolve(last).is_none());
        assert!(registry.release(last).is_err());
        assert!(matches!(
            registry.allocate(3),
            Err(MeasureError::HandlesExhausted(1))
        ));
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let mut registry = HandleRegistry::new();
        registry.allocate(()).unwrap();
        assert!(registry.resolve_or_fail(0xdead_beef).is_err());
        assert!(registry.resolve_or_fail(!INDEX_MASK).is_err());
    }
}
