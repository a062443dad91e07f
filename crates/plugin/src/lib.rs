//! Drizzle Plugin - Entry point dispatch and host bindings.
//!
//! A measure crate implements [`drizzle_core::Measure`] and a plugin crate
//! exports it with [`export_measure!`]. This crate owns everything in
//! between: the handle registry, panic containment, string marshalling at
//! the boundary and the choice of host proxy.

mod dispatch;
mod export;
pub mod ffi;
mod host;
#[cfg(windows)]
mod rainmeter;

pub use dispatch::Plugin;
pub use host::BoxedHost;
