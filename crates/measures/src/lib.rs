//! Drizzle Measures - Reference measure implementations.
//!
//! [`HelloMeasure`] reports a constant string and [`SystemVersionMeasure`]
//! reports the operating system version in one of four modes. Both are
//! plain [`drizzle_core::Measure`] types; the `plugins/*` crates export them.

mod hello;
mod system_version;

pub use hello::HelloMeasure;
pub use system_version::{MeasureType, OsVersion, SystemVersionMeasure};
