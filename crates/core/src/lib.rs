//! Drizzle Core - Types and contracts shared by Drizzle measure plugins.

pub mod console;
mod error;
mod handle;
mod host;
pub mod interpolation;
pub mod marshal;
mod measure;

pub use console::{ConsoleHost, LogEntry};
pub use error::{MeasureError, Result};
pub use handle::{Handle, HandleRegistry};
pub use host::{HostApi, HostPointer, LogLevel};
pub use marshal::{StringOutput, WideBuffer};
pub use measure::Measure;
