//! The capability set a measure may use to talk back to the host.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Severity of a message sent to the host log.
///
/// The discriminants are the host's `LOG_*` codes. Ordering follows severity,
/// so `Debug < Notice < Warning < Error`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 1,
    Warning = 2,
    Notice = 3,
    /// Only shown by the host when it runs in debug mode.
    Debug = 4,
}

impl LogLevel {
    /// The host's numeric log level code.
    pub fn code(self) -> i32 {
        self as i32
    }

    fn severity(self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Notice => 1,
            LogLevel::Warning => 2,
            LogLevel::Error => 3,
        }
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Notice => "Notice",
            LogLevel::Debug => "Debug",
        };
        f.write_str(name)
    }
}

/// Opaque host pointer (skin or skin window). Never dereferenced by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HostPointer(usize);

impl HostPointer {
    /// The null pointer.
    pub const NULL: HostPointer = HostPointer(0);

    pub fn from_raw(raw: usize) -> Self {
        HostPointer(raw)
    }

    pub fn raw(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Proxy over the functions the host exports to measures.
///
/// Reads never fail from the measure's point of view: missing or unparsable
/// options fall back to the supplied default. String results can still fail
/// with [`MeasureError::MarshalFailure`](crate::MeasureError::MarshalFailure),
/// which implementations log at [`LogLevel::Error`] before returning it.
pub trait HostApi {
    /// Sends a message to the host log. Fire and forget.
    fn log(&self, level: LogLevel, message: &str);

    /// Reads an option of the measure section.
    fn read_string(&self, option: &str, default: &str, replace_measures: bool) -> Result<String>;

    /// Reads an option and resolves it to an absolute path.
    ///
    /// The result depends on the host state; do not cache it past a Reload.
    fn read_path(&self, option: &str, default: &str) -> Result<String>;

    /// Reads an option, evaluating it as a formula.
    fn read_double(&self, option: &str, default: f64) -> f64;

    /// Reads an option as a formula and truncates it to an integer.
    fn read_int(&self, option: &str, default: i32) -> i32;

    /// Substitutes host variables in `text`.
    fn replace_variables(&self, text: &str) -> Result<String>;

    /// Name of the measure section. Query once in Initialize.
    fn measure_name(&self) -> Result<String>;

    /// The skin the measure belongs to. Query once in Initialize.
    fn skin(&self) -> HostPointer;

    /// Name of the skin. Query once in Initialize.
    fn skin_name(&self) -> Result<String>;

    /// Window handle of the skin. Query once in Initialize.
    fn skin_window(&self) -> HostPointer;

    /// Path of the host settings file. Query once in Initialize.
    fn settings_file(&self) -> Result<String>;

    /// Asks the host to execute a bang on the skin. Fire and forget.
    fn execute(&self, command: &str);
}
