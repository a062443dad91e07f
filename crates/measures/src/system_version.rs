//! The operating system version measure.

use std::fmt;
use std::str::FromStr;

use drizzle_core::{HostApi, LogLevel, Measure, MeasureError, Result, StringOutput};
use serde::{Deserialize, Serialize};

const TYPE_OPTION: &str = "Type";

/// What the measure reports, selected by the `Type` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasureType {
    /// `"{major}.{minor} (Build {build})"` as the string value.
    #[default]
    String,
    /// The major version as the number.
    Major,
    /// The minor version as the number.
    Minor,
    /// `major + minor / 10` as the number.
    Number,
}

impl MeasureType {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasureType::String => "String",
            MeasureType::Major => "Major",
            MeasureType::Minor => "Minor",
            MeasureType::Number => "Number",
        }
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasureType {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self> {
        [
            MeasureType::String,
            MeasureType::Major,
            MeasureType::Minor,
            MeasureType::Number,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| MeasureError::invalid_option(TYPE_OPTION, s))
    }
}

/// An operating system version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OsVersion {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
}

impl OsVersion {
    pub fn new(major: u64, minor: u64, build: u64) -> Self {
        Self { major, minor, build }
    }

    /// Queries the running system. Unknown parts are reported as 0.
    pub fn current() -> Self {
        let info = os_info::get();
        let version = match info.version() {
            os_info::Version::Semantic(major, minor, build) => Self::new(*major, *minor, *build),
            os_info::Version::Custom(text) => Self::parse(text),
            os_info::Version::Rolling(Some(text)) => Self::parse(text),
            _ => Self::default(),
        };
        tracing::debug!(os = %info.os_type(), %version, "detected system version");
        version
    }

    /// Reads the leading numeric components of a dotted version string.
    fn parse(text: &str) -> Self {
        let mut parts = text
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse().unwrap_or(0));
        Self::new(
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
        )
    }

    /// The numeric form, e.g. 6.2 for major 6 and minor 2.
    pub fn as_number(&self) -> f64 {
        self.major as f64 + self.minor as f64 / 10.0
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} (Build {})", self.major, self.minor, self.build)
    }
}

/// Reports the OS version as a string or as one of three numbers.
#[derive(Debug)]
pub struct SystemVersionMeasure {
    kind: MeasureType,
    version: OsVersion,
    output: StringOutput,
}

impl SystemVersionMeasure {
    /// Builds a measure over a fixed version instead of the running system.
    pub fn with_version(version: OsVersion) -> Self {
        Self {
            kind: MeasureType::default(),
            version,
            output: StringOutput::new(),
        }
    }

    pub fn kind(&self) -> MeasureType {
        self.kind
    }

    pub fn version(&self) -> OsVersion {
        self.version
    }
}

impl Measure for SystemVersionMeasure {
    fn initialize(_host: &dyn HostApi) -> Result<Self> {
        Ok(Self::with_version(OsVersion::current()))
    }

    fn reload(&mut self, host: &dyn HostApi, _max_value: &mut f64) {
        // A failed read has been logged by the proxy already.
        let Ok(value) = host.read_string(TYPE_OPTION, MeasureType::default().as_str(), true) else {
            return;
        };

        match value.parse() {
            Ok(kind) => self.kind = kind,
            Err(err) => host.log(LogLevel::Error, &err.to_string()),
        }
    }

    fn update(&mut self, _host: &dyn HostApi) -> f64 {
        match self.kind {
            MeasureType::String => {
                self.output.recycle_and_set(&self.version.to_string());
                0.0
            }
            MeasureType::Major => self.version.major as f64,
            MeasureType::Minor => self.version.minor as f64,
            MeasureType::Number => self.version.as_number(),
        }
    }

    fn get_string(&mut self, _host: &dyn HostApi) -> Option<&StringOutput> {
        (self.kind == MeasureType::String).then_some(&self.output)
    }

    fn execute_bang(&mut self, _host: &dyn HostApi, _args: &str) -> Result<()> {
        Err(MeasureError::UnsupportedOperation("ExecuteBang"))
    }

    fn custom_func(&mut self, _host: &dyn HostApi, _args: &[String]) -> Result<Option<&StringOutput>> {
        Err(MeasureError::UnsupportedOperation("CustomFunc"))
    }

    fn finalize(&mut self, _host: &dyn HostApi) {
        self.output.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drizzle_core::ConsoleHost;

    fn host() -> ConsoleHost {
        ConsoleHost::new().with_echo(false)
    }

    fn measure() -> SystemVersionMeasure {
        SystemVersionMeasure::with_version(OsVersion::new(10, 0, 19045))
    }

    fn reload(measure: &mut SystemVersionMeasure, host: &ConsoleHost) {
        let mut max_value = 0.0;
        measure.reload(host, &mut max_value);
    }

    #[test]
    fn test_parse_type_is_case_insensitive() {
        assert_eq!("major".parse::<MeasureType>().unwrap(), MeasureType::Major);
        assert_eq!("NUMBER".parse::<MeasureType>().unwrap(), MeasureType::Number);
        assert_eq!(" Minor ".parse::<MeasureType>().unwrap(), MeasureType::Minor);
        assert!(matches!(
            "Patch".parse::<MeasureType>(),
            Err(MeasureError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_default_mode_is_string() {
        let host = host();
        let mut measure = measure();
        reload(&mut measure, &host);

        assert_eq!(measure.kind(), MeasureType::String);
        assert_eq!(measure.update(&host), 0.0);
        let text = measure.get_string(&host).and_then(StringOutput::get);
        assert_eq!(text.as_deref(), Some("10.0 (Build 19045)"));
        assert!(host.logs().is_empty());
    }

    #[test]
    fn test_update_without_reload_uses_default_mode() {
        let host = host();
        let mut measure = measure();
        assert_eq!(measure.update(&host), 0.0);
        assert!(measure.get_string(&host).is_some());
    }

    #[test]
    fn test_major_mode_reports_number_only() {
        let host = host().with_option("Type", "Major");
        let mut measure = measure();
        reload(&mut measure, &host);

        assert_eq!(measure.update(&host), 10.0);
        assert!(measure.get_string(&host).is_none());
    }

    #[test]
    fn test_minor_and_number_modes() {
        let version = OsVersion::new(6, 2, 9200);
        let mut measure = SystemVersionMeasure::with_version(version);

        let minor = host().with_option("Type", "minor");
        reload(&mut measure, &minor);
        assert_eq!(measure.update(&minor), 2.0);

        let number = host().with_option("Type", "Number");
        reload(&mut measure, &number);
        assert!((measure.update(&number) - 6.2).abs() < f64::EPSILON);
        assert!(measure.get_string(&number).is_none());
    }

    #[test]
    fn test_invalid_type_logs_once_and_keeps_mode() {
        let mut measure = measure();
        reload(&mut measure, &host().with_option("Type", "Major"));

        let host = host().with_option("Type", "Patch");
        reload(&mut measure, &host);

        assert_eq!(measure.kind(), MeasureType::Major);
        let errors = host.logs_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid value of option 'Type': Patch");
    }

    #[test]
    fn test_invalid_type_on_first_reload_falls_back_to_string() {
        let host = host().with_option("Type", "");
        let mut measure = measure();
        reload(&mut measure, &host);

        assert_eq!(measure.kind(), MeasureType::String);
        assert_eq!(host.logs_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_bang_and_custom_func_are_unsupported() {
        let host = host();
        let mut measure = measure();

        assert!(matches!(
            measure.execute_bang(&host, "Refresh"),
            Err(MeasureError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            measure.custom_func(&host, &[]),
            Err(MeasureError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_parse_custom_version_text() {
        assert_eq!(OsVersion::parse("10.0.22631"), OsVersion::new(10, 0, 22631));
        assert_eq!(OsVersion::parse("24.04"), OsVersion::new(24, 4, 0));
        assert_eq!(OsVersion::parse("rolling"), OsVersion::default());
    }
}
