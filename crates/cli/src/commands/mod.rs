//! CLI command implementations.

pub mod list;
pub mod run;

use clap::ValueEnum;

/// Measures the test console can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeasureKind {
    /// Reports "Hello World!".
    Hello,
    /// Reports the operating system version.
    SystemVersion,
}

impl MeasureKind {
    pub fn name(self) -> &'static str {
        match self {
            MeasureKind::Hello => "hello",
            MeasureKind::SystemVersion => "system-version",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MeasureKind::Hello => "constant string measure",
            MeasureKind::SystemVersion => "operating system version measure",
        }
    }

    /// Options the measure reads on Reload.
    pub fn options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MeasureKind::Hello => &[],
            MeasureKind::SystemVersion => &[("Type", "String | Major | Minor | Number")],
        }
    }
}
