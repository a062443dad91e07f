//! In-process stand-in for the host.
//!
//! Prints every host call to standard output and answers with the configured
//! option values or the caller's defaults. Log entries and executed bangs are
//! recorded so tests and the test console can inspect them afterwards.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::host::{HostApi, HostPointer, LogLevel};
use crate::interpolation::{VariableSet, replace_variables};

/// A log call recorded by [`ConsoleHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
struct Journal {
    logs: Vec<LogEntry>,
    commands: Vec<String>,
}

/// Test double for [`HostApi`].
///
/// Clones share the same journal, so a clone kept by a test sees everything
/// logged through the clone owned by the measure.
#[derive(Debug, Clone)]
pub struct ConsoleHost {
    options: HashMap<String, String>,
    variables: VariableSet,
    measure_name: String,
    skin_name: String,
    skin_path: PathBuf,
    settings_file: String,
    echo: bool,
    journal: Arc<Mutex<Journal>>,
}

impl ConsoleHost {
    /// Creates a host with no options that echoes calls to stdout.
    pub fn new() -> Self {
        Self {
            options: HashMap::new(),
            variables: VariableSet::new(),
            measure_name: String::new(),
            skin_name: String::new(),
            skin_path: PathBuf::from("."),
            settings_file: String::new(),
            echo: true,
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    /// Sets an option value. Option names are case-insensitive.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_option(name, value);
        self
    }

    /// Sets a variable available to `#Name#` substitution.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name, value);
        self
    }

    /// Sets the measure section name.
    pub fn with_measure_name(mut self, name: impl Into<String>) -> Self {
        self.measure_name = name.into();
        self
    }

    /// Sets the skin name.
    pub fn with_skin_name(mut self, name: impl Into<String>) -> Self {
        self.skin_name = name.into();
        self
    }

    /// Sets the directory relative paths are resolved against.
    pub fn with_skin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skin_path = path.into();
        self
    }

    /// Sets the settings file path.
    pub fn with_settings_file(mut self, path: impl Into<String>) -> Self {
        self.settings_file = path.into();
        self
    }

    /// Enables or disables printing calls to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Changes an option, e.g. between two Reload calls.
    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.insert(name.into().to_lowercase(), value.into());
    }

    /// Removes an option so reads fall back to their default again.
    pub fn remove_option(&mut self, name: &str) {
        self.options.remove(&name.to_lowercase());
    }

    /// All recorded log entries.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.journal.lock().logs.clone()
    }

    /// Recorded log entries of one level.
    pub fn logs_at(&self, level: LogLevel) -> Vec<LogEntry> {
        self.journal
            .lock()
            .logs
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    /// All commands passed to [`HostApi::execute`].
    pub fn commands(&self) -> Vec<String> {
        self.journal.lock().commands.clone()
    }

    /// Forgets recorded logs and commands.
    pub fn clear_journal(&self) {
        let mut journal = self.journal.lock();
        journal.logs.clear();
        journal.commands.clear();
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    fn echo(&self, call: std::fmt::Arguments<'_>) {
        if self.echo {
            println!("Called {call}");
        }
    }
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostApi for ConsoleHost {
    fn log(&self, level: LogLevel, message: &str) {
        self.echo(format_args!(
            "Log(\n\tlogLevel: '{level}',\n\tmessage: '{message}')"
        ));
        self.journal.lock().logs.push(LogEntry {
            level,
            message: message.to_string(),
        });
    }

    fn read_string(&self, option: &str, default: &str, replace_measures: bool) -> Result<String> {
        self.echo(format_args!(
            "ReadString(\n\toptionName: '{option}',\n\tdefaultValue: '{default}',\n\treplaceMeasures: '{replace_measures}')"
        ));
        let value = match self.option(option) {
            Some(value) => replace_variables(value, &self.variables),
            None => default.to_string(),
        };
        Ok(value)
    }

    fn read_path(&self, option: &str, default: &str) -> Result<String> {
        self.echo(format_args!(
            "ReadPath(\n\toptionName: '{option}',\n\tdefaultValue: '{default}')"
        ));
        let value = match self.option(option) {
            Some(value) => replace_variables(value, &self.variables),
            None => default.to_string(),
        };
        if value.is_empty() {
            return Ok(value);
        }
        Ok(self.skin_path.join(value).to_string_lossy().into_owned())
    }

    fn read_double(&self, option: &str, default: f64) -> f64 {
        self.echo(format_args!(
            "ReadDouble(\n\toptionName: '{option}',\n\tdefaultValue: '{default}')"
        ));
        self.option(option)
            .map(|value| replace_variables(value, &self.variables))
            .and_then(|value| parse_number(&value))
            .unwrap_or(default)
    }

    fn read_int(&self, option: &str, default: i32) -> i32 {
        self.echo(format_args!(
            "ReadInt(\n\toptionName: '{option}',\n\tdefaultValue: '{default}')"
        ));
        self.option(option)
            .map(|value| replace_variables(value, &self.variables))
            .and_then(|value| parse_number(&value))
            .map(|value| value as i32)
            .unwrap_or(default)
    }

    fn replace_variables(&self, text: &str) -> Result<String> {
        self.echo(format_args!("ReplaceVariables(\n\tstr: '{text}')"));
        Ok(replace_variables(text, &self.variables))
    }

    fn measure_name(&self) -> Result<String> {
        self.echo(format_args!("GetMeasureName()"));
        Ok(self.measure_name.clone())
    }

    fn skin(&self) -> HostPointer {
        self.echo(format_args!("GetSkin()"));
        HostPointer::NULL
    }

    fn skin_name(&self) -> Result<String> {
        self.echo(format_args!("GetSkinName()"));
        Ok(self.skin_name.clone())
    }

    fn skin_window(&self) -> HostPointer {
        self.echo(format_args!("GetSkinWindow()"));
        HostPointer::NULL
    }

    fn settings_file(&self) -> Result<String> {
        self.echo(format_args!("GetSettingsFile()"));
        Ok(self.settings_file.clone())
    }

    fn execute(&self, command: &str) {
        self.echo(format_args!("Execute(\n\tcommand: '{command}')"));
        self.journal.lock().commands.push(command.to_string());
    }
}

/// Parses a plain number, optionally wrapped in parentheses like a formula.
fn parse_number(value: &str) -> Option<f64> {
    let mut trimmed = value.trim();
    while let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        trimmed = inner.trim();
    }
    trimmed.parse().ok()
}
