//! Run command implementation.
//!
//! Drives one measure through the same call sequence the host uses and
//! records what every entry point returned.

use std::time::Duration;

use drizzle_core::marshal::from_host_string;
use drizzle_core::{ConsoleHost, LogEntry, LogLevel, Measure};
use drizzle_measures::{HelloMeasure, SystemVersionMeasure};
use drizzle_plugin::Plugin;
use miette::{Result, miette};
use serde::Serialize;

use super::MeasureKind;
use crate::output;

/// Arguments passed to the measure's custom function.
const CUSTOM_ARGS: [&str; 2] = ["Hello", "Custom Function"];

/// How the harness paces and reports a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Reload, Update, GetString cycles after the first update.
    pub cycles: usize,
    pub interval: Duration,
    pub json: bool,
}

/// One entry point call and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entry")]
pub enum Call {
    Initialize,
    Reload { max_value: f64 },
    Update { value: f64 },
    GetString { text: Option<String> },
    CustomFunc { args: Vec<String>, text: Option<String> },
    Finalize,
}

/// Everything observed during a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub measure: &'static str,
    pub calls: Vec<Call>,
    pub logs: Vec<LogEntry>,
    pub commands: Vec<String>,
}

impl Report {
    pub fn errors(&self) -> usize {
        self.logs.iter().filter(|entry| entry.level == LogLevel::Error).count()
    }
}

/// Executes a run and prints its outcome.
pub async fn execute(kind: MeasureKind, host: ConsoleHost, options: RunOptions) -> Result<()> {
    if !options.json {
        output::info(&format!("Driving measure: {}", kind.name()));
    }

    let report = drive(kind, host, &options).await?;

    if options.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| miette!("Failed to serialize report: {}", e))?;
        println!("{json}");
    } else {
        output::summary(report.measure, report.calls.len(), report.errors());
    }

    Ok(())
}

/// Drives the measure selected by `kind`.
pub async fn drive(kind: MeasureKind, host: ConsoleHost, options: &RunOptions) -> Result<Report> {
    match kind {
        MeasureKind::Hello => Harness::<HelloMeasure>::new(kind, host, options).run().await,
        MeasureKind::SystemVersion => {
            Harness::<SystemVersionMeasure>::new(kind, host, options).run().await
        }
    }
}

struct Harness<'a, M> {
    kind: MeasureKind,
    plugin: Plugin<M>,
    host: ConsoleHost,
    options: &'a RunOptions,
    calls: Vec<Call>,
}

impl<'a, M: Measure> Harness<'a, M> {
    fn new(kind: MeasureKind, host: ConsoleHost, options: &'a RunOptions) -> Self {
        Self {
            kind,
            plugin: Plugin::new(),
            host,
            options,
            calls: Vec::new(),
        }
    }

    async fn run(mut self) -> Result<Report> {
        self.announce("Initialize");
        let handle = self.plugin.initialize(Box::new(self.host.clone()))?;
        self.record(Call::Initialize);

        self.update_and_read(handle)?;

        for _ in 0..self.options.cycles {
            self.pause().await;

            self.announce("Reload");
            let mut max_value = 0.0;
            self.plugin.reload(handle, None, &mut max_value)?;
            self.record(Call::Reload { max_value });

            self.update_and_read(handle)?;
        }

        self.pause().await;
        self.announce("CustomFunc");
        let args: Vec<String> = CUSTOM_ARGS.iter().map(|arg| arg.to_string()).collect();
        let text = read(self.plugin.custom_func(handle, &args)?, "CustomFunc")?;
        self.record(Call::CustomFunc { args, text });

        self.announce("Finalize");
        self.plugin.finalize(handle)?;
        self.record(Call::Finalize);

        Ok(Report {
            measure: self.kind.name(),
            calls: self.calls,
            logs: self.host.logs(),
            commands: self.host.commands(),
        })
    }

    fn update_and_read(&mut self, handle: drizzle_core::Handle) -> Result<()> {
        self.announce("Update");
        let value = self.plugin.update(handle)?;
        self.record(Call::Update { value });

        self.announce("GetString");
        let text = read(self.plugin.get_string(handle)?, "GetString")?;
        self.record(Call::GetString { text });
        Ok(())
    }

    fn announce(&self, entry: &str) {
        if !self.options.json {
            output::call_header(entry);
        }
    }

    fn record(&mut self, call: Call) {
        if !self.options.json {
            match &call {
                Call::Reload { max_value } => output::call_value(*max_value),
                Call::Update { value } => output::call_value(*value),
                Call::GetString { text } | Call::CustomFunc { text, .. } => {
                    output::call_text(text.as_deref())
                }
                Call::Initialize | Call::Finalize => {}
            }
        }
        self.calls.push(call);
    }

    async fn pause(&self) {
        if self.options.interval.is_zero() {
            return;
        }

        let spinner = (!self.options.json).then(|| {
            output::create_spinner(&format!("waiting {}ms", self.options.interval.as_millis()))
        });
        tokio::time::sleep(self.options.interval).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
    }
}

/// Copies a string returned by an entry point; null stays `None`.
fn read(ptr: *const u16, entry: &'static str) -> Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }
    // SAFETY: non-null pointers returned by the dispatcher point into a live
    // buffer owned by the measure until its next call.
    let text = unsafe { from_host_string(ptr, entry) }?;
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(cycles: usize) -> RunOptions {
        RunOptions {
            cycles,
            interval: Duration::ZERO,
            json: true,
        }
    }

    fn host() -> ConsoleHost {
        ConsoleHost::new().with_echo(false)
    }

    #[tokio::test]
    async fn test_hello_sequence() {
        let report = drive(MeasureKind::Hello, host(), &options(2)).await.unwrap();

        let entries: Vec<_> = report
            .calls
            .iter()
            .map(|call| match call {
                Call::Initialize => "Initialize",
                Call::Reload { .. } => "Reload",
                Call::Update { .. } => "Update",
                Call::GetString { .. } => "GetString",
                Call::CustomFunc { .. } => "CustomFunc",
                Call::Finalize => "Finalize",
            })
            .collect();
        assert_eq!(
            entries,
            [
                "Initialize", "Update", "GetString", "Reload", "Update", "GetString", "Reload",
                "Update", "GetString", "CustomFunc", "Finalize",
            ]
        );

        assert!(report.calls.contains(&Call::GetString {
            text: Some("Hello World!".to_string())
        }));
        assert!(report.calls.contains(&Call::CustomFunc {
            args: vec!["Hello".to_string(), "Custom Function".to_string()],
            text: Some("Your custom invocation could be here!".to_string()),
        }));
        assert_eq!(report.errors(), 0);
    }

    #[tokio::test]
    async fn test_system_version_major_mode() {
        let host = host().with_option("Type", "Major");
        let report = drive(MeasureKind::SystemVersion, host, &options(1)).await.unwrap();

        // The first GetString precedes any Reload and still reports a string.
        assert!(matches!(report.calls[2], Call::GetString { text: Some(_) }));
        assert_eq!(report.calls[5], Call::GetString { text: None });
        // CustomFunc is unsupported.
        assert_eq!(report.errors(), 1);
    }

    #[tokio::test]
    async fn test_invalid_type_is_reported_each_reload() {
        let host = host().with_option("Type", "Patch");
        let report = drive(MeasureKind::SystemVersion, host, &options(2)).await.unwrap();

        let invalid = report
            .logs
            .iter()
            .filter(|entry| entry.message == "Invalid value of option 'Type': Patch")
            .count();
        assert_eq!(invalid, 2);
    }

    #[tokio::test]
    async fn test_report_serializes_with_entry_tags() {
        let report = drive(MeasureKind::Hello, host(), &options(0)).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["measure"], "hello");
        assert_eq!(json["calls"][0]["entry"], "Initialize");
        assert_eq!(json["calls"][1]["value"], 0.0);
        assert_eq!(json["calls"][2]["text"], "Hello World!");
    }
}
