//! The constant-string measure.

use drizzle_core::{HostApi, LogLevel, Measure, Result, StringOutput};

const GREETING: &str = "Hello World!";
const CUSTOM_REPLY: &str = "Your custom invocation could be here!";

/// Reports "Hello World!" as its string value and 0 as its number.
///
/// Every lifecycle call is logged at Debug, which makes the measure useful for
/// watching the host drive a plugin.
#[derive(Debug, Default)]
pub struct HelloMeasure {
    output: StringOutput,
    custom: StringOutput,
}

impl Measure for HelloMeasure {
    fn initialize(host: &dyn HostApi) -> Result<Self> {
        host.log(LogLevel::Debug, "Initialize was called!");
        Ok(Self::default())
    }

    fn reload(&mut self, host: &dyn HostApi, _max_value: &mut f64) {
        host.log(LogLevel::Debug, "Reload was called!");
    }

    fn update(&mut self, host: &dyn HostApi) -> f64 {
        host.log(LogLevel::Debug, "Update was called!");
        self.output.recycle_and_set(GREETING);
        0.0
    }

    fn get_string(&mut self, host: &dyn HostApi) -> Option<&StringOutput> {
        host.log(LogLevel::Debug, "GetString was called!");
        Some(&self.output)
    }

    fn execute_bang(&mut self, host: &dyn HostApi, args: &str) -> Result<()> {
        host.log(LogLevel::Debug, &format!("ExecuteBang was called with '{args}'"));
        Ok(())
    }

    fn custom_func(&mut self, host: &dyn HostApi, args: &[String]) -> Result<Option<&StringOutput>> {
        host.log(
            LogLevel::Debug,
            &format!("CustomFunc was called with {} argument(s)", args.len()),
        );
        self.custom.recycle_and_set(CUSTOM_REPLY);
        Ok(Some(&self.custom))
    }

    fn finalize(&mut self, host: &dyn HostApi) {
        host.log(LogLevel::Debug, "Finalize was called!");
        self.output.clear();
        self.custom.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drizzle_core::ConsoleHost;

    fn host() -> ConsoleHost {
        ConsoleHost::new().with_echo(false)
    }

    #[test]
    fn test_update_then_get_string() {
        let host = host();
        let mut measure = HelloMeasure::initialize(&host).unwrap();

        assert_eq!(measure.update(&host), 0.0);
        let text = measure.get_string(&host).and_then(StringOutput::get);
        assert_eq!(text.as_deref(), Some("Hello World!"));
    }

    #[test]
    fn test_get_string_before_update_is_empty() {
        let host = host();
        let mut measure = HelloMeasure::initialize(&host).unwrap();
        let output = measure.get_string(&host).unwrap();
        assert!(output.as_ptr().is_null());
    }

    #[test]
    fn test_custom_func_uses_its_own_buffer() {
        let host = host();
        let mut measure = HelloMeasure::initialize(&host).unwrap();
        measure.update(&host);

        let args = vec!["Hello".to_string(), "Custom Function".to_string()];
        let reply = measure.custom_func(&host, &args).unwrap().unwrap().get();
        assert_eq!(reply.as_deref(), Some("Your custom invocation could be here!"));

        let text = measure.get_string(&host).and_then(StringOutput::get);
        assert_eq!(text.as_deref(), Some("Hello World!"));
    }

    #[test]
    fn test_lifecycle_logs_debug_only() {
        let host = host();
        let mut measure = HelloMeasure::initialize(&host).unwrap();
        let mut max_value = 0.0;
        measure.reload(&host, &mut max_value);
        measure.update(&host);
        measure.get_string(&host);
        measure.execute_bang(&host, "Refresh").unwrap();
        measure.finalize(&host);

        let logs = host.logs();
        assert_eq!(logs.len(), 6);
        assert!(logs.iter().all(|entry| entry.level == LogLevel::Debug));
        assert_eq!(max_value, 0.0);
    }
}
