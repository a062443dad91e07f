//! Harness configuration: what the console host answers when a measure asks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use drizzle_core::ConsoleHost;
use miette::{Result, miette};
use serde::{Deserialize, Serialize};

use crate::discovery;

/// Contents of a `drizzle.json` file.
///
/// ```json
/// {
///   "measure_name": "MeasureVersion",
///   "options": { "Type": "#Mode#" },
///   "variables": { "Mode": "Number" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub measure_name: Option<String>,
    pub skin_name: Option<String>,
    /// Relative paths are resolved against the configuration file's directory.
    pub skin_path: Option<PathBuf>,
    pub settings_file: Option<String>,
    pub options: BTreeMap<String, String>,
    pub variables: BTreeMap<String, String>,
}

impl HarnessConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| miette!("Failed to read {}: {}", path.display(), e))?;
        let mut config: HarnessConfig = serde_json::from_str(&text)
            .map_err(|e| miette!("Invalid harness configuration {}: {}", path.display(), e))?;

        config.options = lowercase_keys(config.options);
        config.variables = lowercase_keys(config.variables);
        config.skin_path = config.skin_path.map(|skin_path| {
            if skin_path.is_relative() {
                discovery::config_dir(path).join(skin_path)
            } else {
                skin_path
            }
        });
        Ok(config)
    }

    /// Loads `explicit` if given, otherwise a discovered `drizzle.json`, otherwise defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discovery::find_config()?,
        };

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading harness configuration");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Applies `Key=Value` overrides from the command line.
    ///
    /// Option and variable names are case-insensitive, so an override
    /// replaces a file entry whatever the casing of either.
    pub fn with_overrides(mut self, options: &[(String, String)], variables: &[(String, String)]) -> Self {
        self.options = lowercase_keys(self.options);
        self.options.extend(lowercase_keys(options.iter().cloned()));
        self.variables = lowercase_keys(self.variables);
        self.variables.extend(lowercase_keys(variables.iter().cloned()));
        self
    }

    /// Builds the console host this configuration describes.
    pub fn into_host(self, echo: bool) -> ConsoleHost {
        let settings_file = self.settings_file.unwrap_or_else(default_settings_file);
        let mut host = ConsoleHost::new()
            .with_echo(echo)
            .with_settings_file(settings_file);

        if let Some(name) = self.measure_name {
            host = host.with_measure_name(name);
        }
        if let Some(name) = self.skin_name {
            host = host.with_skin_name(name);
        }
        if let Some(path) = self.skin_path {
            host = host.with_skin_path(path);
        }
        for (name, value) in self.options {
            host = host.with_option(name, value);
        }
        for (name, value) in self.variables {
            host = host.with_variable(name, value);
        }
        host
    }
}

fn lowercase_keys(
    entries: impl IntoIterator<Item = (String, String)>,
) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_lowercase(), value))
        .collect()
}

/// `<config dir>/Rainmeter/Rainmeter.data`, where a default install keeps its settings.
pub fn default_settings_file() -> String {
    dirs::config_dir()
        .unwrap_or_default()
        .join("Rainmeter")
        .join("Rainmeter.data")
        .to_string_lossy()
        .into_owned()
}

/// Parses a `Key=Value` command line argument.
pub fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected Key=Value, got '{arg}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drizzle_core::HostApi;
    use tempfile::tempdir;

    #[test]
    fn test_load_resolves_relative_skin_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drizzle.json");
        fs::write(
            &path,
            r#"{ "skin_path": "skins/demo", "options": { "Type": "Major" } }"#,
        )
        .unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.skin_path, Some(dir.path().join("skins/demo")));
        assert_eq!(config.options.get("type").map(String::as_str), Some("Major"));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drizzle.json");
        fs::write(&path, r#"{ "option": {} }"#).unwrap();

        assert!(HarnessConfig::load(&path).is_err());
    }

    #[test]
    fn test_overrides_win_over_file_entries() {
        let config = HarnessConfig {
            options: BTreeMap::from([("Type".to_string(), "Major".to_string())]),
            ..HarnessConfig::default()
        };
        let config = config.with_overrides(
            &[("Type".to_string(), "Number".to_string())],
            &[("Mode".to_string(), "x".to_string())],
        );

        assert_eq!(config.options["type"], "Number");
        assert_eq!(config.variables["mode"], "x");
    }

    #[test]
    fn test_overrides_win_regardless_of_key_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drizzle.json");
        fs::write(
            &path,
            r##"{ "options": { "type": "Major", "Text": "#mode#" }, "variables": { "MODE": "file" } }"##,
        )
        .unwrap();

        let host = HarnessConfig::load(&path)
            .unwrap()
            .with_overrides(
                &[("Type".to_string(), "Number".to_string())],
                &[("Mode".to_string(), "cli".to_string())],
            )
            .into_host(false);

        assert_eq!(host.read_string("Type", "String", true).unwrap(), "Number");
        assert_eq!(host.read_string("Text", "", true).unwrap(), "cli");
    }

    #[test]
    fn test_into_host_answers_from_config() {
        let config = HarnessConfig {
            measure_name: Some("MeasureVersion".to_string()),
            settings_file: Some("C:\\Rainmeter.data".to_string()),
            options: BTreeMap::from([("Type".to_string(), "#Mode#".to_string())]),
            variables: BTreeMap::from([("Mode".to_string(), "Minor".to_string())]),
            ..HarnessConfig::default()
        };
        let host = config.into_host(false);

        assert_eq!(host.measure_name().unwrap(), "MeasureVersion");
        assert_eq!(host.settings_file().unwrap(), "C:\\Rainmeter.data");
        assert_eq!(host.read_string("Type", "String", true).unwrap(), "Minor");
    }

    #[test]
    fn test_default_settings_file_location() {
        assert!(default_settings_file().ends_with("Rainmeter.data"));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("Type=Major").unwrap(),
            ("Type".to_string(), "Major".to_string())
        );
        assert_eq!(
            parse_key_value("Text=a=b").unwrap(),
            ("Text".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("Type").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
