//! Host variable substitution used by the console host.
//!
//! Supports the following syntax:
//! - `#Name#` - Reference a variable
//! - `#*Name*#` - Escaped reference, kept as the literal `#Name#`
//!
//! Unknown variables are left untouched, so substituting a string without
//! resolvable references returns it unchanged.

use std::collections::HashMap;

/// Variables known to the host.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    variables: HashMap<String, String>,
}

impl VariableSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable to the set.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a variable. Names are case-insensitive.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables
            .insert(name.into().to_lowercase(), value.into());
    }

    /// Gets a variable value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}

/// Substitutes `#Name#` references in `input`.
///
/// # Examples
/// ```
/// use drizzle_core::interpolation::{replace_variables, VariableSet};
///
/// let vars = VariableSet::new().with_variable("Color", "255,0,0");
/// assert_eq!(replace_variables("Fill #Color#", &vars), "Fill 255,0,0");
/// assert_eq!(replace_variables("#Unknown#", &vars), "#Unknown#");
/// ```
pub fn replace_variables(input: &str, vars: &VariableSet) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('#') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match parse_reference(after) {
            Some((Reference::Escaped(name), consumed)) => {
                result.push('#');
                result.push_str(name);
                result.push('#');
                rest = &after[consumed..];
            }
            Some((Reference::Variable(name), consumed)) => {
                match vars.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push('#');
                        result.push_str(name);
                        result.push('#');
                    }
                }
                rest = &after[consumed..];
            }
            None => {
                result.push('#');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

#[derive(Debug, PartialEq)]
enum Reference<'a> {
    Variable(&'a str),
    Escaped(&'a str),
}

/// Parses a reference after the opening `#`.
/// Returns the reference and the number of bytes consumed including the closing `#`.
fn parse_reference(input: &str) -> Option<(Reference<'_>, usize)> {
    let end = input.find('#')?;
    let body = &input[..end];

    if let Some(name) = body.strip_prefix('*').and_then(|b| b.strip_suffix('*')) {
        return is_name(name).then_some((Reference::Escaped(name), end + 1));
    }

    is_name(body).then_some((Reference::Variable(body), end + 1))
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_variable() {
        let vars = VariableSet::new().with_variable("name", "world");
        assert_eq!(replace_variables("Hello, #name#!", &vars), "Hello, world!");
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let vars = VariableSet::new().with_variable("SkinColor", "red");
        assert_eq!(replace_variables("#skincolor#", &vars), "red");
    }

    #[test]
    fn test_multiple_variables() {
        let vars = VariableSet::new()
            .with_variable("first", "Hello")
            .with_variable("second", "World");
        assert_eq!(
            replace_variables("#first#, #second#!", &vars),
            "Hello, World!"
        );
    }

    #[test]
    fn test_escaped_reference() {
        let vars = VariableSet::new().with_variable("name", "world");
        assert_eq!(replace_variables("#*name*#", &vars), "#name#");
    }

    #[test]
    fn test_unknown_variable_is_kept() {
        let vars = VariableSet::new();
        assert_eq!(replace_variables("#missing#", &vars), "#missing#");
    }

    #[test]
    fn test_lone_hash_is_kept() {
        let vars = VariableSet::new().with_variable("x", "1");
        assert_eq!(replace_variables("# of items: #x#", &vars), "# of items: 1");
        assert_eq!(replace_variables("trailing #", &vars), "trailing #");
    }

    #[test]
    fn test_idempotent_without_references() {
        let vars = VariableSet::new().with_variable("x", "1");
        let once = replace_variables("plain text 100%", &vars);
        assert_eq!(once, "plain text 100%");
        assert_eq!(replace_variables(&once, &vars), once);
    }
}
