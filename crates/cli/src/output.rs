//! Terminal output formatting.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Prints the header of one entry point call.
pub fn call_header(name: &str) {
    println!("\n{} {}", style("▶").cyan().bold(), style(name).cyan().bold());
}

/// Prints the number an entry point returned.
pub fn call_value(value: f64) {
    println!("  {} {}", style("=").dim(), value);
}

/// Prints the string an entry point returned; null is shown as such.
pub fn call_text(text: Option<&str>) {
    match text {
        Some(text) => println!("  {} \"{}\"", style("=").dim(), text),
        None => println!("  {} {}", style("=").dim(), style("null").dim()),
    }
}

/// Prints a summary of the run.
pub fn summary(measure: &str, calls: usize, errors: usize) {
    println!();

    if errors > 0 {
        println!(
            "{}: {} drove {} calls, host logged {} error(s)",
            style("ERRORS").red().bold(),
            measure,
            calls,
            errors
        );
    } else {
        println!(
            "{}: {} drove {} calls",
            style("SUCCESS").green().bold(),
            measure,
            calls
        );
    }
}

/// Creates a spinner shown while the harness waits between calls.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}");
    if let Ok(template) = template {
        spinner.set_style(template);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Prints a list item.
pub fn list_item(name: &str, description: &str) {
    println!("  {} {} - {}", style("•").dim(), style(name).cyan().bold(), style(description).dim());
}

/// Prints a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("    {}: {}", style(key).dim(), value);
}
