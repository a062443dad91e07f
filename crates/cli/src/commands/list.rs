//! List command implementation.

use clap::ValueEnum;
use console::style;
use miette::Result;

use super::MeasureKind;
use crate::output;

/// Lists the measures the console can drive.
pub fn execute(detailed: bool) -> Result<()> {
    println!("{}", style("Available measures:").bold());
    println!();

    for kind in MeasureKind::value_variants() {
        output::list_item(kind.name(), kind.description());

        if detailed {
            for (option, values) in kind.options() {
                output::key_value(option, values);
            }
        }
    }

    Ok(())
}
