//! Terminal output utilities.

use crate::models::ResourceId;
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    if quoted.len() >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// One line per apply batch; resources within a batch are independent.
pub fn format_apply_batches(batches: &[Vec<ResourceId>]) -> Vec<String> {
    batches
        .iter()
        .enumerate()
        .map(|(i, batch)| {
            let ids: Vec<&str> = batch.iter().map(|id| id.as_str()).collect();
            format!("batch {:>3} ({:>3}): {}", i, batch.len(), ids.join(" "))
        })
        .collect()
}

pub fn print_apply_batches(batches: &[Vec<ResourceId>]) {
    println!("#{}# apply order, {} batches", "APPLY".on_blue(), batches.len());
    for line in format_apply_batches(batches) {
        println!("{line}");
    }
}
