//! Output of synthesized topologies.
//!
//! - [`csv`] - route tables as CSV
//! - [`terminal`] - field formatting and apply batches
//! - [`json`] - dated JSON document of the whole graph

mod csv;
mod json;
mod terminal;

pub use csv::{format_csv_row, print_routes, route_rows, RoutePrintRow};
pub use json::{write_topology, TopologyDocument};
pub use terminal::{format_apply_batches, format_field, print_apply_batches};
