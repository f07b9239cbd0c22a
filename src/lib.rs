// cargo watch -x 'fmt' -x 'run'  // 'run -- scenarios/ping_me.json'

pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod output;
pub mod processing;
pub mod scenario;

pub use error::{Result, TopologyError};
pub use graph::{Applier, ResourceGraph, ResourceKind, Synthesize};
pub use scenario::{read_scenario_file, synthesize, Synthesis};
