//! Error taxonomy for topology synthesis.
//!
//! Validation that can be computed locally is collected into a
//! [`TopologyError::Batch`] so callers see every violation at once.

use crate::models::{Ipv4, ResourceId, RouteTarget};
use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopologyError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Malformed or missing required input.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("address block {first} overlaps {second}")]
    Overlap { first: Ipv4, second: Ipv4 },

    #[error("route table {table} already routes {destination} via {existing}, refusing {requested}")]
    DuplicateRoute {
        table: ResourceId,
        destination: Ipv4,
        existing: RouteTarget,
        requested: RouteTarget,
    },

    /// A value was consumed before (or without) its producer.
    #[error("unresolved reference '{name}': {reason}")]
    UnresolvedReference { name: String, reason: String },

    #[error("capacity exceeded: {0}")]
    Capacity(String),

    #[error("scenario file {path}: {message}")]
    Scenario { path: String, message: String },

    #[error("writing {path}: {message}")]
    Output { path: String, message: String },

    #[error("{} errors: {}", .0.len(), .0.iter().join("; "))]
    Batch(Vec<TopologyError>),
}

impl TopologyError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        TopologyError::Configuration(msg.into())
    }

    pub fn unresolved(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TopologyError::UnresolvedReference {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Turn collected errors into a result: nothing collected is success,
    /// a single error is returned as is, more become a batch.
    pub fn collect(mut errors: Vec<TopologyError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(TopologyError::Batch(errors)),
        }
    }

    /// All leaf errors, with batches flattened.
    pub fn flatten(&self) -> Vec<&TopologyError> {
        match self {
            TopologyError::Batch(errors) => errors.iter().flat_map(|e| e.flatten()).collect(),
            other => vec![other],
        }
    }
}
