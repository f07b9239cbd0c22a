//! Overlapping address block detection.
//!
//! Every pair of blocks in one topology must be disjoint; all collisions
//! are reported, not just the first.

use crate::error::TopologyError;
use crate::models::Ipv4;
use itertools::Itertools;

/// Two input blocks that share addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    pub first_index: usize,
    pub second_index: usize,
    pub first: Ipv4,
    pub second: Ipv4,
}

impl From<&OverlapConflict> for TopologyError {
    fn from(conflict: &OverlapConflict) -> Self {
        TopologyError::Overlap {
            first: conflict.first,
            second: conflict.second,
        }
    }
}

/// Find every overlapping pair, in input order.
///
/// # Arguments
/// * `blocks` - `(input index, block)` pairs; the index is carried into the
///   conflict so skipped (unparseable) inputs keep their position
pub fn find_overlapping_blocks(blocks: &[(usize, Ipv4)]) -> Vec<OverlapConflict> {
    blocks
        .iter()
        .tuple_combinations()
        .filter(|((_, a), (_, b))| a.overlaps(b))
        .map(|((i, a), (j, b))| OverlapConflict {
            first_index: *i,
            second_index: *j,
            first: *a,
            second: *b,
        })
        .collect()
}

/// Log overlapping blocks as warnings.
pub fn log_overlapping_blocks(conflicts: &[OverlapConflict]) {
    if conflicts.is_empty() {
        log::debug!("No overlapping address blocks found.");
        return;
    }

    log::warn!("Found {} overlapping address block pair(s):", conflicts.len());
    for conflict in conflicts {
        log::warn!(
            "  - block #{} {} overlaps block #{} {}",
            conflict.first_index,
            conflict.first,
            conflict.second_index,
            conflict.second
        );
    }
}
