//! Connectivity check between two connected networks.

use crate::error::{Result, TopologyError};
use crate::graph::ResourceGraph;
use crate::models::Network;

fn one_way(from: &Network, to: &Network, graph: &ResourceGraph) -> Option<TopologyError> {
    let resolves = from
        .private_route_tables()
        .filter_map(|t| t.route_to(&to.cidr()))
        .any(|entry| {
            let target = entry.target.resource_id();
            graph.contains(target)
                && graph
                    .get(&entry.id)
                    .is_some_and(|route| route.depends_on.contains(target))
        });
    if resolves {
        None
    } else {
        Some(TopologyError::unresolved(
            to.id().as_str(),
            format!(
                "no private route from {} to {} resolves to a resource in the graph",
                from.id(),
                to.cidr()
            ),
        ))
    }
}

/// Both sides must have a private route to the other's block whose target
/// exists in `graph` and is a declared dependency of the route.
pub fn verify_reachability(a: &Network, b: &Network, graph: &ResourceGraph) -> Result<()> {
    let errors = [one_way(a, b, graph), one_way(b, a, graph)]
        .into_iter()
        .flatten()
        .collect();
    TopologyError::collect(errors)
}
