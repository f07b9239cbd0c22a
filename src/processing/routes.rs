//! Bidirectional private-subnet route injection shared by connectors.

use crate::error::{Result, TopologyError};
use crate::models::{Network, ResourceId, RouteEntry, RouteTarget};

/// Extra ordering edges for the routes of one side.
#[derive(Debug, Clone, Default)]
pub struct SideDependencies {
    pub a: Vec<ResourceId>,
    pub b: Vec<ResourceId>,
}

fn plan_side(from: &Network, to: &Network, target: &RouteTarget, extra: &[ResourceId]) -> Vec<RouteEntry> {
    from.private_route_tables()
        .map(|table| {
            let entry = RouteEntry::new(
                &table.id,
                table.id.child(format!("to-{}", to.id())),
                to.cidr(),
                target.clone(),
            );
            extra.iter().cloned().fold(entry, RouteEntry::depends_on)
        })
        .collect()
}

/// Route every private table of `a` to `b.cidr` and vice versa, all via
/// `target`. Either every route is appended or none: clashes in any table
/// are collected and returned together.
pub fn connect_private_tables(
    a: &mut Network,
    b: &mut Network,
    target: &RouteTarget,
    deps: &SideDependencies,
) -> Result<Vec<RouteEntry>> {
    if a.id() == b.id() {
        return Err(TopologyError::configuration(format!(
            "cannot connect network {} to itself",
            a.id()
        )));
    }
    if a.cidr().overlaps(&b.cidr()) {
        return Err(TopologyError::Overlap {
            first: a.cidr(),
            second: b.cidr(),
        });
    }

    let a_routes = plan_side(a, b, target, &deps.a);
    let b_routes = plan_side(b, a, target, &deps.b);

    let mut errors = Vec::new();
    for (network, routes) in [(&*a, &a_routes), (&*b, &b_routes)] {
        for entry in routes {
            if let Some(table) = network.route_table(&entry.table_id) {
                if let Err(e) = table.check(entry) {
                    errors.push(e);
                }
            }
        }
    }
    if !errors.is_empty() {
        log::warn!(
            "refusing to route {} <-> {} via {}: {} clash(es)",
            a.id(),
            b.id(),
            target,
            errors.len()
        );
    }
    TopologyError::collect(errors)?;

    for (network, routes) in [(a, &a_routes), (b, &b_routes)] {
        for table in network.private_route_tables_mut() {
            let table_id = table.id.clone();
            for entry in routes.iter().filter(|e| e.table_id == table_id) {
                table.append(entry.clone())?;
            }
        }
    }

    Ok(a_routes.into_iter().chain(b_routes).collect())
}
