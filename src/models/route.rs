//! Route tables and the entries connectors append to them.

use super::{Ipv4, ResourceId};
use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Where a route entry forwards traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RouteTarget {
    InternetGateway(ResourceId),
    NatGateway(ResourceId),
    PeeringLink(ResourceId),
    TransitHub(ResourceId),
}

impl RouteTarget {
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            RouteTarget::InternetGateway(id)
            | RouteTarget::NatGateway(id)
            | RouteTarget::PeeringLink(id)
            | RouteTarget::TransitHub(id) => id,
        }
    }

    /// Egress routes are fixed at build time and never written by connectors.
    pub fn is_egress(&self) -> bool {
        matches!(
            self,
            RouteTarget::InternetGateway(_) | RouteTarget::NatGateway(_)
        )
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::InternetGateway(id) => write!(f, "internet_gateway:{id}"),
            RouteTarget::NatGateway(id) => write!(f, "nat_gateway:{id}"),
            RouteTarget::PeeringLink(id) => write!(f, "peering_link:{id}"),
            RouteTarget::TransitHub(id) => write!(f, "transit_hub:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub id: ResourceId,
    pub table_id: ResourceId,
    pub destination: Ipv4,
    pub target: RouteTarget,
    /// Resources that must exist before this entry is applied. Always
    /// contains the table and the target.
    pub depends_on: BTreeSet<ResourceId>,
}

impl RouteEntry {
    pub fn new(table_id: &ResourceId, id: ResourceId, destination: Ipv4, target: RouteTarget) -> Self {
        let depends_on = BTreeSet::from([table_id.clone(), target.resource_id().clone()]);
        RouteEntry {
            id,
            table_id: table_id.clone(),
            destination,
            target,
            depends_on,
        }
    }

    /// Add a further ordering edge, e.g. on a hub attachment.
    pub fn depends_on(mut self, id: ResourceId) -> Self {
        self.depends_on.insert(id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: ResourceId,
    pub subnet_id: ResourceId,
    entries: Vec<RouteEntry>,
    /// Gateways whose learned routes are propagated into this table.
    pub propagating_gateways: Vec<ResourceId>,
}

impl RouteTable {
    pub fn new(id: ResourceId, subnet_id: ResourceId) -> Self {
        RouteTable {
            id,
            subnet_id,
            entries: Vec::new(),
            propagating_gateways: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn route_to(&self, destination: &Ipv4) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| &e.destination == destination)
    }

    /// Check that `entry` could be appended without clashing with an
    /// existing destination.
    pub fn check(&self, entry: &RouteEntry) -> Result<()> {
        match self.route_to(&entry.destination) {
            Some(existing) => Err(TopologyError::DuplicateRoute {
                table: self.id.clone(),
                destination: entry.destination,
                existing: existing.target.clone(),
                requested: entry.target.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Append an entry. Entries are never replaced or removed.
    pub fn append(&mut self, entry: RouteEntry) -> Result<()> {
        self.check(&entry)?;
        log::debug!(
            "route table {} += {} -> {}",
            self.id,
            entry.destination,
            entry.target
        );
        self.entries.push(entry);
        Ok(())
    }
}
