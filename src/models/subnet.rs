//! Zoned subnet data model.

use super::{usable_hosts, Ipv4, ResourceId, Zone};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Reachable from the internet through the network's internet gateway.
    Public,
    /// Egress only, through the zone's NAT gateway.
    Private,
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetType::Public => f.write_str("public"),
            SubnetType::Private => f.write_str("private"),
        }
    }
}

/// A subnet carved out of its network's block, bound to one route table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: ResourceId,
    pub zone: Zone,
    pub subnet_type: SubnetType,
    pub cidr: Ipv4,
    pub route_table_id: ResourceId,
}

impl Subnet {
    pub fn is_private(&self) -> bool {
        self.subnet_type == SubnetType::Private
    }

    pub fn usable_hosts(&self) -> u64 {
        usable_hosts(self.cidr.mask).unwrap_or(0)
    }
}
