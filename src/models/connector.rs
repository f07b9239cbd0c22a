//! Interconnect resources and connector outputs.

use super::{Ipv4, ResourceId, RouteEntry, RouteTarget};
use serde::{Deserialize, Serialize};

/// Direct connection between two networks' address spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeringLink {
    pub id: ResourceId,
    pub network_a: ResourceId,
    pub network_b: ResourceId,
}

impl PeeringLink {
    /// Links are symmetric: (A, B) and (B, A) name the same pair.
    pub fn joins(&self, x: &ResourceId, y: &ResourceId) -> bool {
        (&self.network_a == x && &self.network_b == y)
            || (&self.network_a == y && &self.network_b == x)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitAttachment {
    pub id: ResourceId,
    pub hub_id: ResourceId,
    pub network_id: ResourceId,
    pub subnet_ids: Vec<ResourceId>,
}

/// Shared routing hub many networks attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitHub {
    pub id: ResourceId,
    pub attachments: Vec<TransitAttachment>,
    /// Name under which the hub id is published.
    pub export_name: String,
}

/// VPN gateway endpoint living in a network's public subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayDevice {
    pub instance_id: ResourceId,
    pub network_id: ResourceId,
    pub subnet_id: ResourceId,
    /// Always false: the device forwards traffic not addressed to itself.
    pub source_dest_check: bool,
    pub machine_image: String,
    pub instance_type: String,
    pub user_data: Vec<String>,
    /// Name under which the public address is published.
    pub public_address_export: String,
}

/// One route created by a connector, as (table, destination, target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRoute {
    pub table_id: ResourceId,
    pub destination: Ipv4,
    pub target: RouteTarget,
}

impl From<&RouteEntry> for CreatedRoute {
    fn from(entry: &RouteEntry) -> Self {
        CreatedRoute {
            table_id: entry.table_id.clone(),
            destination: entry.destination,
            target: entry.target.clone(),
        }
    }
}

/// Result of wiring routes through a peering link or a transit hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorOutput {
    /// Link or hub the routes point at.
    pub connector_id: ResourceId,
    pub routes: Vec<RouteEntry>,
}

impl ConnectorOutput {
    pub fn created(&self) -> Vec<CreatedRoute> {
        self.routes.iter().map(CreatedRoute::from).collect()
    }
}
