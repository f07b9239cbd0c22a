//! Isolated virtual network data model.

use super::{Ipv4, ResourceId, RouteTable, SecurityGroup, Subnet, SubnetType, Zone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Site-to-site VPN descriptor as written in a network spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnConnectionSpec {
    /// Public address of the remote gateway device.
    pub peer_address: String,
    /// Remote address ranges reached over the tunnel.
    #[serde(default)]
    pub static_routes: Vec<String>,
}

/// Input description of one network. Consumed once by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub cidr: String,
    /// Kept as raw JSON so a non-integer is reported by validation along
    /// with every other problem, not as a parse failure.
    #[serde(default)]
    pub zone_count: Option<serde_json::Value>,
    #[serde(default)]
    pub vpn_connections: BTreeMap<String, VpnConnectionSpec>,
}

impl NetworkSpec {
    pub fn new(cidr: impl Into<String>) -> Self {
        NetworkSpec {
            cidr: cidr.into(),
            ..Default::default()
        }
    }

    pub fn with_zones(mut self, zone_count: i64) -> Self {
        self.zone_count = Some(zone_count.into());
        self
    }

    pub fn with_vpn(mut self, name: impl Into<String>, connection: VpnConnectionSpec) -> Self {
        self.vpn_connections.insert(name.into(), connection);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatGateway {
    pub id: ResourceId,
    pub zone: Zone,
    /// Public subnet hosting the gateway.
    pub subnet_id: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnConnection {
    pub id: ResourceId,
    pub name: String,
    pub customer_gateway_id: ResourceId,
    pub peer_address: Ipv4Addr,
    pub static_routes: Vec<Ipv4>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnGateway {
    pub id: ResourceId,
    pub connections: Vec<VpnConnection>,
}

/// A built network. Only its private route tables change after creation,
/// and only by appending connector routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    id: ResourceId,
    cidr: Ipv4,
    zone_count: u8,
    subnets: Vec<Subnet>,
    route_tables: Vec<RouteTable>,
    security_group: SecurityGroup,
    internet_gateway_id: ResourceId,
    nat_gateways: Vec<NatGateway>,
    vpn_gateway: Option<VpnGateway>,
}

/// Per-subnet row of a [`NetworkSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetSummary {
    pub subnet_id: ResourceId,
    pub zone: Zone,
    pub subnet_type: SubnetType,
    pub route_table_id: ResourceId,
}

/// What a network exposes to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub id: ResourceId,
    pub cidr: Ipv4,
    pub subnets: Vec<SubnetSummary>,
    pub default_security_group_id: ResourceId,
}

impl Network {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ResourceId,
        cidr: Ipv4,
        zone_count: u8,
        subnets: Vec<Subnet>,
        route_tables: Vec<RouteTable>,
        security_group: SecurityGroup,
        internet_gateway_id: ResourceId,
        nat_gateways: Vec<NatGateway>,
        vpn_gateway: Option<VpnGateway>,
    ) -> Self {
        Network {
            id,
            cidr,
            zone_count,
            subnets,
            route_tables,
            security_group,
            internet_gateway_id,
            nat_gateways,
            vpn_gateway,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn cidr(&self) -> Ipv4 {
        self.cidr
    }

    pub fn zone_count(&self) -> u8 {
        self.zone_count
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn private_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| s.is_private())
    }

    pub fn public_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| !s.is_private())
    }

    pub fn route_tables(&self) -> &[RouteTable] {
        &self.route_tables
    }

    pub fn route_table(&self, id: &ResourceId) -> Option<&RouteTable> {
        self.route_tables.iter().find(|t| &t.id == id)
    }

    fn is_private_table(&self, table: &RouteTable) -> bool {
        self.private_subnets()
            .any(|s| s.route_table_id == table.id)
    }

    pub fn private_route_tables(&self) -> impl Iterator<Item = &RouteTable> {
        self.route_tables
            .iter()
            .filter(|t| self.is_private_table(t))
    }

    pub fn private_route_table_ids(&self) -> Vec<ResourceId> {
        self.private_route_tables().map(|t| t.id.clone()).collect()
    }

    /// Mutable access for connectors. Public tables are never handed out.
    pub(crate) fn private_route_tables_mut(&mut self) -> Vec<&mut RouteTable> {
        let private: Vec<ResourceId> = self.private_route_table_ids();
        self.route_tables
            .iter_mut()
            .filter(|t| private.contains(&t.id))
            .collect()
    }

    pub fn security_group(&self) -> &SecurityGroup {
        &self.security_group
    }

    pub fn internet_gateway_id(&self) -> &ResourceId {
        &self.internet_gateway_id
    }

    pub fn nat_gateways(&self) -> &[NatGateway] {
        &self.nat_gateways
    }

    pub fn vpn_gateway(&self) -> Option<&VpnGateway> {
        self.vpn_gateway.as_ref()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            id: self.id.clone(),
            cidr: self.cidr,
            subnets: self
                .subnets
                .iter()
                .map(|s| SubnetSummary {
                    subnet_id: s.id.clone(),
                    zone: s.zone,
                    subnet_type: s.subnet_type,
                    route_table_id: s.route_table_id.clone(),
                })
                .collect(),
            default_security_group_id: self.security_group.id.clone(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} subnets, {} zones)",
            self.id,
            self.cidr,
            self.subnets.len(),
            self.zone_count
        )
    }
}
