//! Flattening built components into graph nodes.

use crate::models::{GatewayDevice, Network, PeeringLink, ResourceId, TransitHub};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    InternetGateway,
    Subnet,
    RouteTable,
    Route,
    NatGateway,
    SecurityGroup,
    IngressRule,
    VpnGateway,
    CustomerGateway,
    VpnConnection,
    VpnConnectionRoute,
    PeeringLink,
    TransitHub,
    TransitAttachment,
    GatewayDevice,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // same spelling as the serialized form
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&name)
    }
}

/// One node of the resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    /// Must be applied before this resource.
    pub depends_on: BTreeSet<ResourceId>,
    /// Other resources whose identifiers or attributes this one consumes.
    /// Every reference needs a matching dependency edge.
    pub references: BTreeSet<ResourceId>,
}

impl Resource {
    pub fn new(id: ResourceId, kind: ResourceKind) -> Self {
        Resource {
            id,
            kind,
            depends_on: BTreeSet::new(),
            references: BTreeSet::new(),
        }
    }

    pub fn after(mut self, id: &ResourceId) -> Self {
        self.depends_on.insert(id.clone());
        self
    }

    /// Consume `id` and depend on it.
    pub fn referencing(mut self, id: &ResourceId) -> Self {
        self.references.insert(id.clone());
        self.after(id)
    }
}

/// Anything that contributes nodes to a resource graph.
pub trait Synthesize {
    fn resources(&self) -> Vec<Resource>;
}

impl Synthesize for Network {
    fn resources(&self) -> Vec<Resource> {
        let net = self.id();
        let igw = self.internet_gateway_id();
        let mut out = vec![
            Resource::new(net.clone(), ResourceKind::Network),
            Resource::new(igw.clone(), ResourceKind::InternetGateway).referencing(net),
        ];

        for subnet in self.subnets() {
            out.push(Resource::new(subnet.id.clone(), ResourceKind::Subnet).referencing(net));
        }
        for nat in self.nat_gateways() {
            out.push(
                Resource::new(nat.id.clone(), ResourceKind::NatGateway)
                    .referencing(&nat.subnet_id)
                    .after(igw),
            );
        }
        for table in self.route_tables() {
            out.push(
                Resource::new(table.id.clone(), ResourceKind::RouteTable)
                    .referencing(net)
                    .referencing(&table.subnet_id),
            );
            for entry in table.entries() {
                let mut route = Resource::new(entry.id.clone(), ResourceKind::Route)
                    .referencing(&entry.table_id)
                    .referencing(entry.target.resource_id());
                route.depends_on.extend(entry.depends_on.iter().cloned());
                out.push(route);
            }
        }

        let sg = self.security_group();
        out.push(Resource::new(sg.id.clone(), ResourceKind::SecurityGroup).referencing(net));
        for rule in &sg.ingress {
            out.push(Resource::new(rule.id.clone(), ResourceKind::IngressRule).referencing(&sg.id));
        }

        if let Some(vgw) = self.vpn_gateway() {
            let mut gateway = Resource::new(vgw.id.clone(), ResourceKind::VpnGateway).referencing(net);
            // propagation is configured on the tables, so they come first
            for table in self.private_route_tables() {
                gateway = gateway.referencing(&table.id);
            }
            out.push(gateway);
            for conn in &vgw.connections {
                out.push(Resource::new(
                    conn.customer_gateway_id.clone(),
                    ResourceKind::CustomerGateway,
                ));
                out.push(
                    Resource::new(conn.id.clone(), ResourceKind::VpnConnection)
                        .referencing(&vgw.id)
                        .referencing(&conn.customer_gateway_id),
                );
                for (i, _) in conn.static_routes.iter().enumerate() {
                    out.push(
                        Resource::new(conn.id.child(format!("route{i}")), ResourceKind::VpnConnectionRoute)
                            .referencing(&conn.id),
                    );
                }
            }
        }
        out
    }
}

impl Synthesize for PeeringLink {
    fn resources(&self) -> Vec<Resource> {
        vec![Resource::new(self.id.clone(), ResourceKind::PeeringLink)
            .referencing(&self.network_a)
            .referencing(&self.network_b)]
    }
}

impl Synthesize for TransitHub {
    fn resources(&self) -> Vec<Resource> {
        let mut out = vec![Resource::new(self.id.clone(), ResourceKind::TransitHub)];
        for attachment in &self.attachments {
            let mut node = Resource::new(attachment.id.clone(), ResourceKind::TransitAttachment)
                .referencing(&attachment.hub_id)
                .referencing(&attachment.network_id);
            for subnet in &attachment.subnet_ids {
                node = node.referencing(subnet);
            }
            out.push(node);
        }
        out
    }
}

impl Synthesize for GatewayDevice {
    fn resources(&self) -> Vec<Resource> {
        vec![Resource::new(self.instance_id.clone(), ResourceKind::GatewayDevice)
            .referencing(&self.network_id)
            .referencing(&self.subnet_id)]
    }
}
