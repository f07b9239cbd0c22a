//! Domain models for topology synthesis.
//!
//! - [`Ipv4`] - address blocks in CIDR notation
//! - [`Network`], [`Subnet`], [`RouteTable`], [`SecurityGroup`] - what the
//!   network builder produces
//! - [`PeeringLink`], [`TransitHub`], [`GatewayDevice`] - what connectors produce

mod connector;
mod ids;
mod ipv4;
mod network;
mod route;
mod security;
mod subnet;

// Re-export public types
pub use connector::{
    ConnectorOutput, CreatedRoute, GatewayDevice, PeeringLink, TransitAttachment, TransitHub,
};
pub use ids::{is_valid_name, ResourceId, Zone};
pub use ipv4::{
    broadcast_addr, cut_addr, get_cidr_mask, ip_after_subnet, next_subnet_ipv4, usable_hosts,
    CidrError, Ipv4, MAX_LENGTH,
};
pub use network::{
    NatGateway, Network, NetworkSpec, NetworkSummary, SubnetSummary, VpnConnection,
    VpnConnectionSpec, VpnGateway,
};
pub use route::{RouteEntry, RouteTable, RouteTarget};
pub use security::{IngressProtocol, IngressRule, SecurityGroup};
pub use subnet::{Subnet, SubnetType};
