//! Topology and route synthesis.
//!
//! - [`network_builder`] - networks with zoned public/private subnets
//! - [`peering`] - direct link between two networks
//! - [`transit`] - shared hub plus selective route wiring
//! - [`gateway`] - VPN gateway device in a public subnet
//! - [`overlap`] - address block collision detection
//! - [`reachability`] - connectivity check against the resource graph

mod gateway;
mod network_builder;
mod overlap;
mod peering;
mod reachability;
mod routes;
mod transit;

// Re-export public functions
pub use gateway::{vpn_connection_spec, BootConfig, GatewayDeviceProvisioner, PUBLIC_IP_ATTRIBUTE};
pub use network_builder::NetworkBuilder;
pub use overlap::{find_overlapping_blocks, log_overlapping_blocks, OverlapConflict};
pub use peering::PeeringConnector;
pub use reachability::verify_reachability;
pub use transit::{TransitHubHandle, TransitRouter, WiringMode};
