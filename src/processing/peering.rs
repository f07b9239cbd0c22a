//! Direct peering between exactly two networks.

use super::routes::{connect_private_tables, SideDependencies};
use crate::error::Result;
use crate::models::{ConnectorOutput, Network, PeeringLink, RouteTarget};

pub struct PeeringConnector;

impl PeeringConnector {
    /// Create one link between `a` and `b` and route each side's private
    /// tables to the other's block over it. Public routing and security
    /// rules are left alone.
    pub fn connect(a: &mut Network, b: &mut Network) -> Result<(PeeringLink, ConnectorOutput)> {
        log::info!("#Start PeeringConnector::connect() {} <-> {}", a.id(), b.id());
        let link = PeeringLink {
            id: a.id().child(format!("peer-{}", b.id())),
            network_a: a.id().clone(),
            network_b: b.id().clone(),
        };
        let target = RouteTarget::PeeringLink(link.id.clone());
        let routes = connect_private_tables(a, b, &target, &SideDependencies::default())?;
        log::info!("peering {} created {} route(s)", link.id, routes.len());
        Ok((
            link.clone(),
            ConnectorOutput {
                connector_id: link.id,
                routes,
            },
        ))
    }
}
