//! Hub-and-spoke connectivity through a shared transit hub.
//!
//! Creating the hub and attaching networks is separate from wiring routes,
//! so many networks can share a hub while only selected pairs are routed.
//! The hub id travels to the router as a [`TransitHubHandle`], either
//! straight from [`TransitHub::attach`] or imported by export name in a
//! later phase.

use super::routes::{connect_private_tables, SideDependencies};
use crate::error::{Result, TopologyError};
use crate::graph::{Exports, Token};
use crate::models::{
    ConnectorOutput, Network, ResourceId, RouteTarget, TransitAttachment, TransitHub,
};
use crate::processing::overlap::find_overlapping_blocks;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Typed reference to a created hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitHubHandle {
    pub hub_id: ResourceId,
    pub export_name: String,
    /// network id -> attachment id, when known to this phase.
    pub attachments: BTreeMap<ResourceId, ResourceId>,
}

impl TransitHubHandle {
    /// Re-create a handle from a published hub id, e.g. in a separate
    /// deployment phase. Attachments are unknown to such a handle.
    pub fn import(exports: &Exports, export_name: &str) -> Result<Self> {
        let import = exports.consume(export_name)?;
        match import.value {
            Token::Ref { resource } => Ok(TransitHubHandle {
                hub_id: resource,
                export_name: import.name,
                attachments: BTreeMap::new(),
            }),
            other => Err(TopologyError::unresolved(
                export_name,
                format!("expected a hub id, found {other}"),
            )),
        }
    }
}

impl TransitHub {
    /// Create a hub and attach every network's private subnets to it. The
    /// hub id is published as `<hub id>-id`.
    pub fn attach(
        hub_id: impl Into<ResourceId>,
        networks: &[&Network],
        exports: &mut Exports,
    ) -> Result<TransitHub> {
        let hub_id = hub_id.into();
        log::info!(
            "#Start TransitHub::attach() hub={} networks={}",
            hub_id,
            networks.len()
        );
        if networks.len() < 2 {
            return Err(TopologyError::configuration(format!(
                "transit hub {hub_id} needs at least 2 networks, got {}",
                networks.len()
            )));
        }

        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();
        for network in networks {
            if !seen.insert(network.id()) {
                errors.push(TopologyError::configuration(format!(
                    "network {} attached to {hub_id} more than once",
                    network.id()
                )));
            }
        }
        let blocks: Vec<_> = networks.iter().map(|n| n.cidr()).enumerate().collect();
        errors.extend(find_overlapping_blocks(&blocks).iter().map(TopologyError::from));
        TopologyError::collect(errors)?;

        let attachments = networks
            .iter()
            .map(|network| TransitAttachment {
                id: hub_id.child(format!("attach-{}", network.id())),
                hub_id: hub_id.clone(),
                network_id: network.id().clone(),
                subnet_ids: network.private_subnets().map(|s| s.id.clone()).collect(),
            })
            .collect();

        let export_name = format!("{hub_id}-id");
        exports.publish(
            export_name.clone(),
            Token::Ref {
                resource: hub_id.clone(),
            },
        )?;

        Ok(TransitHub {
            id: hub_id,
            attachments,
            export_name,
        })
    }

    pub fn handle(&self) -> TransitHubHandle {
        TransitHubHandle {
            hub_id: self.id.clone(),
            export_name: self.export_name.clone(),
            attachments: self
                .attachments
                .iter()
                .map(|a| (a.network_id.clone(), a.id.clone()))
                .collect(),
        }
    }
}

/// Which attached networks get routes to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringMode {
    /// Explicit pairs of indices into the network list.
    Pairs(Vec<(usize, usize)>),
    /// Every pair. Opt in only; grows quadratically.
    FullMesh,
}

pub struct TransitRouter<'e> {
    exports: &'e Exports,
}

impl<'e> TransitRouter<'e> {
    pub fn new(exports: &'e Exports) -> Self {
        TransitRouter { exports }
    }

    /// The hub must have been published under the handle's export name.
    fn resolve(&self, hub: &TransitHubHandle) -> Result<ResourceId> {
        let import = self.exports.consume(&hub.export_name)?;
        if import.producer() != &hub.hub_id {
            return Err(TopologyError::unresolved(
                hub.export_name.as_str(),
                format!("export names {}, not hub {}", import.producer(), hub.hub_id),
            ));
        }
        Ok(import.producer().clone())
    }

    fn attachment(hub: &TransitHubHandle, network: &Network) -> Result<Vec<ResourceId>> {
        if hub.attachments.is_empty() {
            return Ok(Vec::new());
        }
        hub.attachments
            .get(network.id())
            .map(|id| vec![id.clone()])
            .ok_or_else(|| {
                TopologyError::configuration(format!(
                    "network {} is not attached to hub {}",
                    network.id(),
                    hub.hub_id
                ))
            })
    }

    /// Route `a` and `b` to each other through the hub.
    pub fn add_routes(
        &self,
        a: &mut Network,
        b: &mut Network,
        hub: &TransitHubHandle,
    ) -> Result<ConnectorOutput> {
        let hub_id = self.resolve(hub)?;
        let deps = SideDependencies {
            a: Self::attachment(hub, a)?,
            b: Self::attachment(hub, b)?,
        };
        let routes = connect_private_tables(a, b, &RouteTarget::TransitHub(hub_id.clone()), &deps)?;
        log::info!(
            "hub {} routes {} <-> {}: {} route(s)",
            hub_id,
            a.id(),
            b.id(),
            routes.len()
        );
        Ok(ConnectorOutput {
            connector_id: hub_id,
            routes,
        })
    }

    /// Wire the selected pairs of `networks`. Pairs are wired one at a time,
    /// each pair either fully or not at all; all failures are returned
    /// together.
    pub fn wire(
        &self,
        networks: &mut [Network],
        mode: &WiringMode,
        hub: &TransitHubHandle,
    ) -> Result<Vec<ConnectorOutput>> {
        let pairs = resolve_pairs(networks.len(), mode)?;
        let mut outputs = Vec::with_capacity(pairs.len());
        let mut errors = Vec::new();
        for (i, j) in pairs {
            let (a, b) = pair_mut(networks, i, j);
            match self.add_routes(a, b, hub) {
                Ok(output) => outputs.push(output),
                Err(e) => errors.push(e),
            }
        }
        TopologyError::collect(errors)?;
        Ok(outputs)
    }
}

fn resolve_pairs(len: usize, mode: &WiringMode) -> Result<Vec<(usize, usize)>> {
    let pairs = match mode {
        WiringMode::FullMesh => return Ok((0..len).tuple_combinations().collect()),
        WiringMode::Pairs(pairs) => pairs,
    };
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();
    for &(i, j) in pairs {
        if i >= len || j >= len {
            errors.push(TopologyError::configuration(format!(
                "pair ({i}, {j}) is out of range for {len} networks"
            )));
        } else if i == j {
            errors.push(TopologyError::configuration(format!(
                "pair ({i}, {j}) connects a network to itself"
            )));
        } else if !seen.insert((i.min(j), i.max(j))) {
            errors.push(TopologyError::configuration(format!(
                "pair ({i}, {j}) is listed more than once"
            )));
        }
    }
    TopologyError::collect(errors)?;
    Ok(pairs.clone())
}

/// Two distinct mutable elements of a slice. `i != j` and both in range.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
