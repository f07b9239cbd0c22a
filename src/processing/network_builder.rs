//! Building isolated networks from address block specs.
//!
//! Every spec is validated up front (address syntax, zone count, capacity,
//! VPN descriptors, pairwise overlap). When anything is wrong the caller
//! gets all errors together and no network is produced.

use super::overlap::{find_overlapping_blocks, log_overlapping_blocks};
use crate::config::{DEFAULT_ZONE_COUNT, SUBNET_MASK};
use crate::error::{Result, TopologyError};
use crate::models::{
    is_valid_name, next_subnet_ipv4, Ipv4, NatGateway, Network, NetworkSpec, ResourceId,
    RouteEntry, RouteTable, RouteTarget, SecurityGroup, Subnet, SubnetType, VpnConnection,
    VpnGateway, Zone,
};
use std::net::Ipv4Addr;

/// A VPN descriptor that passed validation.
#[derive(Debug, Clone)]
struct VpnDescriptor {
    name: String,
    peer_address: Ipv4Addr,
    static_routes: Vec<Ipv4>,
}

#[derive(Debug, Clone)]
struct ValidatedSpec {
    index: usize,
    cidr: Ipv4,
    zones: u8,
    vpn: Vec<VpnDescriptor>,
}

/// Turns [`NetworkSpec`]s into [`Network`]s. Ids are derived from the
/// builder's scope, e.g. scope `peers` yields `peers-net0`, `peers-net1`.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    scope: ResourceId,
}

impl NetworkBuilder {
    pub fn new(scope: impl Into<ResourceId>) -> Self {
        NetworkBuilder {
            scope: scope.into(),
        }
    }

    /// Build one network per block, sharing a zone count.
    pub fn build_blocks(&self, blocks: &[&str], zone_count: Option<i64>) -> Result<Vec<Network>> {
        let specs: Vec<NetworkSpec> = blocks
            .iter()
            .map(|b| NetworkSpec {
                zone_count: zone_count.map(serde_json::Value::from),
                ..NetworkSpec::new(*b)
            })
            .collect();
        self.build(&specs)
    }

    /// Build networks in the same order as `specs`.
    pub fn build(&self, specs: &[NetworkSpec]) -> Result<Vec<Network>> {
        log::info!(
            "#Start NetworkBuilder::build() scope={} specs={}",
            self.scope,
            specs.len()
        );
        let validated = validate_specs(specs)?;
        let networks = validated
            .into_iter()
            .map(|spec| self.build_network(spec))
            .collect::<Result<Vec<Network>>>()?;
        for network in &networks {
            log::info!("built network {network}");
        }
        Ok(networks)
    }

    fn build_network(&self, spec: ValidatedSpec) -> Result<Network> {
        let id = self.scope.child(format!("net{}", spec.index));
        let igw = id.child("igw");
        let zones: Vec<Zone> = (0..spec.zones).map(Zone).collect();
        let carved = carve_subnets(spec.cidr, zones.len() * 2)?;
        let (public_cidrs, private_cidrs) = carved.split_at(zones.len());

        let mut subnets = Vec::with_capacity(carved.len());
        let mut route_tables = Vec::with_capacity(carved.len());
        let mut nat_gateways = Vec::with_capacity(zones.len());

        for (zone, cidr) in zones.iter().zip(public_cidrs) {
            let subnet_id = id.child(format!("public-{zone}"));
            let mut table = RouteTable::new(subnet_id.child("rt"), subnet_id.clone());
            table.append(RouteEntry::new(
                &table.id,
                table.id.child("default"),
                Ipv4::anywhere(),
                RouteTarget::InternetGateway(igw.clone()),
            ))?;
            nat_gateways.push(NatGateway {
                id: id.child(format!("nat-{zone}")),
                zone: *zone,
                subnet_id: subnet_id.clone(),
            });
            subnets.push(Subnet {
                id: subnet_id,
                zone: *zone,
                subnet_type: SubnetType::Public,
                cidr: *cidr,
                route_table_id: table.id.clone(),
            });
            route_tables.push(table);
        }

        let vpn_gateway = build_vpn_gateway(&id, &spec.vpn);

        for ((zone, cidr), nat) in zones.iter().zip(private_cidrs).zip(&nat_gateways) {
            let subnet_id = id.child(format!("private-{zone}"));
            let mut table = RouteTable::new(subnet_id.child("rt"), subnet_id.clone());
            table.append(RouteEntry::new(
                &table.id,
                table.id.child("default"),
                Ipv4::anywhere(),
                RouteTarget::NatGateway(nat.id.clone()),
            ))?;
            if let Some(vgw) = &vpn_gateway {
                table.propagating_gateways.push(vgw.id.clone());
            }
            subnets.push(Subnet {
                id: subnet_id,
                zone: *zone,
                subnet_type: SubnetType::Private,
                cidr: *cidr,
                route_table_id: table.id.clone(),
            });
            route_tables.push(table);
        }

        let security_group = SecurityGroup::default_for(&id);

        Ok(Network::new(
            id,
            spec.cidr,
            spec.zones,
            subnets,
            route_tables,
            security_group,
            igw,
            nat_gateways,
            vpn_gateway,
        ))
    }
}

fn build_vpn_gateway(network_id: &ResourceId, vpn: &[VpnDescriptor]) -> Option<VpnGateway> {
    if vpn.is_empty() {
        return None;
    }
    let connections = vpn
        .iter()
        .map(|d| {
            let id = network_id.child(format!("vpn-{}", d.name));
            VpnConnection {
                customer_gateway_id: id.child("cgw"),
                id,
                name: d.name.clone(),
                peer_address: d.peer_address,
                static_routes: d.static_routes.clone(),
            }
        })
        .collect();
    Some(VpnGateway {
        id: network_id.child("vgw"),
        connections,
    })
}

/// Carve `count` consecutive /27 subnets from the start of `block`.
fn carve_subnets(block: Ipv4, count: usize) -> Result<Vec<Ipv4>> {
    let mut subnets = Vec::with_capacity(count);
    let mut next = Ipv4 {
        addr: block.lo(),
        mask: SUBNET_MASK,
    };
    for _ in 0..count {
        if !block.contains(next.hi()) {
            return Err(TopologyError::Capacity(format!(
                "{block} cannot hold {count} /{SUBNET_MASK} subnets"
            )));
        }
        subnets.push(next);
        if subnets.len() < count {
            next = next_subnet_ipv4(next, None)
                .map_err(|e| TopologyError::Capacity(e.to_string()))?;
        }
    }
    Ok(subnets)
}

fn zone_count(index: usize, raw: Option<&serde_json::Value>) -> Result<u8> {
    let raw = match raw {
        None | Some(serde_json::Value::Null) => DEFAULT_ZONE_COUNT,
        Some(value) => value.as_i64().ok_or_else(|| {
            TopologyError::configuration(format!(
                "network #{index}: zone count must be a positive integer, got {value}"
            ))
        })?,
    };
    if raw < 1 {
        return Err(TopologyError::configuration(format!(
            "network #{index}: zone count must be a positive integer, got {raw}"
        )));
    }
    u8::try_from(raw).map_err(|_| {
        TopologyError::configuration(format!(
            "network #{index}: zone count {raw} is out of range"
        ))
    })
}

fn validate_vpn(index: usize, spec: &NetworkSpec, errors: &mut Vec<TopologyError>) -> Vec<VpnDescriptor> {
    let mut descriptors = Vec::new();
    for (name, conn) in &spec.vpn_connections {
        let mut ok = true;
        if !is_valid_name(name) {
            errors.push(TopologyError::configuration(format!(
                "network #{index}: invalid VPN connection name '{name}'"
            )));
            ok = false;
        }
        let peer_address = match conn.peer_address.trim().parse::<Ipv4Addr>() {
            Ok(addr) => Some(addr),
            Err(_) => {
                errors.push(TopologyError::configuration(format!(
                    "network #{index}: VPN connection '{name}' has invalid peer address '{}'",
                    conn.peer_address
                )));
                None
            }
        };
        let mut static_routes = Vec::new();
        for route in &conn.static_routes {
            match Ipv4::network(route) {
                Ok(cidr) => static_routes.push(cidr),
                Err(e) => {
                    errors.push(TopologyError::configuration(format!(
                        "network #{index}: VPN connection '{name}' static route: {e}"
                    )));
                    ok = false;
                }
            }
        }
        if let (true, Some(peer_address)) = (ok, peer_address) {
            descriptors.push(VpnDescriptor {
                name: name.clone(),
                peer_address,
                static_routes,
            });
        }
    }
    descriptors
}

/// Validate every spec, collecting all problems before failing.
fn validate_specs(specs: &[NetworkSpec]) -> Result<Vec<ValidatedSpec>> {
    let mut errors = Vec::new();
    let mut validated = Vec::new();

    for (index, spec) in specs.iter().enumerate() {
        let cidr = Ipv4::network(&spec.cidr)
            .map_err(|e| {
                TopologyError::configuration(format!("network #{index}: address block: {e}"))
            })
            .map_err(|e| errors.push(e))
            .ok();
        let zones = zone_count(index, spec.zone_count.as_ref())
            .map_err(|e| errors.push(e))
            .ok();
        let vpn = validate_vpn(index, spec, &mut errors);

        if let (Some(cidr), Some(zones)) = (cidr, zones) {
            let needed = u64::from(zones) * 2 * (1u64 << (32 - SUBNET_MASK));
            if cidr.mask > SUBNET_MASK || needed > cidr.size() {
                errors.push(TopologyError::Capacity(format!(
                    "network #{index}: {cidr} cannot hold {} /{SUBNET_MASK} subnets for {zones} zone(s)",
                    u16::from(zones) * 2
                )));
                continue;
            }
            validated.push(ValidatedSpec {
                index,
                cidr,
                zones,
                vpn,
            });
        }
    }

    // overlap is checked on every parseable block, valid or not
    let blocks: Vec<(usize, Ipv4)> = specs
        .iter()
        .enumerate()
        .filter_map(|(i, s)| Ipv4::network(&s.cidr).ok().map(|c| (i, c)))
        .collect();
    let conflicts = find_overlapping_blocks(&blocks);
    log_overlapping_blocks(&conflicts);
    errors.extend(conflicts.iter().map(TopologyError::from));

    if !errors.is_empty() {
        log::warn!("rejected {} network spec(s): {} error(s)", specs.len(), errors.len());
    }
    TopologyError::collect(errors)?;
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VpnConnectionSpec;

    #[test]
    fn test_build_counts_subnets_per_zone() {
        let networks = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"], Some(2))
            .unwrap();
        assert_eq!(networks.len(), 3);
        for network in &networks {
            assert_eq!(network.subnets().len(), 4);
            assert_eq!(network.private_subnets().count(), 2);
            assert_eq!(network.route_tables().len(), 4);
            assert_eq!(network.nat_gateways().len(), 2);
        }
        assert_eq!(networks[1].id().as_str(), "t-net1");
        assert_eq!(networks[1].cidr(), Ipv4::new("10.0.1.0/24").unwrap());
    }

    #[test]
    fn test_default_zone_count() {
        let networks = NetworkBuilder::new("t")
            .build(&[NetworkSpec::new("10.0.0.0/24")])
            .unwrap();
        assert_eq!(networks[0].zone_count(), 2);
    }

    #[test]
    fn test_subnets_carved_public_first() {
        let networks = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24"], Some(2))
            .unwrap();
        let cidrs: Vec<String> = networks[0]
            .subnets()
            .iter()
            .map(|s| format!("{} {} {}", s.subnet_type, s.zone, s.cidr))
            .collect();
        assert_eq!(
            cidrs,
            vec![
                "public a 10.0.0.0/27",
                "public b 10.0.0.32/27",
                "private a 10.0.0.64/27",
                "private b 10.0.0.96/27",
            ]
        );
    }

    #[test]
    fn test_egress_routes() {
        let networks = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24"], Some(1))
            .unwrap();
        let net = &networks[0];
        let public = net.public_subnets().next().unwrap();
        let table = net.route_table(&public.route_table_id).unwrap();
        assert_eq!(
            table.route_to(&Ipv4::anywhere()).unwrap().target,
            RouteTarget::InternetGateway(net.internet_gateway_id().clone())
        );
        let private = net.private_route_tables().next().unwrap();
        assert_eq!(
            private.route_to(&Ipv4::anywhere()).unwrap().target,
            RouteTarget::NatGateway(net.nat_gateways()[0].id.clone())
        );
    }

    #[test]
    fn test_zone_count_must_be_positive() {
        let err = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24"], Some(0))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Configuration(_)));
        let err = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24"], Some(-3))
            .unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_non_integer_zone_count_reported_with_overlap() {
        let specs = vec![
            NetworkSpec {
                zone_count: Some(serde_json::json!(1.5)),
                ..NetworkSpec::new("10.0.0.0/24")
            },
            NetworkSpec {
                zone_count: Some(serde_json::json!("2")),
                ..NetworkSpec::new("10.0.0.0/25")
            },
        ];
        let err = NetworkBuilder::new("t").build(&specs).unwrap_err();
        let leaves = err.flatten();
        assert_eq!(leaves.len(), 3, "{err}");
        assert_eq!(
            leaves
                .iter()
                .filter(|e| matches!(e, TopologyError::Configuration(m) if m.contains("positive integer")))
                .count(),
            2
        );
        assert!(leaves.iter().any(|e| matches!(e, TopologyError::Overlap { .. })));
    }

    #[test]
    fn test_overlap_yields_no_networks() {
        let err = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24", "10.0.0.128/25"], Some(1))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Overlap { .. }));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let specs = vec![
            NetworkSpec::new("10.0.0.0/24").with_zones(0),
            NetworkSpec::new("not-a-cidr"),
            NetworkSpec::new("10.0.0.0/16"),
            NetworkSpec::new("10.1.0.0/26"),
        ];
        let err = NetworkBuilder::new("t").build(&specs).unwrap_err();
        let leaves = err.flatten();
        assert_eq!(leaves.len(), 4, "{err}");
        assert!(leaves.iter().any(|e| matches!(e, TopologyError::Configuration(m) if m.contains("zone count"))));
        assert!(leaves.iter().any(|e| matches!(e, TopologyError::Configuration(m) if m.contains("#1"))));
        assert!(leaves.iter().any(|e| matches!(e, TopologyError::Overlap { .. })));
        assert!(leaves.iter().any(|e| matches!(e, TopologyError::Capacity(_))));
    }

    #[test]
    fn test_host_bits_rejected() {
        let err = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.7/24"], Some(1))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Configuration(_)));
    }

    #[test]
    fn test_capacity_of_small_block() {
        // a /25 holds four /27s: two zones fit, three do not
        assert!(NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/25"], Some(2))
            .is_ok());
        let err = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/25"], Some(3))
            .unwrap_err();
        assert!(matches!(err, TopologyError::Capacity(_)));
    }

    #[test]
    fn test_vpn_connections() {
        let spec = NetworkSpec::new("10.0.3.0/24").with_zones(1).with_vpn(
            "toOnPrem",
            VpnConnectionSpec {
                peer_address: "52.51.199.29".to_string(),
                static_routes: vec!["10.0.2.0/24".to_string()],
            },
        );
        let networks = NetworkBuilder::new("vpn").build(&[spec]).unwrap();
        let net = &networks[0];
        let vgw = net.vpn_gateway().unwrap();
        assert_eq!(vgw.connections.len(), 1);
        let conn = &vgw.connections[0];
        assert_eq!(conn.peer_address, Ipv4Addr::new(52, 51, 199, 29));
        assert_eq!(conn.static_routes, vec![Ipv4::new("10.0.2.0/24").unwrap()]);
        for table in net.private_route_tables() {
            assert_eq!(table.propagating_gateways, vec![vgw.id.clone()]);
            // propagation is not a route entry
            assert_eq!(table.entries().len(), 1);
        }
    }

    #[test]
    fn test_invalid_vpn_descriptor() {
        let spec = NetworkSpec::new("10.0.3.0/24").with_vpn(
            "to on prem",
            VpnConnectionSpec {
                peer_address: "not-an-ip".to_string(),
                static_routes: vec!["10.0.2.1/24".to_string()],
            },
        );
        let err = NetworkBuilder::new("vpn").build(&[spec]).unwrap_err();
        assert_eq!(err.flatten().len(), 3);
    }

    #[test]
    fn test_default_security_group_only_pings() {
        let networks = NetworkBuilder::new("t")
            .build_blocks(&["10.0.0.0/24"], Some(1))
            .unwrap();
        let sg = networks[0].security_group();
        assert_eq!(sg.ingress.len(), 1);
        assert_eq!(sg.ingress[0].source, Ipv4::anywhere());
        assert_eq!(
            networks[0].summary().default_security_group_id,
            sg.id
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(NetworkBuilder::new("t").build(&[]).unwrap().is_empty());
    }
}
