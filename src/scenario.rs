//! Scenario files: which networks to build and how to connect them.
//!
//! Each scenario builds its own networks (scoped by the scenario name) and
//! uses at most one connector. All scenarios land in one resource graph.

use crate::error::{Result, TopologyError};
use crate::graph::ResourceGraph;
use crate::models::{
    is_valid_name, ConnectorOutput, GatewayDevice, Ipv4, Network, NetworkSpec, TransitHub,
};
use crate::processing::{
    find_overlapping_blocks, log_overlapping_blocks, verify_reachability, BootConfig,
    GatewayDeviceProvisioner, NetworkBuilder, PeeringConnector, TransitRouter, WiringMode,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectorSpec {
    #[default]
    None,
    Peering,
    #[serde(rename_all = "camelCase")]
    Transit {
        #[serde(default)]
        pairs: Vec<(usize, usize)>,
        #[serde(default)]
        full_mesh: bool,
    },
    GatewayDevice {
        #[serde(default)]
        boot: BootConfig,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub networks: Vec<NetworkSpec>,
    #[serde(default)]
    pub connector: ConnectorSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

/// Everything produced from a scenario file.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub graph: ResourceGraph,
    /// Networks per scenario, in scenario order.
    pub networks: Vec<(String, Vec<Network>)>,
    pub connectors: Vec<ConnectorOutput>,
    pub gateways: Vec<GatewayDevice>,
}

impl Synthesis {
    pub fn all_networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter().flat_map(|(_, nets)| nets.iter())
    }
}

/// Parse a scenario file, reporting the JSON path of any error.
pub fn parse_scenarios(json: &str, path: &str) -> Result<ScenarioFile> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| TopologyError::Scenario {
        path: path.to_string(),
        message: format!("path={} error={}", e.path(), e),
    })
}

pub fn read_scenario_file(path: &Path) -> Result<ScenarioFile> {
    let display = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|e| TopologyError::Scenario {
        path: display.clone(),
        message: e.to_string(),
    })?;
    log::info!("Reading scenarios from {display}");
    parse_scenarios(&json, &display)
}

fn wiring_mode(name: &str, pairs: &[(usize, usize)], full_mesh: bool) -> Result<WiringMode> {
    match (full_mesh, pairs.is_empty()) {
        (true, true) => Ok(WiringMode::FullMesh),
        (false, false) => Ok(WiringMode::Pairs(pairs.to_vec())),
        (true, false) => Err(TopologyError::configuration(format!(
            "scenario {name}: choose either pairs or fullMesh, not both"
        ))),
        (false, true) => Err(TopologyError::configuration(format!(
            "scenario {name}: transit wiring needs explicit pairs or fullMesh"
        ))),
    }
}

fn synthesize_one(scenario: &Scenario, out: &mut Synthesis) -> Result<()> {
    let name = scenario.name.as_str();
    let mut networks = NetworkBuilder::new(name).build(&scenario.networks)?;
    let mut wired: Vec<(usize, usize)> = Vec::new();
    let graph = &mut out.graph;

    match &scenario.connector {
        ConnectorSpec::None => {}
        ConnectorSpec::Peering => {
            if networks.len() != 2 {
                return Err(TopologyError::configuration(format!(
                    "scenario {name}: peering needs exactly 2 networks, got {}",
                    networks.len()
                )));
            }
            let (left, right) = networks.split_at_mut(1);
            let (link, output) = PeeringConnector::connect(&mut left[0], &mut right[0])?;
            graph.add(&link)?;
            out.connectors.push(output);
            wired.push((0, 1));
        }
        ConnectorSpec::Transit { pairs, full_mesh } => {
            let mode = wiring_mode(name, pairs, *full_mesh)?;
            let refs: Vec<&Network> = networks.iter().collect();
            let hub = TransitHub::attach(format!("{name}-tgw"), &refs, graph.exports_mut())?;
            let outputs =
                TransitRouter::new(graph.exports()).wire(&mut networks, &mode, &hub.handle())?;
            wired = match mode {
                WiringMode::Pairs(pairs) => pairs,
                WiringMode::FullMesh => (0..networks.len()).tuple_combinations().collect(),
            };
            graph.add(&hub)?;
            out.connectors.extend(outputs);
        }
        ConnectorSpec::GatewayDevice { boot } => {
            for network in &networks {
                let device =
                    GatewayDeviceProvisioner::provision(network, boot, graph.exports_mut())?;
                graph.add(&device)?;
                out.gateways.push(device);
            }
        }
    }

    for network in &networks {
        graph.add(network)?;
    }
    for (i, j) in wired {
        verify_reachability(&networks[i], &networks[j], graph)?;
    }
    out.networks.push((scenario.name.clone(), networks));
    Ok(())
}

/// Blocks of different scenarios end up in one topology and must be
/// disjoint too. Overlap within a scenario is left to the network builder.
fn cross_scenario_overlaps(scenarios: &[Scenario]) -> Vec<TopologyError> {
    let mut owners = Vec::new();
    let mut blocks = Vec::new();
    for (owner, scenario) in scenarios.iter().enumerate() {
        for spec in &scenario.networks {
            if let Ok(cidr) = Ipv4::network(&spec.cidr) {
                blocks.push((owners.len(), cidr));
                owners.push(owner);
            }
        }
    }
    let conflicts: Vec<_> = find_overlapping_blocks(&blocks)
        .into_iter()
        .filter(|c| owners[c.first_index] != owners[c.second_index])
        .collect();
    log_overlapping_blocks(&conflicts);
    conflicts.iter().map(TopologyError::from).collect()
}

/// Synthesize every scenario into one graph. Scenario failures are
/// collected; the graph is only returned when all succeeded and it
/// validates.
pub fn synthesize(file: &ScenarioFile) -> Result<Synthesis> {
    let mut out = Synthesis::default();
    let mut names = BTreeSet::new();
    let mut errors = cross_scenario_overlaps(&file.scenarios);

    for scenario in &file.scenarios {
        if !is_valid_name(&scenario.name) {
            errors.push(TopologyError::configuration(format!(
                "invalid scenario name '{}'",
                scenario.name
            )));
            continue;
        }
        if !names.insert(scenario.name.as_str()) {
            errors.push(TopologyError::configuration(format!(
                "scenario name '{}' is used more than once",
                scenario.name
            )));
            continue;
        }
        log::info!("#Start scenario {}", scenario.name);
        if let Err(e) = synthesize_one(scenario, &mut out) {
            log::warn!("scenario {} failed: {e}", scenario.name);
            errors.push(e);
        }
    }
    TopologyError::collect(errors)?;
    out.graph.validate()?;
    log::info!(
        "synthesized {} scenario(s), {} resources",
        file.scenarios.len(),
        out.graph.len()
    );
    Ok(out)
}
