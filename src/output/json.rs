//! JSON document of a synthesized topology.

use crate::error::{Result, TopologyError};
use crate::graph::ResourceGraph;
use crate::models::{NetworkSummary, ResourceId};
use crate::scenario::Synthesis;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct TopologyDocument<'a> {
    pub generated_at: String,
    pub networks: Vec<NetworkSummary>,
    pub apply_batches: Vec<Vec<ResourceId>>,
    pub graph: &'a ResourceGraph,
}

impl<'a> TopologyDocument<'a> {
    pub fn new(synthesis: &'a Synthesis, generated_at: String) -> Result<Self> {
        Ok(TopologyDocument {
            generated_at,
            networks: synthesis.all_networks().map(|n| n.summary()).collect(),
            apply_batches: synthesis.graph.apply_batches()?,
            graph: &synthesis.graph,
        })
    }
}

/// Write the topology to `<dir>/topology_<date>.json` and return the path.
pub fn write_topology(synthesis: &Synthesis, dir: &Path) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let file = dir.join(format!("topology_{}.json", now.format("%Y-%m-%d")));
    let display = file.display().to_string();
    let output_error = |message: String| TopologyError::Output {
        path: display.clone(),
        message,
    };

    let document = TopologyDocument::new(synthesis, now.to_rfc3339())?;
    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| output_error(format!("Error serializing JSON: {e}")))?;
    std::fs::create_dir_all(dir).map_err(|e| output_error(e.to_string()))?;
    log::warn!("Writing topology to file: {display}");
    std::fs::write(&file, json).map_err(|e| output_error(e.to_string()))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{read_scenario_file, synthesize};

    #[test]
    fn test_write_topology() {
        let file = read_scenario_file(Path::new("src/tests/test_data/peering_pair.json")).unwrap();
        let synthesis = synthesize(&file).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = write_topology(&synthesis, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("topology_") && name.ends_with(".json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["networks"].as_array().unwrap().len(), 2);
        assert!(!json["apply_batches"].as_array().unwrap().is_empty());
        assert_eq!(
            json["graph"]["resources"].as_object().unwrap().len(),
            synthesis.graph.len()
        );
    }
}
