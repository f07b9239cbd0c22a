//! Resource graph with explicit dependency edges.
//!
//! - [`exports`] - named publish/consume of cross-component values
//! - [`resource`] - graph nodes and the [`Synthesize`] seam
//! - [`apply`] - simulated apply engine that enforces ordering
//!
//! Apply order is derived from the declared edges with a topological sort,
//! never from the order in which components were added.

mod apply;
mod exports;
mod resource;

pub use apply::Applier;
pub use exports::{Exports, Import, Token};
pub use resource::{Resource, ResourceKind, Synthesize};

use crate::error::{Result, TopologyError};
use crate::models::ResourceId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceGraph {
    resources: BTreeMap<ResourceId, Resource>,
    /// Ids in the order they were added.
    declared: Vec<ResourceId>,
    exports: Exports,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every resource of a component. Nothing is added when any id is
    /// already taken; all clashes are reported together.
    pub fn add(&mut self, component: &dyn Synthesize) -> Result<()> {
        let nodes = component.resources();
        let mut seen = BTreeSet::new();
        let errors: Vec<TopologyError> = nodes
            .iter()
            .filter(|n| self.resources.contains_key(&n.id) || !seen.insert(n.id.clone()))
            .map(|n| TopologyError::configuration(format!("duplicate resource id {}", n.id)))
            .collect();
        TopologyError::collect(errors)?;

        for node in nodes {
            log::debug!("graph += {} ({})", node.id, node.kind);
            self.declared.push(node.id.clone());
            self.resources.insert(node.id.clone(), node);
        }
        Ok(())
    }

    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    pub fn exports_mut(&mut self) -> &mut Exports {
        &mut self.exports
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.declared.iter().filter_map(|id| self.resources.get(id))
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|r| r.kind == kind).count()
    }

    pub fn declaration_order(&self) -> &[ResourceId] {
        &self.declared
    }

    /// Check that every dependency exists, every consumed value has a
    /// dependency edge, and every export names a resource in the graph.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        for resource in self.iter() {
            for dep in &resource.depends_on {
                if !self.resources.contains_key(dep) {
                    errors.push(TopologyError::unresolved(
                        dep.as_str(),
                        format!("{} depends on a resource that is not in the graph", resource.id),
                    ));
                }
            }
            for reference in resource.references.difference(&resource.depends_on) {
                errors.push(TopologyError::unresolved(
                    reference.as_str(),
                    format!("{} consumes it without a dependency edge", resource.id),
                ));
            }
        }
        for (name, token) in self.exports.iter() {
            if !self.resources.contains_key(token.producer()) {
                errors.push(TopologyError::unresolved(
                    name.as_str(),
                    format!("export produced by {} which is not in the graph", token.producer()),
                ));
            }
        }
        TopologyError::collect(errors)
    }

    /// Apply batches: every resource of a batch only depends on resources
    /// of earlier batches, so a batch may be applied in parallel.
    pub fn apply_batches(&self) -> Result<Vec<Vec<ResourceId>>> {
        self.validate()?;

        let mut remaining: BTreeMap<&ResourceId, BTreeSet<&ResourceId>> = self
            .resources
            .values()
            .map(|r| (&r.id, r.depends_on.iter().collect()))
            .collect();
        let mut batches = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<&ResourceId> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(id, _)| *id)
                .collect();
            if ready.is_empty() {
                let stuck: Vec<String> = remaining.keys().map(|id| id.to_string()).collect();
                return Err(TopologyError::configuration(format!(
                    "dependency cycle among: {}",
                    stuck.join(", ")
                )));
            }
            for id in &ready {
                remaining.remove(id);
            }
            for deps in remaining.values_mut() {
                for id in &ready {
                    deps.remove(id);
                }
            }
            batches.push(ready.into_iter().cloned().collect());
        }
        Ok(batches)
    }

    /// A single deterministic apply order.
    pub fn apply_order(&self) -> Result<Vec<ResourceId>> {
        Ok(self.apply_batches()?.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nodes(Vec<Resource>);

    impl Synthesize for Nodes {
        fn resources(&self) -> Vec<Resource> {
            self.0.clone()
        }
    }

    fn node(id: &str, deps: &[&str]) -> Resource {
        deps.iter().fold(
            Resource::new(id.into(), ResourceKind::Route),
            |r, d| r.after(&ResourceId::new(*d)),
        )
    }

    #[test]
    fn test_apply_order_follows_edges_not_declaration() {
        let mut graph = ResourceGraph::new();
        graph
            .add(&Nodes(vec![node("route", &["hub"]), node("hub", &[])]))
            .unwrap();
        assert_eq!(
            graph.declaration_order(),
            &[ResourceId::new("route"), ResourceId::new("hub")]
        );
        assert_eq!(
            graph.apply_order().unwrap(),
            vec![ResourceId::new("hub"), ResourceId::new("route")]
        );
    }

    #[test]
    fn test_batches_group_independent_resources() {
        let mut graph = ResourceGraph::new();
        graph
            .add(&Nodes(vec![
                node("a", &[]),
                node("b", &[]),
                node("c", &["a", "b"]),
            ]))
            .unwrap();
        let batches = graph.apply_batches().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1], vec![ResourceId::new("c")]);
    }

    #[test]
    fn test_duplicate_ids_rejected_atomically() {
        let mut graph = ResourceGraph::new();
        graph.add(&Nodes(vec![node("a", &[])])).unwrap();
        let err = graph
            .add(&Nodes(vec![node("b", &[]), node("a", &[]), node("b", &[])]))
            .unwrap_err();
        assert_eq!(err.flatten().len(), 2);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_missing_dependency_is_unresolved() {
        let mut graph = ResourceGraph::new();
        graph.add(&Nodes(vec![node("route", &["hub"])])).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnresolvedReference { ref name, .. } if name == "hub"
        ));
        assert!(graph.apply_order().is_err());
    }

    #[test]
    fn test_reference_without_edge_is_reported() {
        let mut unsafe_node = node("route", &[]);
        unsafe_node.references.insert("hub".into());
        let mut graph = ResourceGraph::new();
        graph
            .add(&Nodes(vec![unsafe_node, node("hub", &[])]))
            .unwrap();
        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("without a dependency edge"));
    }

    #[test]
    fn test_cycle_is_configuration_error() {
        let mut graph = ResourceGraph::new();
        graph
            .add(&Nodes(vec![node("a", &["b"]), node("b", &["a"])]))
            .unwrap();
        assert!(matches!(
            graph.apply_batches(),
            Err(TopologyError::Configuration(ref msg)) if msg.contains("cycle")
        ));
    }

    #[test]
    fn test_export_producer_must_exist() {
        let mut graph = ResourceGraph::new();
        graph
            .exports_mut()
            .publish(
                "ghost-id",
                Token::Ref {
                    resource: "ghost".into(),
                },
            )
            .unwrap();
        assert!(graph.validate().is_err());
    }
}
