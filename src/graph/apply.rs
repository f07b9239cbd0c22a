//! Simulated apply engine.
//!
//! The real engine is external and may apply resources in any order that
//! respects the declared edges. [`Applier`] accepts an arbitrary proposed
//! order and fails deterministically on the first ordering violation.

use super::{Import, ResourceGraph, Token};
use crate::error::{Result, TopologyError};
use crate::models::ResourceId;
use std::collections::BTreeSet;

pub struct Applier<'g> {
    graph: &'g ResourceGraph,
    applied: BTreeSet<ResourceId>,
}

impl<'g> Applier<'g> {
    pub fn new(graph: &'g ResourceGraph) -> Self {
        Applier {
            graph,
            applied: BTreeSet::new(),
        }
    }

    pub fn is_applied(&self, id: &ResourceId) -> bool {
        self.applied.contains(id)
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Apply one resource; all of its dependencies must already be applied.
    pub fn apply(&mut self, id: &ResourceId) -> Result<()> {
        let resource = self
            .graph
            .get(id)
            .ok_or_else(|| TopologyError::unresolved(id.as_str(), "not in the resource graph"))?;
        if let Some(missing) = resource
            .depends_on
            .iter()
            .find(|dep| !self.applied.contains(*dep))
        {
            log::warn!("ordering violation: {id} applied before {missing}");
            return Err(TopologyError::unresolved(
                missing.as_str(),
                format!("{id} applied before its dependency"),
            ));
        }
        self.applied.insert(id.clone());
        Ok(())
    }

    pub fn apply_all<'a, I>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ResourceId>,
    {
        for id in ids {
            self.apply(id)?;
        }
        Ok(())
    }

    /// Concrete value of an import, available only after its producer.
    pub fn resolve(&self, import: &Import) -> Result<String> {
        let producer = import.producer();
        if !self.applied.contains(producer) {
            return Err(TopologyError::unresolved(
                import.name.as_str(),
                format!("producer {producer} has not been applied"),
            ));
        }
        Ok(match &import.value {
            Token::Ref { resource } => resource.to_string(),
            Token::Attribute {
                resource,
                attribute,
            } => format!("{resource}.{attribute}"),
        })
    }
}

impl ResourceGraph {
    /// Validate and apply the whole graph in topological order.
    pub fn apply(&self) -> Result<Applier<'_>> {
        let order = self.apply_order()?;
        let mut applier = Applier::new(self);
        applier.apply_all(&order)?;
        log::info!("applied {} resources", applier.applied_count());
        Ok(applier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Resource, ResourceKind, Synthesize};

    struct HubAndRoute;

    impl Synthesize for HubAndRoute {
        fn resources(&self) -> Vec<Resource> {
            vec![
                Resource::new("route".into(), ResourceKind::Route).referencing(&"hub".into()),
                Resource::new("hub".into(), ResourceKind::TransitHub),
            ]
        }
    }

    fn graph() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        graph.add(&HubAndRoute).unwrap();
        graph
            .exports_mut()
            .publish(
                "hub-id",
                Token::Ref {
                    resource: "hub".into(),
                },
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_declaration_order_violates_dependency() {
        let graph = graph();
        let mut applier = Applier::new(&graph);
        let err = applier.apply_all(graph.declaration_order()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnresolvedReference { ref name, .. } if name == "hub"
        ));
        assert!(!applier.is_applied(&"route".into()));
    }

    #[test]
    fn test_resolve_before_producer_fails() {
        let graph = graph();
        let import = graph.exports().consume("hub-id").unwrap();
        let mut applier = Applier::new(&graph);
        assert!(applier.resolve(&import).is_err());
        applier.apply(&"hub".into()).unwrap();
        assert_eq!(applier.resolve(&import).unwrap(), "hub");
    }

    #[test]
    fn test_full_apply() {
        let graph = graph();
        let applier = graph.apply().unwrap();
        assert_eq!(applier.applied_count(), 2);
    }

    #[test]
    fn test_unknown_resource() {
        let graph = graph();
        let mut applier = Applier::new(&graph);
        assert!(applier.apply(&"nope".into()).is_err());
    }
}
