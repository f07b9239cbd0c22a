//! Named publish/consume registry for values passed between components.
//!
//! A producer publishes a [`Token`] under a name; a consumer gets back an
//! [`Import`] that names the producing resource, so the consumer can declare
//! the dependency edge. Resolving the token to a concrete value is only
//! possible once the producer has been applied (see [`super::Applier`]).

use crate::error::{Result, TopologyError};
use crate::models::{is_valid_name, ResourceId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A value that only exists once its producer has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// The identifier of a resource.
    Ref { resource: ResourceId },
    /// An attribute assigned by the platform, e.g. a public address.
    Attribute {
        resource: ResourceId,
        attribute: String,
    },
}

impl Token {
    pub fn producer(&self) -> &ResourceId {
        match self {
            Token::Ref { resource } | Token::Attribute { resource, .. } => resource,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ref { resource } => write!(f, "ref({resource})"),
            Token::Attribute {
                resource,
                attribute,
            } => write!(f, "attr({resource}.{attribute})"),
        }
    }
}

/// A consumed export. Carries the producer so callers can depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub name: String,
    pub value: Token,
}

impl Import {
    pub fn producer(&self) -> &ResourceId {
        self.value.producer()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exports {
    published: BTreeMap<String, Token>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `name`. Names are unique.
    pub fn publish(&mut self, name: impl Into<String>, value: Token) -> Result<Import> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(TopologyError::configuration(format!(
                "invalid export name '{name}'"
            )));
        }
        if let Some(existing) = self.published.get(&name) {
            return Err(TopologyError::configuration(format!(
                "export '{name}' already published as {existing}"
            )));
        }
        log::debug!("publish {name} = {value}");
        self.published.insert(name.clone(), value.clone());
        Ok(Import { name, value })
    }

    /// Consume a published value. Unknown names never resolve to a default.
    pub fn consume(&self, name: &str) -> Result<Import> {
        self.published
            .get(name)
            .map(|value| Import {
                name: name.to_string(),
                value: value.clone(),
            })
            .ok_or_else(|| TopologyError::unresolved(name, "no export with this name was published"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Token)> {
        self.published.iter()
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_ref() -> Token {
        Token::Ref {
            resource: "transit-tgw".into(),
        }
    }

    #[test]
    fn test_publish_then_consume() {
        let mut exports = Exports::new();
        exports.publish("transit-tgw-id", hub_ref()).unwrap();
        let import = exports.consume("transit-tgw-id").unwrap();
        assert_eq!(import.producer(), &ResourceId::new("transit-tgw"));
        assert_eq!(exports.len(), 1);
    }

    #[test]
    fn test_consume_unknown_name_fails() {
        let exports = Exports::new();
        let err = exports.consume("TransitGatewayId").unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnresolvedReference { ref name, .. } if name == "TransitGatewayId"
        ));
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let mut exports = Exports::new();
        exports.publish("hub-id", hub_ref()).unwrap();
        assert!(matches!(
            exports.publish("hub-id", hub_ref()),
            Err(TopologyError::Configuration(_))
        ));
        assert!(matches!(
            exports.publish("bad name", hub_ref()),
            Err(TopologyError::Configuration(_))
        ));
    }
}
