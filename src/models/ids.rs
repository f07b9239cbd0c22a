//! Logical resource identifiers and zones.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Names usable for exports and VPN connections.
static NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_name_regex() -> &'static Regex {
    NAME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9:-]{0,254}$").expect("Invalid Regex"))
}

/// True for names starting with a letter followed by letters, digits,
/// `-` or `:`.
pub fn is_valid_name(name: &str) -> bool {
    get_name_regex().is_match(name)
}

/// Logical id of a synthesized resource, unique within one resource graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    /// Derive a child id, e.g. `net0` -> `net0-igw`.
    pub fn child(&self, suffix: impl fmt::Display) -> Self {
        ResourceId(format!("{}-{}", self.0, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        ResourceId::new(s)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        ResourceId(s)
    }
}

/// Failure domain, numbered from zero and displayed as a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(pub u8);

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // zone 0 -> "a", zone 25 -> "z", zone 26 -> "z1"
        let letter = (b'a' + self.0.min(25)) as char;
        if self.0 > 25 {
            write!(f, "{letter}{}", self.0 - 25)
        } else {
            write!(f, "{letter}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ids() {
        let net = ResourceId::new("peers-net0");
        assert_eq!(net.child("igw").as_str(), "peers-net0-igw");
        assert_eq!(net.child(Zone(1)).to_string(), "peers-net0-b");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("toOnPrem"));
        assert!(is_valid_name("transit-tgw-id"));
        assert!(is_valid_name("stack:export"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1st"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("under_score"));
    }

    #[test]
    fn test_zone_display() {
        assert_eq!(Zone(0).to_string(), "a");
        assert_eq!(Zone(25).to_string(), "z");
        assert_eq!(Zone(27).to_string(), "z2");
    }
}
