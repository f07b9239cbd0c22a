//! Default security rule set of a network.

use super::{Ipv4, ResourceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngressProtocol {
    /// ICMP echo request (ping), any code.
    IcmpEcho,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub id: ResourceId,
    pub protocol: IngressProtocol,
    pub source: Ipv4,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: ResourceId,
    pub ingress: Vec<IngressRule>,
}

impl SecurityGroup {
    /// The only rule set this crate ever creates: ping from anywhere.
    pub fn default_for(network_id: &ResourceId) -> Self {
        let id = network_id.child("default-sg");
        SecurityGroup {
            ingress: vec![IngressRule {
                id: id.child("icmp-ping"),
                protocol: IngressProtocol::IcmpEcho,
                source: Ipv4::anywhere(),
                description: "Allow ping from anywhere".to_string(),
            }],
            id,
        }
    }
}
