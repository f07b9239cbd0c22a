//! Gateway device terminating a site-to-site VPN tunnel.
//!
//! The device lives in the network's first public subnet. Its public
//! address is only known once it has been applied, so it is published as
//! an export for the phase that builds the remote side's VPN descriptor.

use crate::error::{Result, TopologyError};
use crate::graph::{Exports, Token};
use crate::models::{GatewayDevice, Ipv4, Network, VpnConnectionSpec};
use serde::{Deserialize, Serialize};

pub const PUBLIC_IP_ATTRIBUTE: &str = "PublicIp";

/// Boot configuration of the device. Opaque to synthesis; it is handed to
/// the provisioning platform unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootConfig {
    pub machine_image: String,
    pub instance_type: String,
    pub user_data: Vec<String>,
}

impl Default for BootConfig {
    fn default() -> Self {
        BootConfig {
            machine_image: "windows-server-2019-english-full-base".to_string(),
            instance_type: "t2.micro".to_string(),
            user_data: Vec::new(),
        }
    }
}

pub struct GatewayDeviceProvisioner;

impl GatewayDeviceProvisioner {
    /// Place one device in `network`'s public subnet and publish its public
    /// address as `<instance id>-public-ip`.
    pub fn provision(
        network: &Network,
        boot: &BootConfig,
        exports: &mut Exports,
    ) -> Result<GatewayDevice> {
        let subnet = network.public_subnets().next().ok_or_else(|| {
            TopologyError::configuration(format!(
                "network {} has no public subnet for a gateway device",
                network.id()
            ))
        })?;
        let instance_id = network.id().child("gateway-device");
        let public_address_export = format!("{instance_id}-public-ip");
        exports.publish(
            public_address_export.clone(),
            Token::Attribute {
                resource: instance_id.clone(),
                attribute: PUBLIC_IP_ATTRIBUTE.to_string(),
            },
        )?;
        log::info!(
            "gateway device {} in {} (source/destination check disabled)",
            instance_id,
            subnet.id
        );
        Ok(GatewayDevice {
            instance_id,
            network_id: network.id().clone(),
            subnet_id: subnet.id.clone(),
            // forwarding tunnel traffic requires this off, whatever the input
            source_dest_check: false,
            machine_image: boot.machine_image.clone(),
            instance_type: boot.instance_type.clone(),
            user_data: boot.user_data.clone(),
            public_address_export,
        })
    }
}

/// VPN descriptor for the remote network, once the device's public
/// address is known.
pub fn vpn_connection_spec(peer_address: impl Into<String>, static_routes: &[Ipv4]) -> VpnConnectionSpec {
    VpnConnectionSpec {
        peer_address: peer_address.into(),
        static_routes: static_routes.iter().map(|r| r.to_string()).collect(),
    }
}
