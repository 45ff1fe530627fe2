// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF workloads and their interfaces. The same [`Interface`] shape is used
//! by nodes (ethernet only) and by VNFs (memif/veth/tap/ethernet).

use crate::errors::{CoreError, CoreResult};
use crate::types::{AdminStatus, IfType, InterVnfConn, MemifMode, RxMode, parse_ipv4_cidr};
use net::Mac;
use serde::{Deserialize, Serialize};

/// Memif-specific interface parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemifParams {
    #[serde(default)]
    pub mode: MemifMode,
    /// Policy for joining two memif endpoints on one node.
    #[serde(default)]
    pub inter_vnf_conn: InterVnfConn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub if_type: IfType,
    /// CIDR form, `a.b.c.d/len`.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub mac_address: Option<Mac>,
    /// 0 means "use the system default".
    #[serde(default)]
    pub mtu: u32,
    #[serde(default)]
    pub admin_status: AdminStatus,
    #[serde(default)]
    pub rx_mode: Option<RxMode>,
    /// Free-form labels; the overlay renderer matches these against a mesh's
    /// outgoing-interface-label to pick the physical path.
    #[serde(default)]
    pub custom_labels: Vec<String>,
    #[serde(default)]
    pub memif_params: Option<MemifParams>,
    /// Pool to draw an address from when none is declared.
    #[serde(default)]
    pub ipam_pool_name: Option<String>,
}

impl Interface {
    pub(crate) fn validate_addresses(&self, owner: &str) -> CoreResult {
        for address in &self.ip_addresses {
            parse_ipv4_cidr(address).map_err(|_| {
                tracing::debug!("{owner}/{}: bad address '{address}'", self.name);
                CoreError::BadAddress(address.clone())
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vnf {
    pub name: String,
    pub vnf_type: crate::types::VnfType,
    pub interfaces: Vec<Interface>,
}

impl Vnf {
    /// Validate a service-level VNF: type, non-empty interface list,
    /// per-interface types and addresses, memif parameter sanity.
    pub fn validate(&self, service: &str) -> CoreResult {
        use crate::types::VnfType;
        match self.vnf_type {
            VnfType::External | VnfType::VppContainer | VnfType::NonVppContainer => {}
            VnfType::VppVswitch => {
                return Err(CoreError::BadVnfType {
                    service: service.to_owned(),
                    vnf: self.name.clone(),
                    vnf_type: self.vnf_type.to_string(),
                });
            }
        }
        if self.interfaces.is_empty() {
            return Err(CoreError::VnfWithoutInterfaces {
                service: service.to_owned(),
                vnf: self.name.clone(),
            });
        }
        for iface in &self.interfaces {
            match iface.if_type {
                IfType::Memif | IfType::Ethernet | IfType::Veth | IfType::Tap => {}
                other => {
                    return Err(CoreError::BadVnfInterfaceType {
                        service: service.to_owned(),
                        interface: iface.name.clone(),
                        if_type: other.to_string(),
                    });
                }
            }
            iface.validate_addresses(&self.name)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn find_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}
