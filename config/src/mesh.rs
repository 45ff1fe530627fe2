// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF service meshes: the overlay policy joining the nodes that carry the
//! endpoints of an inter-node connection.

use crate::errors::{CoreError, CoreResult};
use crate::types::{MeshConnectionType, MeshType};
use serde::{Deserialize, Serialize};

/// Parameters of a full-mesh vxlan overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxlanMeshParams {
    pub vni_range_start: u32,
    pub vni_range_end: u32,
    pub loopback_ipam_pool_name: String,
    #[serde(default)]
    pub outgoing_interface_label: String,
}

/// Parameters of a hub-and-spoke vxlan overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxlanHubAndSpokeParams {
    pub vni: u32,
    pub hub_node_name: String,
    pub loopback_ipam_pool_name: String,
    #[serde(default)]
    pub outgoing_interface_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnfServiceMesh {
    pub name: String,
    pub mesh_type: MeshType,
    #[serde(default)]
    pub connection_type: MeshConnectionType,
    #[serde(default)]
    pub vxlan_mesh: Option<VxlanMeshParams>,
    #[serde(default)]
    pub vxlan_hub_and_spoke: Option<VxlanHubAndSpokeParams>,
}

impl VnfServiceMesh {
    pub fn validate(&self) -> CoreResult {
        if self.name.is_empty() {
            return Err(CoreError::MissingIdentifier("vnf service mesh name"));
        }
        match (self.connection_type, self.mesh_type) {
            (MeshConnectionType::Vxlan, MeshType::Mesh) => {
                let Some(parms) = &self.vxlan_mesh else {
                    return Err(CoreError::MissingMeshParams(self.name.clone()));
                };
                if parms.vni_range_start > parms.vni_range_end
                    || parms.vni_range_start == 0
                    || parms.vni_range_end == 0
                {
                    return Err(CoreError::BadVniRange(self.name.clone()));
                }
            }
            (MeshConnectionType::Vxlan, MeshType::HubAndSpoke) => {
                let Some(parms) = &self.vxlan_hub_and_spoke else {
                    return Err(CoreError::MissingHubAndSpokeParams(self.name.clone()));
                };
                if parms.vni == 0 {
                    return Err(CoreError::BadMeshVni(self.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Label used to select the physical path toward peer nodes.
    #[must_use]
    pub fn outgoing_interface_label(&self) -> &str {
        match self.mesh_type {
            MeshType::Mesh => self
                .vxlan_mesh
                .as_ref()
                .map_or("", |p| p.outgoing_interface_label.as_str()),
            MeshType::HubAndSpoke => self
                .vxlan_hub_and_spoke
                .as_ref()
                .map_or("", |p| p.outgoing_interface_label.as_str()),
        }
    }

    /// The loopback pool backing this mesh's vxlan endpoints.
    #[must_use]
    pub fn loopback_pool_name(&self) -> &str {
        match self.mesh_type {
            MeshType::Mesh => self
                .vxlan_mesh
                .as_ref()
                .map_or("", |p| p.loopback_ipam_pool_name.as_str()),
            MeshType::HubAndSpoke => self
                .vxlan_hub_and_spoke
                .as_ref()
                .map_or("", |p| p.loopback_ipam_pool_name.as_str()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mesh_requires_valid_range() {
        let mut mesh = VnfServiceMesh {
            name: "inter-node".to_string(),
            mesh_type: MeshType::Mesh,
            connection_type: MeshConnectionType::Vxlan,
            vxlan_mesh: Some(VxlanMeshParams {
                vni_range_start: 200,
                vni_range_end: 100,
                loopback_ipam_pool_name: "loopbacks".to_string(),
                outgoing_interface_label: String::new(),
            }),
            vxlan_hub_and_spoke: None,
        };
        assert_eq!(
            mesh.validate(),
            Err(CoreError::BadVniRange("inter-node".to_string()))
        );
        mesh.vxlan_mesh.as_mut().unwrap().vni_range_end = 300;
        mesh.validate().unwrap();
    }

    #[test]
    fn hub_and_spoke_requires_vni() {
        let mesh = VnfServiceMesh {
            name: "hs".to_string(),
            mesh_type: MeshType::HubAndSpoke,
            connection_type: MeshConnectionType::Vxlan,
            vxlan_mesh: None,
            vxlan_hub_and_spoke: Some(VxlanHubAndSpokeParams {
                vni: 0,
                hub_node_name: "hub".to_string(),
                loopback_ipam_pool_name: "loopbacks".to_string(),
                outgoing_interface_label: String::new(),
            }),
        };
        assert_eq!(mesh.validate(), Err(CoreError::BadMeshVni("hs".to_string())));
    }
}
