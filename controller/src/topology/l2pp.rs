// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! L2 point-to-point connections: exactly two endpoints, joined by a
//! direct memif, a same-node cross-connect, or a vxlan tunnel pair.

use crate::cache::ControllerCore;
use config::artifact::Artifact;
use config::types::{IfType, InterVnfConn, MeshType};
use config::{CoreError, CoreResult, EntityState, VnfService};
use tracing::debug;

impl ControllerCore {
    pub(crate) fn render_topology_l2pp(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        state: &mut EntityState,
    ) -> CoreResult {
        let conn = vs.connections[conn_index as usize].clone();
        let endpoints = self.resolve_endpoints(vs, &conn, state)?;

        if endpoints[0].node == endpoints[1].node {
            return self.render_l2pp_same_node(vs, conn_index, &endpoints, state);
        }

        // endpoints on different nodes need an overlay
        let Some(mesh_name) = &conn.vnf_service_mesh else {
            let err = CoreError::MissingServiceMesh {
                service: vs.name.clone(),
            };
            state.append_msg(err.to_string());
            return Err(err);
        };
        let Some(mesh) = self.meshes.get(mesh_name).cloned() else {
            let err = CoreError::UnknownServiceMesh {
                service: vs.name.clone(),
                mesh: mesh_name.clone(),
            };
            state.append_msg(err.to_string());
            return Err(err);
        };

        // interfaces into the vswitch on each node first
        let mut vswitch_ifs = [String::new(), String::new()];
        for (i, ep) in endpoints.iter().enumerate() {
            vswitch_ifs[i] = self.render_interface_pair(vs, &ep.node, ep, state)?;
        }

        match mesh.mesh_type {
            MeshType::Mesh => {
                self.render_l2pp_vxlan_mesh(vs, conn_index, &mesh, &endpoints, &vswitch_ifs, state)
            }
            MeshType::HubAndSpoke => {
                let err = CoreError::Unsupported(format!(
                    "vnf-service '{}', conn {conn_index}: service mesh '{}' hub-and-spoke not supported for l2pp",
                    vs.name, mesh.name
                ));
                state.append_msg(err.to_string());
                Err(err)
            }
        }
    }

    fn render_l2pp_same_node(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        endpoints: &[super::Endpoint],
        state: &mut EntityState,
    ) -> CoreResult {
        let node = endpoints[0].node.clone();

        // both memif and neither side forcing vswitch: direct pair
        let mut conn_policy = InterVnfConn::Direct;
        for ep in endpoints {
            if let Some(params) = &ep.iface.memif_params {
                if params.inter_vnf_conn != InterVnfConn::Direct {
                    conn_policy = params.inter_vnf_conn;
                }
            }
        }
        let both_memif = endpoints
            .iter()
            .all(|ep| ep.iface.if_type == IfType::Memif);

        if both_memif && conn_policy == InterVnfConn::Direct {
            debug!(
                "vnf-service '{}', conn {conn_index}: direct memif on '{node}'",
                vs.name
            );
            return self.render_direct_memif_pair(vs, endpoints, state);
        }

        // drop both endpoints into the vswitch and cross-connect them
        let mut vswitch_ifs = [String::new(), String::new()];
        for (i, ep) in endpoints.iter().enumerate() {
            vswitch_ifs[i] = self.render_interface_pair(vs, &node, ep, state)?;
        }
        for artifact in Artifact::xconnect_pair(&node, &vswitch_ifs[0], &vswitch_ifs[1]) {
            self.stage(state, artifact);
        }
        Ok(())
    }
}
