// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! L2 multipoint connections: one bridge domain per involved node joining
//! the local vswitch endpoints, plus overlay tunnels when the endpoints
//! span nodes.

use crate::cache::ControllerCore;
use config::artifact::{Artifact, ArtifactSpec, BridgeInterface};
use config::service::Connection;
use config::types::MeshType;
use config::{CoreError, CoreResult, EntityState, VnfService};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// vswitch interfaces destined for each node's bridge domain.
pub(crate) type L2bdInterfaces = BTreeMap<String, Vec<BridgeInterface>>;

impl ControllerCore {
    pub(crate) fn render_topology_l2mp(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        state: &mut EntityState,
    ) -> CoreResult {
        let conn = vs.connections[conn_index as usize].clone();
        let endpoints = self.resolve_endpoints(vs, &conn, state)?;

        let node_set: BTreeSet<String> = endpoints.iter().map(|ep| ep.node.clone()).collect();
        debug!(
            "vnf-service '{}', conn {conn_index}: {} endpoints over {} nodes",
            vs.name,
            endpoints.len(),
            node_set.len()
        );

        let mesh = match &conn.vnf_service_mesh {
            None => None,
            Some(mesh_name) => match self.meshes.get(mesh_name) {
                Some(mesh) => Some(mesh.clone()),
                None => {
                    let err = CoreError::UnknownServiceMesh {
                        service: vs.name.clone(),
                        mesh: mesh_name.clone(),
                    };
                    state.append_msg(err.to_string());
                    return Err(err);
                }
            },
        };

        // per-endpoint interface pairs, collected into per-node bridge lists
        let mut l2bd_ifs = L2bdInterfaces::new();
        for ep in &endpoints {
            let if_name = self.render_interface_pair(vs, &ep.node, ep, state)?;
            l2bd_ifs.entry(ep.node.clone()).or_default().push(BridgeInterface {
                name: if_name,
                bvi: false,
                split_horizon_group: 0,
            });
        }

        if node_set.len() == 1 {
            // everything is local, but the endpoints may still be joined to
            // an external node via a hub-and-spoke overlay
            if let Some(mesh) = &mesh {
                if mesh.mesh_type == MeshType::HubAndSpoke {
                    return self.render_l2mp_hub_and_spoke(
                        vs, conn_index, &conn, mesh, &node_set, l2bd_ifs, state,
                    );
                }
            }
            let node = endpoints[0].node.clone();
            let ifs = l2bd_ifs.remove(&node).unwrap_or_default();
            return self.render_l2bd(vs, conn_index, &conn, &node, ifs, state);
        }

        let Some(mesh) = mesh else {
            let err = CoreError::MissingServiceMesh {
                service: vs.name.clone(),
            };
            state.append_msg(err.to_string());
            return Err(err);
        };

        match mesh.mesh_type {
            MeshType::Mesh => {
                self.render_l2mp_vxlan_mesh(vs, conn_index, &conn, &mesh, &node_set, l2bd_ifs, state)
            }
            MeshType::HubAndSpoke => {
                self.render_l2mp_hub_and_spoke(vs, conn_index, &conn, &mesh, &node_set, l2bd_ifs, state)
            }
        }
    }

    /// Emit (or extend) the bridge domain joining `ifs` on `node`.
    pub(crate) fn render_l2bd(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        conn: &Connection,
        node: &str,
        ifs: Vec<BridgeInterface>,
        state: &mut EntityState,
    ) -> CoreResult {
        if let Some(node_l2bd) = &conn.use_node_l2bd {
            // join the node-level bridge rendered earlier this transaction
            let declared = self
                .nodes
                .get(node)
                .is_some_and(|n| n.find_l2bd(node_l2bd).is_some());
            let staged = if declared {
                self.find_staged_node_l2bd(node, node_l2bd).cloned()
            } else {
                None
            };
            let Some(Artifact {
                key,
                spec: Some(ArtifactSpec::L2bd(mut spec)),
                ..
            }) = staged
            else {
                let err = CoreError::UnknownNodeL2bd {
                    owner: format!("vnf-service {}", vs.name),
                    node: node.to_owned(),
                    l2bd: node_l2bd.clone(),
                };
                state.append_msg(err.to_string());
                return Err(err);
            };
            spec.interfaces.extend(ifs);
            debug!("appending interfaces to node l2bd '{key}'");
            let updated = Artifact::bridge_domain(node, &spec.name, spec.interfaces, &spec.parms);
            // key already tracked by the node's manifest this transaction
            self.txn.after.insert(key, updated);
            return Ok(());
        }

        let parms = match &conn.l2bd {
            Some(l2bd) => match &l2bd.l2bd_template {
                Some(template) => match self.find_l2bd_template(template) {
                    Some(parms) => parms,
                    None => {
                        let err = CoreError::UnknownL2bdTemplate {
                            owner: format!("vnf-service {}", vs.name),
                            template: template.clone(),
                        };
                        state.append_msg(err.to_string());
                        return Err(err);
                    }
                },
                None => l2bd
                    .bd_parms
                    .clone()
                    .unwrap_or_else(|| self.default_bd_parms()),
            },
            None => self.default_bd_parms(),
        };

        let bd_name = format!("L2BD_{}_CONN_{}", vs.name, conn_index + 1);
        let artifact = Artifact::bridge_domain(node, &bd_name, ifs, &parms);
        self.stage(state, artifact);
        Ok(())
    }
}
