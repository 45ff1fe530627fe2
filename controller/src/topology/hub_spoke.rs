// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Hub-and-spoke vxlan overlays. The mesh pins one hub node and a single
//! VNI; every spoke gets a tunnel pair to the hub. Split-horizon group 0
//! on the bridge ports so the hub may forward between spokes.

use super::l2mp::L2bdInterfaces;
use super::vxlan_mesh::diagnose;
use crate::cache::ControllerCore;
use config::artifact::{Artifact, BridgeInterface};
use config::service::Connection;
use config::{CoreError, CoreResult, EntityState, VnfService, VnfServiceMesh};
use net::Vni;
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl ControllerCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn render_l2mp_hub_and_spoke(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        conn: &Connection,
        mesh: &VnfServiceMesh,
        spoke_set: &BTreeSet<String>,
        mut l2bd_ifs: L2bdInterfaces,
        state: &mut EntityState,
    ) -> CoreResult {
        let Some(parms) = mesh.vxlan_hub_and_spoke.clone() else {
            let err = CoreError::MissingHubAndSpokeParams(mesh.name.clone());
            return Err(diagnose(state, vs, conn_index, err));
        };
        let hub = parms.hub_node_name.clone();
        if !self.nodes.contains_key(&hub) {
            let err = CoreError::UnknownHubNode {
                mesh: mesh.name.clone(),
                hub: hub.clone(),
            };
            return Err(diagnose(state, vs, conn_index, err));
        }
        let vni = Vni::new_checked(parms.vni)
            .map_err(|_| diagnose(state, vs, conn_index, CoreError::BadMeshVni(mesh.name.clone())))?;

        let pool = parms.loopback_ipam_pool_name.clone();
        let label = parms.outgoing_interface_label.clone();
        debug!(
            "vnf-service '{}', conn {conn_index}: hub '{hub}', {} spokes, vni {vni}",
            vs.name,
            spoke_set.len()
        );

        for spoke in spoke_set {
            if *spoke == hub {
                // degenerate but consistent: the tunnels are still emitted,
                // with the mismatch surfaced on the service state
                warn!("mesh '{}': spoke '{spoke}' is the hub node", mesh.name);
                state.append_msg(format!(
                    "vnf-service '{}', conn {conn_index}, mesh '{}': hub node '{hub}' is also a spoke",
                    vs.name, mesh.name
                ));
            }

            // both ends of the tunnel, hub end first
            let node_pair = [hub.as_str(), spoke.as_str()];
            for i in 0..2 {
                let (from, to) = (node_pair[i], node_pair[i ^ 1]);
                let if_name = if i == 0 {
                    format!(
                        "IF_VXLAN_FROM_HUB_{from}_TO_SPOKE_{to}_VSRVC_{}_CONN_{conn_index}_VNI_{vni}",
                        vs.name
                    )
                } else {
                    format!(
                        "IF_VXLAN_FROM_SPOKE_{from}_TO_HUB_{to}_VSRVC_{}_CONN_{conn_index}_VNI_{vni}",
                        vs.name
                    )
                };
                let (from_bare, from_cidr) = self
                    .mesh_loopback_address(&pool, from)
                    .map_err(|e| diagnose(state, vs, conn_index, e))?;
                let (to_bare, _) = self
                    .mesh_loopback_address(&pool, to)
                    .map_err(|e| diagnose(state, vs, conn_index, e))?;

                let artifact = Artifact::vxlan(from, &if_name, vni, &from_bare, &to_bare);
                self.stage(state, artifact);

                // split horizon 0: the hub is allowed to forward between
                // spoke tunnels
                l2bd_ifs
                    .entry(from.to_owned())
                    .or_default()
                    .push(BridgeInterface {
                        name: if_name,
                        bvi: false,
                        split_horizon_group: 0,
                    });

                self.render_vxlan_static_routes(
                    &mut state.rendered_entries,
                    from,
                    to,
                    &from_cidr,
                    &to_bare,
                    &label,
                )?;
            }
        }

        // spoke bridge domains join local endpoints with the spoke-side
        // tunnels; the hub bridge domain joins all hub-side tunnels
        for spoke in spoke_set {
            let ifs = l2bd_ifs.remove(spoke).unwrap_or_default();
            self.render_l2bd(vs, conn_index, conn, spoke, ifs, state)?;
        }
        if !spoke_set.contains(&hub) {
            let ifs = l2bd_ifs.remove(&hub).unwrap_or_default();
            self.render_l2bd(vs, conn_index, conn, &hub, ifs, state)?;
        }
        Ok(())
    }
}
