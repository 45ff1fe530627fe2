// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Full-mesh vxlan overlays. One VNI per connection; a tunnel for every
//! ordered pair of involved nodes; loopbacks and static routes per
//! endpoint; split-horizon group 1 on tunnel bridge ports so broadcast
//! never transits a second tunnel hop.

use super::Endpoint;
use super::l2mp::L2bdInterfaces;
use crate::cache::ControllerCore;
use config::artifact::{Artifact, BridgeInterface};
use config::service::Connection;
use config::{CoreError, CoreResult, EntityState, VnfService, VnfServiceMesh};
use net::Vni;
use std::collections::BTreeSet;
use tracing::debug;

/// Record a render failure on the service state and hand the error back
/// for control flow.
pub(crate) fn diagnose(
    state: &mut EntityState,
    vs: &VnfService,
    conn_index: u32,
    err: CoreError,
) -> CoreError {
    state.append_msg(format!(
        "vnf-service '{}', conn {conn_index}: {err}",
        vs.name
    ));
    err
}

impl ControllerCore {
    /// One VNI for this connection, stable across renders.
    pub(crate) fn mesh_allocate_vni(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        mesh: &VnfServiceMesh,
        state: &mut EntityState,
    ) -> CoreResult<Vni> {
        let owner = format!("{}/{conn_index}", vs.name);
        let Some(allocator) = self.vni_allocators.get_mut(&mesh.name) else {
            let err = CoreError::Alloc(idalloc::AllocError::ExhaustedPool(mesh.name.clone()));
            return Err(diagnose(state, vs, conn_index, err));
        };
        allocator
            .allocate_for(&owner)
            .map_err(|e| diagnose(state, vs, conn_index, e.into()))
    }

    /// L2PP across two nodes over a vxlan mesh: one tunnel per direction,
    /// cross-connected to the endpoint's vswitch interface on each side.
    pub(crate) fn render_l2pp_vxlan_mesh(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        mesh: &VnfServiceMesh,
        endpoints: &[Endpoint],
        vswitch_ifs: &[String; 2],
        state: &mut EntityState,
    ) -> CoreResult {
        let vni = self.mesh_allocate_vni(vs, conn_index, mesh, state)?;
        let pool = mesh.loopback_pool_name().to_owned();
        let label = mesh.outgoing_interface_label().to_owned();

        let mut vxlan_ifs = [String::new(), String::new()];
        for i in 0..2 {
            let (from, to) = (&endpoints[i], &endpoints[i ^ 1]);
            let if_name = format!(
                "IF_VXLAN_L2PP_VSRVC_{}_CONN_{}_FROM_{}_{}_{}_TO_{}_{}_{}_VNI_{vni}",
                vs.name,
                conn_index + 1,
                from.node,
                from.vnf,
                from.iface.name,
                to.node,
                to.vnf,
                to.iface.name,
            );
            let (from_bare, from_cidr) = self
                .mesh_loopback_address(&pool, &from.node)
                .map_err(|e| diagnose(state, vs, conn_index, e))?;
            let (to_bare, _) = self
                .mesh_loopback_address(&pool, &to.node)
                .map_err(|e| diagnose(state, vs, conn_index, e))?;

            let artifact = Artifact::vxlan(&from.node, &if_name, vni, &from_bare, &to_bare);
            self.stage(state, artifact);

            self.render_vxlan_static_routes(
                &mut state.rendered_entries,
                &from.node,
                &to.node,
                &from_cidr,
                &to_bare,
                &label,
            )?;

            vxlan_ifs[i] = if_name;
        }

        // cross-connect the vswitch side of each endpoint with its tunnel
        for i in 0..2 {
            for artifact in
                Artifact::xconnect_pair(&endpoints[i].node, &vswitch_ifs[i], &vxlan_ifs[i])
            {
                self.stage(state, artifact);
            }
        }
        Ok(())
    }

    /// L2MP across nodes over a vxlan mesh: tunnels between every ordered
    /// node pair, all joined per node into the connection's bridge domain.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn render_l2mp_vxlan_mesh(
        &mut self,
        vs: &VnfService,
        conn_index: u32,
        conn: &Connection,
        mesh: &VnfServiceMesh,
        node_set: &BTreeSet<String>,
        mut l2bd_ifs: L2bdInterfaces,
        state: &mut EntityState,
    ) -> CoreResult {
        let vni = self.mesh_allocate_vni(vs, conn_index, mesh, state)?;
        let pool = mesh.loopback_pool_name().to_owned();
        let label = mesh.outgoing_interface_label().to_owned();
        debug!(
            "vnf-service '{}', conn {conn_index}: vxlan mesh over {} nodes, vni {vni}",
            vs.name,
            node_set.len()
        );

        for from in node_set {
            for to in node_set {
                if from == to {
                    continue;
                }
                let if_name = format!(
                    "IF_VXLAN_MESH_VSRVC_{}_CONN_{}_FROM_{from}_TO_{to}_VNI_{vni}",
                    vs.name,
                    conn_index + 1,
                );
                let (from_bare, from_cidr) = self
                    .mesh_loopback_address(&pool, from)
                    .map_err(|e| diagnose(state, vs, conn_index, e))?;
                let (to_bare, _) = self
                    .mesh_loopback_address(&pool, to)
                    .map_err(|e| diagnose(state, vs, conn_index, e))?;

                let artifact = Artifact::vxlan(from, &if_name, vni, &from_bare, &to_bare);
                self.stage(state, artifact);

                // split horizon 1: traffic entering one tunnel must not
                // leave via another, broadcast stays one tunnel hop wide
                l2bd_ifs.entry(from.clone()).or_default().push(BridgeInterface {
                    name: if_name,
                    bvi: false,
                    split_horizon_group: 1,
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

        for node in node_set {
            let ifs = l2bd_ifs.remove(node).unwrap_or_default();
            self.render_l2bd(vs, conn_index, conn, node, ifs, state)?;
        }
        Ok(())
    }
}
