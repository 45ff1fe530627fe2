// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF service operations and the per-service render loop.
//!
//! A render error on one connection does not abort the transaction: the
//! diagnostic lands in the service state, everything staged so far is torn
//! down, and rendering moves on to the next connection. Services whose
//! message list is empty at the end of the render are marked up.

use crate::cache::ControllerCore;
use config::types::{ConnType, OperStatus, PoolScope};
use config::{CoreResult, EntityState, VnfService, keys};
use tracing::{debug, error, info};

impl ControllerCore {
    pub(crate) fn vnf_service_create(&mut self, vs: VnfService, render: bool) -> CoreResult {
        vs.validate(&self.sys)?;
        if render {
            self.render_vnf_service(&vs)?;
        }
        self.broker.put(&keys::vnf_service_key(&vs.name), &vs)?;
        let name = vs.name.clone();
        self.services.insert(name.clone(), vs);

        // a new service may need service-scoped pool allocators
        self.ipam_pool_entity_create(PoolScope::VnfService, &name);
        Ok(())
    }

    /// Re-render every service, in name order.
    pub(crate) fn vnf_services_render(&mut self) -> CoreResult {
        let services: Vec<VnfService> = self.services.values().cloned().collect();
        for vs in services {
            self.render_vnf_service(&vs)?;
        }
        Ok(())
    }

    /// Render one service: capture its previous manifest, render each
    /// connection, publish the refreshed service state.
    pub(crate) fn render_vnf_service(&mut self, vs: &VnfService) -> CoreResult {
        info!("rendering vnf-service '{}'", vs.name);
        if let Some(state) = self.service_states.get(&vs.name) {
            let manifest = state.rendered_entries.clone();
            self.txn_capture_before(&manifest);
        }
        self.service_states.remove(&vs.name);

        let mut state = EntityState::new(&vs.name);

        for index in 0..vs.connections.len() {
            debug!("vnf-service '{}': connection {index}", vs.name);
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            if let Err(e) = self.render_connection(vs, index, &mut state) {
                // error paths record their own diagnostics; make sure at
                // least one lands so the service goes down
                if state.msgs.is_empty() {
                    state.append_msg(e.to_string());
                }
                self.txn_cleanup_rendering();
                state.rendered_entries.clear();
                error!("render failed in vnf-service '{}': {e}", vs.name);
            }
        }

        if state.msgs.is_empty() {
            state.append_msg("OK");
            state.oper_status = OperStatus::Up;
        } else {
            state.oper_status = OperStatus::Down;
        }

        self.broker
            .put(&keys::vnf_service_status_key(&vs.name), &state)?;
        debug!(
            "vnf-service '{}': {:?}, {} artifacts",
            vs.name,
            state.oper_status,
            state.rendered_entries.len()
        );
        self.service_states.insert(vs.name.clone(), state);
        Ok(())
    }

    fn render_connection(
        &mut self,
        vs: &VnfService,
        index: u32,
        state: &mut EntityState,
    ) -> CoreResult {
        let conn = &vs.connections[index as usize];
        match conn.conn_type {
            ConnType::L2pp => self.render_topology_l2pp(vs, index, state),
            ConnType::L2mp => self.render_topology_l2mp(vs, index, state),
        }
    }
}
