// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF-to-node binding operations. Topology decisions hang off these
//! mappings, so every change re-renders all services.

use crate::cache::ControllerCore;
use config::{CoreResult, VnfToNodeMap, keys};
use tracing::{info, warn};

impl ControllerCore {
    fn vnf_known_to_any_service(&self, vnf: &str) -> bool {
        self.services
            .values()
            .any(|vs| vs.vnfs.iter().any(|v| v.name == vnf))
    }

    fn binding_sanity_check(&self, v2n: &VnfToNodeMap) {
        if !self.nodes.contains_key(&v2n.node) {
            warn!("binding {}→{}: node not defined yet", v2n.vnf, v2n.node);
        }
        if !self.vnf_known_to_any_service(&v2n.vnf) {
            warn!("binding {}→{}: vnf not found in any service yet", v2n.vnf, v2n.node);
        }
    }

    /// Install authored bindings; a VNF may have moved, so optionally
    /// re-render every service.
    pub(crate) fn vnf_to_node_map_create(
        &mut self,
        bindings: Vec<VnfToNodeMap>,
        render: bool,
    ) -> CoreResult {
        for v2n in bindings {
            self.binding_sanity_check(&v2n);
            self.broker.put(&keys::vnf_to_node_key(&v2n.vnf), &v2n)?;
            self.v2n_config.insert(v2n.vnf.clone(), v2n.clone());
            self.bindings.insert(v2n.vnf.clone(), v2n);
        }
        if render {
            self.vnf_services_render()?;
        }
        Ok(())
    }

    /// Watcher entry point: a discovered binding appeared or changed.
    pub(crate) fn binding_update(&mut self, v2n: VnfToNodeMap) -> CoreResult {
        self.binding_sanity_check(&v2n);
        info!("binding update: {} → {}", v2n.vnf, v2n.node);
        self.bindings.insert(v2n.vnf.clone(), v2n);
        self.vnf_services_render()
    }

    /// Watcher entry point: a discovered binding disappeared.
    pub(crate) fn binding_remove(&mut self, vnf: &str) -> CoreResult {
        if self.bindings.remove(vnf).is_none() {
            return Ok(());
        }
        info!("binding removed: {vnf}");
        self.vnf_services_render()
    }
}
