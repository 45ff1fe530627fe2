// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Startup: load declared intent and previously rendered state out of the
//! datastore, repopulate the artifact index from the per-entity manifests,
//! then reconcile the datastore with one full re-render.

use crate::cache::ControllerCore;
use crate::txn::CommitStats;
use config::artifact::Artifact;
use config::types::PoolScope;
use config::{
    CoreResult, EntityState, InterfaceState, IpamPool, Node, SystemParameters, VnfService,
    VnfServiceMesh, VnfToNodeMap, keys,
};
use tracing::{debug, info, warn};

impl ControllerCore {
    /// Load everything, optionally wipe, then render and commit the diff.
    pub(crate) fn bootstrap(&mut self, clean: bool) -> CoreResult<CommitStats> {
        info!("bootstrap: loading intent and state from the datastore");
        self.load_config_from_datastore()?;
        self.load_state_from_datastore()?;
        self.load_artifacts_from_state()?;

        // clean needs the artifact index populated so it knows which
        // forwarder keys the controller owns
        if clean {
            self.clean_all()?;
        }

        let stats = self.with_txn(ControllerCore::render_config)?;
        info!(
            "bootstrap: resync complete ({} writes, {} deletes)",
            stats.writes, stats.deletes
        );
        Ok(stats)
    }

    /// Delete the whole controller subtree and every indexed artifact,
    /// then start from empty caches.
    pub(crate) fn clean_all(&mut self) -> CoreResult {
        info!("clean: removing controller subtree and rendered artifacts");
        self.broker.delete_prefix(keys::CONTROLLER_PREFIX)?;
        let artifact_keys: Vec<String> = self.artifacts.keys().cloned().collect();
        for key in artifact_keys {
            self.broker.delete(&key)?;
        }
        self.reset();
        Ok(())
    }

    fn load_config_from_datastore(&mut self) -> CoreResult {
        if let Some(mut sp) = self
            .broker
            .get::<SystemParameters>(&keys::system_parameters_key())?
        {
            sp.validate()?;
            self.sys = sp;
        }

        for (_, node) in self.broker.list_values::<Node>(&keys::node_prefix())? {
            debug!("bootstrap: node '{}'", node.name);
            self.nodes.insert(node.name.clone(), node);
        }
        for (_, vs) in self
            .broker
            .list_values::<VnfService>(&keys::vnf_service_prefix())?
        {
            debug!("bootstrap: vnf-service '{}'", vs.name);
            self.services.insert(vs.name.clone(), vs);
        }
        for (_, vsm) in self
            .broker
            .list_values::<VnfServiceMesh>(&keys::vnf_service_mesh_prefix())?
        {
            debug!("bootstrap: vnf-service-mesh '{}'", vsm.name);
            if let Some(parms) = &vsm.vxlan_mesh {
                self.vni_allocators.insert(
                    vsm.name.clone(),
                    idalloc::VniAllocator::new(&vsm.name, parms.vni_range_start, parms.vni_range_end),
                );
            }
            self.meshes.insert(vsm.name.clone(), vsm);
        }
        for (_, pool) in self
            .broker
            .list_values::<IpamPool>(&keys::ipam_pool_prefix())?
        {
            debug!("bootstrap: ipam-pool '{}'", pool.name);
            self.ipam_pools.insert(pool.name.clone(), pool);
        }
        // allocators for every (pool, entity) pair that already exists
        self.ipam_pool_entity_create(PoolScope::System, "");
        let nodes: Vec<String> = self.nodes.keys().cloned().collect();
        for node in nodes {
            self.ipam_pool_entity_create(PoolScope::Node, &node);
        }
        let services: Vec<String> = self.services.keys().cloned().collect();
        for service in services {
            self.ipam_pool_entity_create(PoolScope::VnfService, &service);
        }

        for (_, v2n) in self
            .broker
            .list_values::<VnfToNodeMap>(&keys::vnf_to_node_prefix())?
        {
            self.v2n_config.insert(v2n.vnf.clone(), v2n.clone());
            self.bindings.insert(v2n.vnf.clone(), v2n);
        }
        Ok(())
    }

    fn load_state_from_datastore(&mut self) -> CoreResult {
        for (_, if_state) in self
            .broker
            .list_values::<InterfaceState>(&keys::interface_state_prefix())?
        {
            self.interface_states.insert(
                InterfaceState::cache_key(&if_state.vnf, &if_state.interface),
                if_state,
            );
        }
        for (_, state) in self
            .broker
            .list_values::<EntityState>(&keys::node_status_prefix())?
        {
            self.node_states.insert(state.name.clone(), state);
        }
        for (_, state) in self
            .broker
            .list_values::<EntityState>(&keys::vnf_service_status_prefix())?
        {
            self.service_states.insert(state.name.clone(), state);
        }
        Ok(())
    }

    /// Re-read every artifact named by a manifest so the in-memory index
    /// again mirrors what is in the datastore.
    fn load_artifacts_from_state(&mut self) -> CoreResult {
        let manifests: Vec<config::RenderedArtifact> = self
            .node_states
            .values()
            .chain(self.service_states.values())
            .flat_map(|s| s.rendered_entries.iter().cloned())
            .collect();
        for entry in manifests {
            match self.broker.store().get(&entry.key)? {
                Some(bytes) => {
                    let artifact = Artifact::decode_value(&entry.key, entry.kind, &bytes)?;
                    self.artifacts.insert(entry.key, artifact);
                }
                None => {
                    warn!("bootstrap: manifest names missing artifact '{}'", entry.key);
                }
            }
        }
        debug!("bootstrap: {} artifacts indexed", self.artifacts.len());
        Ok(())
    }
}
