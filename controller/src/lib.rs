// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The SFC controller core: a single-writer, transactional renderer that
//! translates declared nodes, VNF services and service meshes into
//! per-node forwarder artifacts persisted in a shared datastore.
//!
//! All mutating entry points funnel through [`Controller`], which holds the
//! whole controller state behind one mutex; every operation runs a full
//! validate / render / diff-commit span under that lock, so configuration
//! changes are linearizable.

#![deny(unsafe_code, clippy::all)]
#![allow(clippy::missing_errors_doc)]

pub mod binding;
pub mod bootstrap;
pub mod cache;
pub mod ipam;
pub mod mesh;
pub mod node;
pub mod service;
pub mod system;
pub mod topology;
pub mod txn;
pub mod watcher;

use cache::ControllerCore;
use config::{
    CoreResult, EntityState, InterfaceState, IpamPool, Node, SystemParameters, VnfService,
    VnfServiceMesh, VnfToNodeMap, artifact::Artifact,
};
use datastore::{Broker, KvStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use txn::CommitStats;

/// The controller: one shared state object plus the serialization lock.
pub struct Controller {
    core: Mutex<ControllerCore>,
}

impl Controller {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        info!("creating controller core");
        Self {
            core: Mutex::new(ControllerCore::new(Broker::new(store))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerCore> {
        // the core is left consistent by every op; a poisoned lock only
        // means a panic unwound through it
        self.core.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // ---- config surface -------------------------------------------------

    pub fn system_parameters_create(
        &self,
        sp: SystemParameters,
        render: bool,
    ) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.system_parameters_create(sp, render))
    }

    pub fn node_create(&self, node: Node, render: bool) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.node_create(node, render))
    }

    pub fn node_delete(&self, name: &str) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.node_delete(name))
    }

    pub fn vnf_service_create(&self, vs: VnfService, render: bool) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.vnf_service_create(vs, render))
    }

    pub fn vnf_service_mesh_create(
        &self,
        vsm: VnfServiceMesh,
        render: bool,
    ) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.vnf_service_mesh_create(vsm, render))
    }

    pub fn vnf_service_meshes_create(
        &self,
        meshes: Vec<VnfServiceMesh>,
        render: bool,
    ) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| {
            for vsm in meshes {
                core.vnf_service_mesh_create(vsm, false)?;
            }
            if render {
                core.vnf_services_render()?;
            }
            Ok(())
        })
    }

    pub fn ipam_pool_create(&self, pool: IpamPool, render: bool) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.ipam_pool_create(pool, render))
    }

    pub fn vnf_to_node_map_create(
        &self,
        bindings: Vec<VnfToNodeMap>,
        render: bool,
    ) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.vnf_to_node_map_create(bindings, render))
    }

    /// Entry point for the binding watcher: upsert one discovered binding
    /// and re-render every service.
    pub fn binding_update(&self, binding: VnfToNodeMap) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.binding_update(binding))
    }

    /// Entry point for the binding watcher: drop a discovered binding.
    pub fn binding_remove(&self, vnf: &str) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(|core| core.binding_remove(vnf))
    }

    /// Re-render every node and every service.
    pub fn render_all(&self) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.with_txn(cache::ControllerCore::render_config)
    }

    /// Remove the whole controller subtree and every indexed artifact.
    pub fn clean_all(&self) -> CoreResult {
        let mut core = self.lock();
        core.clean_all()
    }

    /// Load intent and rendered state from the datastore, optionally clean,
    /// and bring the datastore in line with a full re-render.
    pub fn bootstrap(&self, clean: bool) -> CoreResult<CommitStats> {
        let mut core = self.lock();
        core.bootstrap(clean)
    }

    // ---- read surface ---------------------------------------------------

    #[must_use]
    pub fn node_state(&self, name: &str) -> Option<EntityState> {
        self.lock().node_states.get(name).cloned()
    }

    #[must_use]
    pub fn vnf_service_state(&self, name: &str) -> Option<EntityState> {
        self.lock().service_states.get(name).cloned()
    }

    #[must_use]
    pub fn interface_state(&self, vnf: &str, interface: &str) -> Option<InterfaceState> {
        self.lock()
            .interface_states
            .get(&InterfaceState::cache_key(vnf, interface))
            .cloned()
    }

    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<Artifact> {
        self.lock().artifacts.get(key).cloned()
    }

    #[must_use]
    pub fn artifact_keys(&self) -> Vec<String> {
        self.lock().artifacts.keys().cloned().collect()
    }

    /// Current effective vnf→node bindings.
    #[must_use]
    pub fn bindings(&self) -> BTreeMap<String, String> {
        self.lock()
            .bindings
            .iter()
            .map(|(vnf, b)| (vnf.clone(), b.node.clone()))
            .collect()
    }
}
