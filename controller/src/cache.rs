// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The controller's in-memory state: declared intent indexed by name,
//! derived state records, the artifact index mirroring the datastore, and
//! every allocator. One instance exists per controller, guarded by the
//! [`crate::Controller`] mutex.

use crate::txn::Txn;
use config::artifact::Artifact;
use config::{
    CoreResult, EntityState, InterfaceState, IpamPool, Node, SystemParameters, VnfService,
    VnfServiceMesh, VnfToNodeMap,
};
use datastore::Broker;
use idalloc::{Ipv4Pool, MacAllocator, MemifIdAllocator, VniAllocator};
use std::collections::BTreeMap;
use tracing::debug;

pub struct ControllerCore {
    pub(crate) broker: Broker,

    // declared intent
    pub(crate) sys: SystemParameters,
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) services: BTreeMap<String, VnfService>,
    pub(crate) meshes: BTreeMap<String, VnfServiceMesh>,
    pub(crate) ipam_pools: BTreeMap<String, IpamPool>,
    /// Bindings authored through the config surface.
    pub(crate) v2n_config: BTreeMap<String, VnfToNodeMap>,
    /// Effective bindings consulted by the renderer: authored plus
    /// watcher-discovered, latest writer wins.
    pub(crate) bindings: BTreeMap<String, VnfToNodeMap>,

    // derived state
    pub(crate) interface_states: BTreeMap<String, InterfaceState>,
    pub(crate) node_states: BTreeMap<String, EntityState>,
    pub(crate) service_states: BTreeMap<String, EntityState>,
    /// What is currently supposed to exist in the datastore at rest.
    pub(crate) artifacts: BTreeMap<String, Artifact>,

    pub(crate) txn: Txn,

    // allocators, all process-private
    pub(crate) mac_allocator: MacAllocator,
    pub(crate) memif_allocator: MemifIdAllocator,
    /// Scoped IPAM pool allocators, keyed by `IpamPool::allocator_name`.
    pub(crate) ipam_allocators: BTreeMap<String, Ipv4Pool>,
    /// One VNI allocator per vxlan-mesh service mesh.
    pub(crate) vni_allocators: BTreeMap<String, VniAllocator>,
    /// Mesh loopback address per node, CIDR form; first allocation wins.
    pub(crate) mesh_loopback_addresses: BTreeMap<String, String>,
}

impl ControllerCore {
    #[must_use]
    pub fn new(broker: Broker) -> Self {
        let mut sys = SystemParameters::default();
        // defaults cannot fail to validate
        let _ = sys.validate();
        Self {
            broker,
            sys,
            nodes: BTreeMap::new(),
            services: BTreeMap::new(),
            meshes: BTreeMap::new(),
            ipam_pools: BTreeMap::new(),
            v2n_config: BTreeMap::new(),
            bindings: BTreeMap::new(),
            interface_states: BTreeMap::new(),
            node_states: BTreeMap::new(),
            service_states: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            txn: Txn::default(),
            mac_allocator: MacAllocator::new(),
            memif_allocator: MemifIdAllocator::new(),
            ipam_allocators: BTreeMap::new(),
            vni_allocators: BTreeMap::new(),
            mesh_loopback_addresses: BTreeMap::new(),
        }
    }

    /// Drop every cached record and reset every allocator, keeping the
    /// datastore handle. Used by clean mode.
    pub(crate) fn reset(&mut self) {
        debug!("resetting controller caches and allocators");
        let broker = self.broker.clone();
        *self = ControllerCore::new(broker);
    }

    /// Render every node, then every service, in entity-name order.
    pub fn render_config(&mut self) -> CoreResult {
        self.nodes_render()?;
        self.vnf_services_render()
    }
}
