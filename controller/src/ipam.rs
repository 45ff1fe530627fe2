// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IPAM pool operations and the scoped allocator set.
//!
//! A pool of system scope has one allocator; node scope has one per node;
//! vnf-service scope one per service. Allocators are instantiated eagerly
//! from both directions: when a pool is created, for every matching entity
//! that already exists, and when a node or service is created, for every
//! matching pool that already exists.

use crate::cache::ControllerCore;
use config::types::PoolScope;
use config::{CoreError, CoreResult, IpamPool, keys};
use idalloc::Ipv4Pool;
use tracing::debug;

impl ControllerCore {
    pub(crate) fn ipam_pool_create(&mut self, pool: IpamPool, render: bool) -> CoreResult {
        pool.validate()?;
        self.broker.put(&keys::ipam_pool_key(&pool.name), &pool)?;
        self.ipam_pools.insert(pool.name.clone(), pool.clone());

        match pool.scope {
            PoolScope::System => self.ensure_pool_allocator(&pool, ""),
            PoolScope::Node => {
                let nodes: Vec<String> = self.nodes.keys().cloned().collect();
                for node in nodes {
                    self.ensure_pool_allocator(&pool, &node);
                }
            }
            PoolScope::VnfService => {
                let services: Vec<String> = self.services.keys().cloned().collect();
                for service in services {
                    self.ensure_pool_allocator(&pool, &service);
                }
            }
        }

        if render {
            self.render_config()?;
        }
        Ok(())
    }

    /// A node or service was created: make sure a scoped allocator exists
    /// for every matching pool.
    pub(crate) fn ipam_pool_entity_create(&mut self, scope: PoolScope, entity: &str) {
        let matching: Vec<IpamPool> = self
            .ipam_pools
            .values()
            .filter(|p| p.scope == scope)
            .cloned()
            .collect();
        for pool in matching {
            self.ensure_pool_allocator(&pool, entity);
        }
    }

    /// A node or service was deleted: discard its scoped allocators.
    pub(crate) fn ipam_pool_entity_delete(&mut self, scope: PoolScope, entity: &str) {
        let doomed: Vec<String> = self
            .ipam_pools
            .values()
            .filter(|p| p.scope == scope)
            .map(|p| p.allocator_name(entity))
            .collect();
        for name in doomed {
            if self.ipam_allocators.remove(&name).is_some() {
                debug!("discarded ipam allocator '{name}'");
            }
        }
    }

    fn ensure_pool_allocator(&mut self, pool: &IpamPool, entity: &str) {
        let allocator_name = pool.allocator_name(entity);
        if self.ipam_allocators.contains_key(&allocator_name) {
            return;
        }
        match Ipv4Pool::new(&pool.name, &pool.network, pool.start_range, pool.end_range) {
            Ok(allocator) => {
                debug!("instantiated ipam allocator '{allocator_name}'");
                self.ipam_allocators.insert(allocator_name, allocator);
            }
            Err(e) => {
                // network was validated at pool create; a failure here means
                // the stored pool is broken, surface it loudly
                tracing::error!("cannot build allocator '{allocator_name}': {e}");
            }
        }
    }

    /// Allocate an address from `pool_name`, scoped by node or service
    /// according to the pool's scope. Returns `(bare, cidr)` forms.
    pub(crate) fn ipam_allocate_scoped(
        &mut self,
        pool_name: &str,
        node: &str,
        service: &str,
    ) -> CoreResult<(String, String)> {
        let pool = self
            .ipam_pools
            .get(pool_name)
            .ok_or_else(|| CoreError::UnknownIpamPool(pool_name.to_owned()))?;
        let entity = match pool.scope {
            PoolScope::System => "",
            PoolScope::Node => node,
            PoolScope::VnfService => service,
        };
        let allocator_name = pool.allocator_name(entity);
        let allocator = self.ipam_allocators.get_mut(&allocator_name).ok_or_else(|| {
            CoreError::UnknownPoolAllocator {
                pool: pool_name.to_owned(),
                allocator: allocator_name.clone(),
            }
        })?;
        let (addr, _) = allocator.allocate()?;
        Ok((addr.to_string(), format!("{addr}/{}", allocator.prefix_len())))
    }

    /// Look an allocator up without scoping (the form the mesh loopback
    /// path uses: loopback pools are system scope by construction).
    pub(crate) fn ipam_find_allocator(
        &mut self,
        pool_name: &str,
        entity: &str,
    ) -> CoreResult<&mut Ipv4Pool> {
        let pool = self
            .ipam_pools
            .get(pool_name)
            .ok_or_else(|| CoreError::UnknownIpamPool(pool_name.to_owned()))?;
        let allocator_name = pool.allocator_name(entity);
        self.ipam_allocators
            .get_mut(&allocator_name)
            .ok_or(CoreError::UnknownPoolAllocator {
                pool: pool_name.to_owned(),
                allocator: allocator_name,
            })
    }
}
