// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF service mesh operations: validation, VNI allocator lifecycle and
//! per-node loopback address allocation for vxlan endpoints.

use crate::cache::ControllerCore;
use config::{CoreResult, VnfServiceMesh, keys, types::strip_prefix_len};
use idalloc::VniAllocator;
use tracing::debug;

impl ControllerCore {
    pub(crate) fn vnf_service_mesh_create(
        &mut self,
        vsm: VnfServiceMesh,
        render: bool,
    ) -> CoreResult {
        vsm.validate()?;
        self.broker.put(&keys::vnf_service_mesh_key(&vsm.name), &vsm)?;

        if let Some(parms) = &vsm.vxlan_mesh {
            self.vni_allocators.insert(
                vsm.name.clone(),
                VniAllocator::new(&vsm.name, parms.vni_range_start, parms.vni_range_end),
            );
            debug!(
                "mesh '{}': vni allocator over [{}-{}]",
                vsm.name, parms.vni_range_start, parms.vni_range_end
            );
        }
        self.meshes.insert(vsm.name.clone(), vsm);

        // the meshing strategy may have changed under existing services
        if render {
            self.vnf_services_render()?;
        }
        Ok(())
    }

    /// The loopback address of `node` within the given pool, allocating on
    /// first use; every mesh render thereafter reuses it. Returns
    /// `(bare, cidr)` forms.
    pub(crate) fn mesh_loopback_address(
        &mut self,
        pool_name: &str,
        node: &str,
    ) -> CoreResult<(String, String)> {
        if let Some(cidr) = self.mesh_loopback_addresses.get(node) {
            return Ok((strip_prefix_len(cidr).to_owned(), cidr.clone()));
        }
        let allocator = self.ipam_find_allocator(pool_name, "")?;
        let (addr, _) = allocator.allocate()?;
        let cidr = format!("{addr}/{}", allocator.prefix_len());
        debug!("node '{node}': vxlan loopback {cidr} from pool '{pool_name}'");
        self.mesh_loopback_addresses
            .insert(node.to_owned(), cidr.clone());
        Ok((addr.to_string(), cidr))
    }
}
