// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::AllocError;
use net::Vni;
use std::collections::BTreeMap;

/// Bounded VXLAN VNI allocator, one per vxlan-mesh service mesh.
///
/// Allocations are keyed by a logical owner (the connection the VNI is
/// issued for) so that re-rendering the same connection yields the same
/// VNI instead of burning through the range.
#[derive(Debug)]
pub struct VniAllocator {
    name: String,
    end: u32,
    next: u32,
    owners: BTreeMap<String, Vni>,
}

impl VniAllocator {
    #[must_use]
    pub fn new(name: &str, start: u32, end: u32) -> Self {
        Self {
            name: name.to_owned(),
            end,
            next: start,
            owners: BTreeMap::new(),
        }
    }

    /// Allocate a VNI for `owner`, or return the VNI already issued to it.
    pub fn allocate_for(&mut self, owner: &str) -> Result<Vni, AllocError> {
        if let Some(vni) = self.owners.get(owner) {
            return Ok(*vni);
        }
        if self.next > self.end {
            return Err(AllocError::ExhaustedPool(self.name.clone()));
        }
        let vni = Vni::new_checked(self.next)
            .map_err(|_| AllocError::ExhaustedPool(self.name.clone()))?;
        self.next += 1;
        self.owners.insert(owner.to_owned(), vni);
        Ok(vni)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stable_per_owner() {
        let mut alloc = VniAllocator::new("mesh-a", 100, 200);
        let first = alloc.allocate_for("svc/0").unwrap();
        let second = alloc.allocate_for("svc/1").unwrap();
        assert_eq!(first.as_u32(), 100);
        assert_eq!(second.as_u32(), 101);
        // repeated request for the same owner returns the same vni
        assert_eq!(alloc.allocate_for("svc/0").unwrap(), first);
        assert_eq!(alloc.allocate_for("svc/1").unwrap(), second);
    }

    #[test]
    fn exhausts() {
        let mut alloc = VniAllocator::new("mesh-b", 10, 11);
        alloc.allocate_for("a").unwrap();
        alloc.allocate_for("b").unwrap();
        assert_eq!(
            alloc.allocate_for("c").unwrap_err(),
            AllocError::ExhaustedPool("mesh-b".to_string())
        );
        // existing owners are still served after exhaustion
        assert_eq!(alloc.allocate_for("a").unwrap().as_u32(), 10);
    }
}
