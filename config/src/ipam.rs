// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Named IPv4 address pools, scoped system-, node- or service-wide.

use crate::errors::{CoreError, CoreResult};
use crate::types::{PoolScope, parse_ipv4_cidr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamPool {
    pub name: String,
    pub scope: PoolScope,
    /// IPv4 CIDR, e.g. `10.0.0.0/24`.
    pub network: String,
    /// Host index window within the network, inclusive.
    pub start_range: u32,
    pub end_range: u32,
}

impl IpamPool {
    pub fn validate(&self) -> CoreResult {
        if self.name.is_empty() {
            return Err(CoreError::MissingIdentifier("ipam pool name"));
        }
        parse_ipv4_cidr(&self.network)?;
        Ok(())
    }

    /// The allocator name for this pool scoped to `entity`, one allocator
    /// per `(pool, scope entity)` pair.
    #[must_use]
    pub fn allocator_name(&self, entity: &str) -> String {
        match self.scope {
            PoolScope::System => format!("/{}/{}", self.scope, self.name),
            PoolScope::Node | PoolScope::VnfService => {
                format!("/{}/{}/{}", self.scope, self.name, entity)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scope_key_shapes() {
        let mut pool = IpamPool {
            name: "loopbacks".to_string(),
            scope: PoolScope::System,
            network: "10.0.0.0/24".to_string(),
            start_range: 1,
            end_range: 10,
        };
        assert_eq!(pool.allocator_name("ignored"), "/system/loopbacks");
        pool.scope = PoolScope::Node;
        assert_eq!(pool.allocator_name("n1"), "/node/loopbacks/n1");
        pool.scope = PoolScope::VnfService;
        assert_eq!(pool.allocator_name("svc"), "/vnf-service/loopbacks/svc");
    }

    #[test]
    fn network_must_be_cidr() {
        let pool = IpamPool {
            name: "p".to_string(),
            scope: PoolScope::System,
            network: "10.0.0.0".to_string(),
            start_range: 1,
            end_range: 2,
        };
        assert!(pool.validate().is_err());
    }
}
