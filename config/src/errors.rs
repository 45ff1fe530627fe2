// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Failure type shared by every controller operation.
//!
//! Validation variants are reported synchronously to the caller before a
//! transaction commits. Render-time variants (unresolved endpoints,
//! exhausted pools, unsupported combinations) become service diagnostics
//! and never abort a transaction.

use datastore::StoreError;
use idalloc::AllocError;
use thiserror::Error;

/// The reasons a controller operation may fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ---- validation -----------------------------------------------------
    #[error("missing identifier: {0}")]
    MissingIdentifier(&'static str),
    #[error("node '{0}' can model one vswitch with interfaces, or several with vswitches, not both")]
    NodeVswitchShape(String),
    #[error("node/if {owner}/{interface} has invalid interface type '{if_type}'")]
    BadNodeInterfaceType {
        owner: String,
        interface: String,
        if_type: String,
    },
    #[error("vswitch '{0}' has invalid type '{1}'")]
    BadVswitchType(String, String),
    #[error("vnf-service/vnf {service}/{vnf} has invalid vnf type '{vnf_type}'")]
    BadVnfType {
        service: String,
        vnf: String,
        vnf_type: String,
    },
    #[error("vnf-service/vnf {service}/{vnf} has no interfaces")]
    VnfWithoutInterfaces { service: String, vnf: String },
    #[error("vnf-service/if {service}/{interface} has invalid interface type '{if_type}'")]
    BadVnfInterfaceType {
        service: String,
        interface: String,
        if_type: String,
    },
    #[error("'{0}' is not a valid IPv4 address with prefix (a.b.c.d/len)")]
    BadAddress(String),
    #[error("vnf-service '{0}' has no vnfs")]
    ServiceWithoutVnfs(String),
    #[error("vnf-service '{service}': l2pp connection must have exactly 2 endpoints")]
    L2ppArity { service: String },
    #[error("vnf-service '{service}': l2mp connection must have at least one endpoint")]
    L2mpArity { service: String },
    #[error("vnf-service '{service}': connection endpoint {vnf}/{interface} not found in the service's vnf list")]
    EndpointNotInService {
        service: String,
        vnf: String,
        interface: String,
    },
    #[error("{owner}: cannot both reference a node l2bd and carry inline l2bd parameters")]
    L2bdConflict { owner: String },
    #[error("{owner}: l2bd cannot reference a template and carry parameters")]
    L2bdTemplateConflict { owner: String },
    #[error("{owner}: reference to non-existent l2bd template '{template}'")]
    UnknownL2bdTemplate { owner: String, template: String },
    #[error("{owner}: l2bd has neither parameters nor a template reference")]
    L2bdUnderspecified { owner: String },
    #[error("vnf service mesh '{0}' vxlan mesh parameters not specified")]
    MissingMeshParams(String),
    #[error("vnf service mesh '{0}' vxlan hub-and-spoke parameters not specified")]
    MissingHubAndSpokeParams(String),
    #[error("vnf service mesh '{0}' vxlan vni range invalid")]
    BadVniRange(String),
    #[error("vnf service mesh '{0}' vxlan vni invalid")]
    BadMeshVni(String),
    #[error("invalid rx-mode setting '{0}'")]
    BadRxMode(String),

    // ---- render-time ----------------------------------------------------
    #[error("connection segment {vnf}/{interface}: vnf not mapped to a node")]
    Unresolved { vnf: String, interface: String },
    #[error("connection segment {vnf}/{interface}: vnf references non-existent node '{node}'")]
    UnknownNode {
        vnf: String,
        interface: String,
        node: String,
    },
    #[error("vnf-service '{service}': inter-node connection without a service mesh")]
    MissingServiceMesh { service: String },
    #[error("vnf-service '{service}': reference to missing vnf service mesh '{mesh}'")]
    UnknownServiceMesh { service: String, mesh: String },
    #[error("service mesh '{mesh}': hub node '{hub}' not found")]
    UnknownHubNode { mesh: String, hub: String },
    #[error("{owner}: reference to missing node/l2bd {node}/{l2bd}")]
    UnknownNodeL2bd {
        owner: String,
        node: String,
        l2bd: String,
    },
    #[error("cannot find ipam pool '{0}'")]
    UnknownIpamPool(String),
    #[error("ipam pool '{pool}': no allocator '{allocator}' instantiated")]
    UnknownPoolAllocator { pool: String, allocator: String },
    #[error("ipam pool '{0}' scope not recognized")]
    BadPoolScope(String),
    #[error("not supported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Alloc(#[from] AllocError),

    // ---- infrastructure -------------------------------------------------
    #[error(transparent)]
    Datastore(#[from] StoreError),
    #[error("a transaction is already in progress")]
    NestedTransaction,
    #[error("no transaction is in progress")]
    NoTransaction,
}

/// Result alias used across the controller crates.
pub type CoreResult<T = ()> = Result<T, CoreError>;
