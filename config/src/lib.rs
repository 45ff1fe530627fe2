// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration model for the SFC controller. Declared intent (nodes, VNF
//! services, service meshes, IPAM pools, bindings) lives here together with
//! the derived per-entity state records and the forwarder artifact model the
//! topology renderer emits. Entities reference each other by name only;
//! resolution happens at render time.

#![deny(unsafe_code, clippy::all)]
#![allow(clippy::missing_errors_doc)]

pub mod artifact;
pub mod binding;
pub mod errors;
pub mod ipam;
pub mod keys;
pub mod mesh;
pub mod node;
pub mod service;
pub mod state;
pub mod system;
pub mod types;
pub mod vnf;

pub use binding::VnfToNodeMap;
pub use errors::{CoreError, CoreResult};
pub use ipam::IpamPool;
pub use mesh::VnfServiceMesh;
pub use node::Node;
pub use service::VnfService;
pub use state::{EntityState, InterfaceState, RenderedArtifact};
pub use system::SystemParameters;
pub use vnf::{Interface, Vnf};
