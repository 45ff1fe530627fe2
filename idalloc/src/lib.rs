// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Identifier and address allocators for the controller.
//!
//! Every allocator here is process-private and runs under the controller's
//! serialization lock; none of them is thread-safe on its own. They are
//! deterministic: the same sequence of requests always yields the same
//! identifiers, which keeps rendered artifacts stable across re-renders.

#![deny(unsafe_code, clippy::all)]

pub mod ipam;
pub mod mac;
pub mod memif;
pub mod vni;

pub use ipam::Ipv4Pool;
pub use mac::MacAllocator;
pub use memif::MemifIdAllocator;
pub use vni::VniAllocator;

/// The reasons an allocator may refuse a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// No free identifier / address is left in the pool.
    #[error("pool '{0}' is exhausted")]
    ExhaustedPool(String),
    /// An explicit reservation was outside the pool's configured range.
    #[error("address index {index} out of range [{start}-{end}]")]
    OutOfRange { index: u32, start: u32, end: u32 },
    /// The pool network could not be parsed as an IPv4 CIDR.
    #[error("'{0}' is not a valid IPv4 CIDR")]
    BadCidr(String),
}
