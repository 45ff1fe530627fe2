// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Small, checked network value types shared by the controller crates.

#![deny(unsafe_code, clippy::all)]

pub mod mac;
pub mod vni;

pub use mac::{Mac, MacFromStringError};
pub use vni::{InvalidVni, Vni};
