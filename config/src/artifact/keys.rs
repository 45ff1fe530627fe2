// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Artifact key tree. Each node (and each VNF running its own agent) owns a
//! forwarder subtree that its agent watches; the controller only ever
//! writes below these prefixes.

/// Subtree owned by one forwarder agent.
#[must_use]
pub fn forwarder_prefix(agent: &str) -> String {
    format!("/forwarder/{agent}/")
}

#[must_use]
pub fn interface_key(agent: &str, name: &str) -> String {
    format!("{}vpp/interface/{name}", forwarder_prefix(agent))
}

#[must_use]
pub fn linux_interface_key(agent: &str, name: &str) -> String {
    format!("{}linux/interface/{name}", forwarder_prefix(agent))
}

#[must_use]
pub fn l2bd_key(agent: &str, name: &str) -> String {
    format!("{}vpp/l2bd/{name}", forwarder_prefix(agent))
}

/// Cross-connects are keyed by their receive interface; there is at most
/// one transmit target per receive interface.
#[must_use]
pub fn l2xc_key(agent: &str, receive_interface: &str) -> String {
    format!("{}vpp/l2xc/{receive_interface}", forwarder_prefix(agent))
}

#[must_use]
pub fn route_key(agent: &str, vrf_id: u32, dst: &str, next_hop: &str) -> String {
    format!("{}vpp/vrf/{vrf_id}/route/{dst}/{next_hop}", forwarder_prefix(agent))
}
