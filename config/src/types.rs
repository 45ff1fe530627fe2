// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Shared enumerations of the configuration model. Kept as closed enums so
//! malformed intent fails at decode time rather than deep inside a render.

use crate::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::Ipv4Addr;

/// Interface types that may appear on nodes and VNFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfType {
    #[default]
    Ethernet,
    Loopback,
    Memif,
    Veth,
    Tap,
    VxlanTunnel,
}

impl Display for IfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IfType::Ethernet => "ethernet",
            IfType::Loopback => "loopback",
            IfType::Memif => "memif",
            IfType::Veth => "veth",
            IfType::Tap => "tap",
            IfType::VxlanTunnel => "vxlan_tunnel",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    #[default]
    Enabled,
    Disabled,
}

/// Packet receive discipline requested for an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RxMode {
    #[default]
    Interrupt,
    Polling,
    Adaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemifMode {
    #[default]
    Ethernet,
    Ip,
    PuntInject,
}

/// How two memif endpoints on the same node are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterVnfConn {
    #[default]
    Direct,
    Vswitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VnfType {
    #[serde(rename = "vppvswitch")]
    VppVswitch,
    #[serde(rename = "external")]
    External,
    #[serde(rename = "vppcontainer")]
    VppContainer,
    #[serde(rename = "nonvppcontainer")]
    NonVppContainer,
}

impl Display for VnfType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VnfType::VppVswitch => "vppvswitch",
            VnfType::External => "external",
            VnfType::VppContainer => "vppcontainer",
            VnfType::NonVppContainer => "nonvppcontainer",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnType {
    L2pp,
    L2mp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeshType {
    Mesh,
    HubAndSpoke,
}

/// Overlay encapsulation of a service mesh. Only vxlan exists today; the
/// enum keeps the wire format honest about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshConnectionType {
    #[default]
    Vxlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolScope {
    System,
    Node,
    VnfService,
}

impl Display for PoolScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PoolScope::System => "system",
            PoolScope::Node => "node",
            PoolScope::VnfService => "vnf-service",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperStatus {
    Up,
    #[default]
    Down,
}

/// Parse an `a.b.c.d/len` string, as used for every address in the model.
pub fn parse_ipv4_cidr(address: &str) -> Result<(Ipv4Addr, u8), CoreError> {
    let bad = || CoreError::BadAddress(address.to_string());
    let (addr_str, len_str) = address.split_once('/').ok_or_else(bad)?;
    let addr = addr_str.parse::<Ipv4Addr>().map_err(|_| bad())?;
    let prefix_len = len_str.parse::<u8>().map_err(|_| bad())?;
    if prefix_len > 32 {
        return Err(bad());
    }
    Ok((addr, prefix_len))
}

/// The bare address part of an `a.b.c.d/len` string.
pub fn strip_prefix_len(address: &str) -> &str {
    address.split_once('/').map_or(address, |(a, _)| a)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cidr_parse() {
        assert_eq!(
            parse_ipv4_cidr("10.0.0.1/24").unwrap(),
            (Ipv4Addr::new(10, 0, 0, 1), 24)
        );
        assert!(parse_ipv4_cidr("10.0.0.1").is_err());
        assert!(parse_ipv4_cidr("10.0.0.1/33").is_err());
        assert!(parse_ipv4_cidr("ten/8").is_err());
    }

    #[test]
    fn strip() {
        assert_eq!(strip_prefix_len("192.168.2.1/30"), "192.168.2.1");
        assert_eq!(strip_prefix_len("192.168.2.1"), "192.168.2.1");
    }

    #[test]
    fn if_type_wire_names() {
        let t: IfType = serde_json::from_str("\"vxlan_tunnel\"").unwrap();
        assert_eq!(t, IfType::VxlanTunnel);
        assert_eq!(serde_json::to_string(&IfType::Memif).unwrap(), "\"memif\"");
    }
}
