// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Artifact constructors. One function per record the topology renderer can
//! emit; keys are derived here so callers never assemble them by hand.

use crate::artifact::keys;
use crate::artifact::{
    Artifact, ArtifactSpec, BridgeDomainSpec, BridgeInterface, IfSpecType, InterfaceSpec,
    LinuxInterfaceSpec, MemifSpec, RouteSpec, VxlanSpec, XConnectSpec,
};
use crate::system::BdParms;
use crate::types::{AdminStatus, MemifMode, RxMode};
use crate::vnf::MemifParams;
use net::{Mac, Vni};

impl Artifact {
    /// A memif interface under `agent`'s subtree. The socket file is shared
    /// with the peer agent named by `socket_agent`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn memif(
        agent: &str,
        name: &str,
        ip_addresses: Vec<String>,
        mac_address: Option<Mac>,
        mtu: u32,
        admin_status: AdminStatus,
        rx_mode: RxMode,
        memif_id: u32,
        master: bool,
        params: Option<&MemifParams>,
        socket_agent: &str,
    ) -> Artifact {
        let mode = params.map(|p| p.mode).unwrap_or(MemifMode::Ethernet);
        Artifact::new(
            keys::interface_key(agent, name),
            ArtifactSpec::Interface(InterfaceSpec {
                name: name.to_owned(),
                if_type: IfSpecType::Memif,
                ip_addresses,
                mac_address,
                mtu,
                admin_status,
                rx_mode,
                memif: Some(MemifSpec {
                    id: memif_id,
                    master,
                    mode,
                    socket_filename: format!("/var/run/memif_{socket_agent}.sock"),
                }),
                vxlan: None,
                host_if_name: None,
            }),
        )
    }

    /// A veth end rendered as a linux interface in `namespace`.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn veth(
        agent: &str,
        name: &str,
        ip_addresses: Vec<String>,
        mac_address: Option<Mac>,
        mtu: u32,
        admin_status: AdminStatus,
        host_if_name: &str,
        peer_if_name: &str,
        namespace: &str,
    ) -> Artifact {
        Artifact::new(
            keys::linux_interface_key(agent, name),
            ArtifactSpec::LinuxInterface(LinuxInterfaceSpec {
                name: name.to_owned(),
                host_if_name: host_if_name.to_owned(),
                peer_if_name: peer_if_name.to_owned(),
                namespace: namespace.to_owned(),
                ip_addresses,
                mac_address,
                mtu,
                admin_status,
            }),
        )
    }

    /// An AF_PACKET interface bound to a kernel interface.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn af_packet(
        agent: &str,
        name: &str,
        ip_addresses: Vec<String>,
        mac_address: Option<Mac>,
        mtu: u32,
        admin_status: AdminStatus,
        rx_mode: RxMode,
        host_if_name: &str,
    ) -> Artifact {
        Artifact::new(
            keys::interface_key(agent, name),
            ArtifactSpec::Interface(InterfaceSpec {
                name: name.to_owned(),
                if_type: IfSpecType::AfPacket,
                ip_addresses,
                mac_address,
                mtu,
                admin_status,
                rx_mode,
                memif: None,
                vxlan: None,
                host_if_name: Some(host_if_name.to_owned()),
            }),
        )
    }

    #[must_use]
    pub fn ethernet(
        agent: &str,
        name: &str,
        ip_addresses: Vec<String>,
        mac_address: Option<Mac>,
        mtu: u32,
        admin_status: AdminStatus,
        rx_mode: RxMode,
    ) -> Artifact {
        Artifact::new(
            keys::interface_key(agent, name),
            ArtifactSpec::Interface(InterfaceSpec {
                name: name.to_owned(),
                if_type: IfSpecType::Ethernet,
                ip_addresses,
                mac_address,
                mtu,
                admin_status,
                rx_mode,
                memif: None,
                vxlan: None,
                host_if_name: None,
            }),
        )
    }

    #[must_use]
    pub fn loopback(
        agent: &str,
        name: &str,
        ip_addresses: Vec<String>,
        mac_address: Option<Mac>,
        mtu: u32,
        admin_status: AdminStatus,
        rx_mode: RxMode,
    ) -> Artifact {
        Artifact::new(
            keys::interface_key(agent, name),
            ArtifactSpec::Interface(InterfaceSpec {
                name: name.to_owned(),
                if_type: IfSpecType::SoftwareLoopback,
                ip_addresses,
                mac_address,
                mtu,
                admin_status,
                rx_mode,
                memif: None,
                vxlan: None,
                host_if_name: None,
            }),
        )
    }

    /// A vxlan tunnel endpoint from `src_address` toward `dst_address`.
    #[must_use]
    pub fn vxlan(agent: &str, name: &str, vni: Vni, src_address: &str, dst_address: &str) -> Artifact {
        Artifact::new(
            keys::interface_key(agent, name),
            ArtifactSpec::Interface(InterfaceSpec {
                name: name.to_owned(),
                if_type: IfSpecType::VxlanTunnel,
                ip_addresses: vec![],
                mac_address: None,
                mtu: 0,
                admin_status: AdminStatus::Enabled,
                rx_mode: RxMode::default(),
                memif: None,
                vxlan: Some(VxlanSpec {
                    vni,
                    src_address: src_address.to_owned(),
                    dst_address: dst_address.to_owned(),
                }),
                host_if_name: None,
            }),
        )
    }

    #[must_use]
    pub fn bridge_domain(
        agent: &str,
        name: &str,
        interfaces: Vec<BridgeInterface>,
        parms: &BdParms,
    ) -> Artifact {
        Artifact::new(
            keys::l2bd_key(agent, name),
            ArtifactSpec::L2bd(BridgeDomainSpec {
                name: name.to_owned(),
                parms: parms.clone(),
                interfaces,
            }),
        )
    }

    /// Both directions of a cross-connect between two vswitch interfaces.
    #[must_use]
    pub fn xconnect_pair(agent: &str, if1: &str, if2: &str) -> [Artifact; 2] {
        let one_way = |rx: &str, tx: &str| {
            Artifact::new(
                keys::l2xc_key(agent, rx),
                ArtifactSpec::L2xc(XConnectSpec {
                    receive_interface: rx.to_owned(),
                    transmit_interface: tx.to_owned(),
                }),
            )
        };
        [one_way(if1, if2), one_way(if2, if1)]
    }

    #[must_use]
    pub fn static_route(agent: &str, route: RouteSpec) -> Artifact {
        let key = keys::route_key(
            agent,
            route.vrf_id,
            &route.dst_address,
            &route.next_hop_address,
        );
        Artifact::new(key, ArtifactSpec::L3vrfRoute(route))
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub fn sample_memif() -> Artifact {
        Artifact::memif(
            "vnf-a",
            "port1",
            vec!["10.1.1.1/24".to_string()],
            Some(Mac([0x02, 0, 0, 0, 0, 1])),
            1500,
            AdminStatus::Enabled,
            RxMode::Interrupt,
            1,
            false,
            None,
            "n1",
        )
    }
}
