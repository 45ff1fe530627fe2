// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Connection topology rendering: endpoint resolution, per-endpoint
//! interface pairs (VNF side + vswitch side), and interface identity
//! resolution (MAC / addresses / memif id) backed by the allocators.

pub mod hub_spoke;
pub mod l2mp;
pub mod l2pp;
pub mod vxlan_mesh;

use crate::cache::ControllerCore;
use config::artifact::Artifact;
use config::service::Connection;
use config::types::{IfType, VnfType};
use config::vnf::Interface;
use config::{CoreError, CoreResult, EntityState, InterfaceState, VnfService, keys};
use tracing::debug;

/// A connection endpoint resolved against the binding map and the service's
/// VNF list.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub vnf: String,
    pub node: String,
    pub iface: Interface,
    pub vnf_type: VnfType,
}

impl ControllerCore {
    /// Resolve every endpoint of `conn` to a node. Any unresolved endpoint
    /// appends a diagnostic and fails the connection.
    pub(crate) fn resolve_endpoints(
        &self,
        vs: &VnfService,
        conn: &Connection,
        state: &mut EntityState,
    ) -> CoreResult<Vec<Endpoint>> {
        let mut endpoints = Vec::with_capacity(conn.endpoints.len());
        let mut first_failure = None;

        for ep in &conn.endpoints {
            let Some(binding) = self.bindings.get(&ep.vnf).filter(|b| !b.node.is_empty()) else {
                let err = CoreError::Unresolved {
                    vnf: ep.vnf.clone(),
                    interface: ep.interface.clone(),
                };
                state.append_msg(err.to_string());
                first_failure.get_or_insert(err);
                continue;
            };
            if !self.nodes.contains_key(&binding.node) {
                let err = CoreError::UnknownNode {
                    vnf: ep.vnf.clone(),
                    interface: ep.interface.clone(),
                    node: binding.node.clone(),
                };
                state.append_msg(err.to_string());
                first_failure.get_or_insert(err);
                continue;
            }
            // endpoint membership was validated at create time
            let Some((vnf, iface)) = vs.find_vnf_interface(&ep.vnf, &ep.interface) else {
                let err = CoreError::EndpointNotInService {
                    service: vs.name.clone(),
                    vnf: ep.vnf.clone(),
                    interface: ep.interface.clone(),
                };
                state.append_msg(err.to_string());
                first_failure.get_or_insert(err);
                continue;
            };
            endpoints.push(Endpoint {
                vnf: ep.vnf.clone(),
                node: binding.node.clone(),
                iface: iface.clone(),
                vnf_type: vnf.vnf_type,
            });
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(endpoints),
        }
    }

    /// Render the VNF-side / vswitch-side artifact pair for one endpoint on
    /// `agent`, returning the vswitch-side interface name.
    pub(crate) fn render_interface_pair(
        &mut self,
        vs: &VnfService,
        agent: &str,
        ep: &Endpoint,
        state: &mut EntityState,
    ) -> CoreResult<String> {
        match ep.iface.if_type {
            IfType::Memif => self.render_memif_pair(vs, agent, ep, state),
            IfType::Veth => self.render_veth_afp_pair(vs, agent, ep, state),
            other => {
                let err = CoreError::Unsupported(format!(
                    "connection endpoint {}/{} of type '{other}'",
                    ep.vnf, ep.iface.name
                ));
                state.append_msg(err.to_string());
                Err(err)
            }
        }
    }

    fn render_memif_pair(
        &mut self,
        vs: &VnfService,
        agent: &str,
        ep: &Endpoint,
        state: &mut EntityState,
    ) -> CoreResult<String> {
        let mut if_state = self.init_interface_state(vs, agent, ep)?;
        if if_state.memif_id == 0 {
            if_state.memif_id = self.memif_allocator.allocate();
        }
        self.persist_interface_state(&if_state)?;

        // VNF side: slave, carries the resolved identity
        let artifact = Artifact::memif(
            &ep.vnf,
            &ep.iface.name,
            if_state.ip_addresses.clone(),
            if_state.mac_address,
            self.resolve_mtu(ep.iface.mtu),
            ep.iface.admin_status,
            self.resolve_rx_mode(ep.iface.rx_mode),
            if_state.memif_id,
            false,
            ep.iface.memif_params.as_ref(),
            agent,
        );
        self.stage(state, artifact);

        // vswitch side: master, no addresses
        let if_name = format!("IF_MEMIF_VSWITCH_{}_{}", ep.vnf, ep.iface.name);
        let artifact = Artifact::memif(
            agent,
            &if_name,
            vec![],
            None,
            self.resolve_mtu(ep.iface.mtu),
            ep.iface.admin_status,
            self.resolve_rx_mode(ep.iface.rx_mode),
            if_state.memif_id,
            true,
            ep.iface.memif_params.as_ref(),
            agent,
        );
        self.stage(state, artifact);

        debug!("memif pair for {}/{} on '{agent}'", ep.vnf, ep.iface.name);
        Ok(if_name)
    }

    /// Two memifs joined directly with a shared id, no vswitch in between.
    pub(crate) fn render_direct_memif_pair(
        &mut self,
        vs: &VnfService,
        endpoints: &[Endpoint],
        state: &mut EntityState,
    ) -> CoreResult {
        let (first, second) = (&endpoints[0], &endpoints[1]);

        let mut if0_state = self.init_interface_state(vs, &first.node, first)?;
        if if0_state.memif_id == 0 {
            if0_state.memif_id = self.memif_allocator.allocate();
        }
        self.persist_interface_state(&if0_state)?;

        let artifact = Artifact::memif(
            &first.vnf,
            &first.iface.name,
            if0_state.ip_addresses.clone(),
            if0_state.mac_address,
            self.resolve_mtu(first.iface.mtu),
            first.iface.admin_status,
            self.resolve_rx_mode(first.iface.rx_mode),
            if0_state.memif_id,
            false,
            first.iface.memif_params.as_ref(),
            &second.vnf,
        );
        self.stage(state, artifact);

        let mut if1_state = self.init_interface_state(vs, &second.node, second)?;
        if1_state.memif_id = if0_state.memif_id;
        self.persist_interface_state(&if1_state)?;

        let artifact = Artifact::memif(
            &second.vnf,
            &second.iface.name,
            if1_state.ip_addresses.clone(),
            if1_state.mac_address,
            self.resolve_mtu(second.iface.mtu),
            second.iface.admin_status,
            self.resolve_rx_mode(second.iface.rx_mode),
            if1_state.memif_id,
            true,
            second.iface.memif_params.as_ref(),
            &second.vnf,
        );
        self.stage(state, artifact);

        debug!(
            "direct memif pair {}/{} <-> {}/{} (id {})",
            first.vnf, first.iface.name, second.vnf, second.iface.name, if0_state.memif_id
        );
        Ok(())
    }

    /// Veth pair into the VNF container plus AF_PACKET binding on the
    /// vswitch; VPP containers also get a VNF-side AF_PACKET.
    fn render_veth_afp_pair(
        &mut self,
        vs: &VnfService,
        agent: &str,
        ep: &Endpoint,
        state: &mut EntityState,
    ) -> CoreResult<String> {
        let if_state = self.init_interface_state(vs, agent, ep)?;
        self.persist_interface_state(&if_state)?;

        // Kernel limit IFNAMSIZ bounds host interface names to 15 chars
        let veth1_name = format!("IF_VETH_VNF_{}_{}", ep.vnf, ep.iface.name);
        let veth2_name = format!("IF_VETH_VSWITCH_{}_{}", ep.vnf, ep.iface.name);
        let host1_name = ep.iface.name.clone();
        let host2_name = base_host_name(&ep.vnf, &ep.iface.name);

        // VPP containers terminate addressing on the af-packet instead
        let veth_addresses = if ep.vnf_type == VnfType::VppContainer {
            vec![]
        } else {
            if_state.ip_addresses.clone()
        };

        let artifact = Artifact::veth(
            agent,
            &veth1_name,
            veth_addresses,
            if_state.mac_address,
            self.resolve_mtu(ep.iface.mtu),
            ep.iface.admin_status,
            &host1_name,
            &veth2_name,
            &ep.vnf,
        );
        self.stage(state, artifact);

        let artifact = Artifact::veth(
            agent,
            &veth2_name,
            vec![],
            None,
            self.resolve_mtu(ep.iface.mtu),
            ep.iface.admin_status,
            &host2_name,
            &veth1_name,
            agent,
        );
        self.stage(state, artifact);

        if ep.vnf_type == VnfType::VppContainer {
            let artifact = Artifact::af_packet(
                &ep.vnf,
                &ep.iface.name,
                if_state.ip_addresses.clone(),
                if_state.mac_address,
                self.resolve_mtu(ep.iface.mtu),
                ep.iface.admin_status,
                self.resolve_rx_mode(ep.iface.rx_mode),
                &host1_name,
            );
            self.stage(state, artifact);
        }

        let if_name = format!("IF_AFPIF_VSWITCH_{}_{}", ep.vnf, ep.iface.name);
        let artifact = Artifact::af_packet(
            agent,
            &if_name,
            vec![],
            None,
            self.resolve_mtu(ep.iface.mtu),
            ep.iface.admin_status,
            self.resolve_rx_mode(ep.iface.rx_mode),
            &host2_name,
        );
        self.stage(state, artifact);

        debug!("veth/afp pair for {}/{} on '{agent}'", ep.vnf, ep.iface.name);
        Ok(if_name)
    }

    /// Resolve the endpoint's identity against its cached interface state:
    /// declared values pin, cached values stick, absent values allocate.
    fn init_interface_state(
        &mut self,
        vs: &VnfService,
        agent: &str,
        ep: &Endpoint,
    ) -> CoreResult<InterfaceState> {
        let cache_key = InterfaceState::cache_key(&ep.vnf, &ep.iface.name);
        let mut if_state =
            self.interface_states
                .get(&cache_key)
                .cloned()
                .unwrap_or_else(|| InterfaceState {
                    vnf: ep.vnf.clone(),
                    interface: ep.iface.name.clone(),
                    ..InterfaceState::default()
                });
        if_state.node = agent.to_owned();

        match &ep.iface.mac_address {
            None => {
                if if_state.mac_address.is_none() {
                    if_state.mac_address = Some(self.mac_allocator.allocate());
                }
            }
            Some(declared) => {
                if if_state.mac_address != Some(*declared) {
                    if_state.mac_address = Some(*declared);
                }
            }
        }

        if ep.iface.ip_addresses.is_empty() {
            if if_state.ip_addresses.is_empty() {
                if let Some(pool_name) = &ep.iface.ipam_pool_name {
                    let pool_name = pool_name.clone();
                    let (_, cidr) = self.ipam_allocate_scoped(&pool_name, agent, &vs.name)?;
                    if_state.ip_addresses = vec![cidr];
                }
            }
        } else if !address_sets_equal(&if_state.ip_addresses, &ep.iface.ip_addresses) {
            if_state.ip_addresses = ep.iface.ip_addresses.clone();
        }

        Ok(if_state)
    }

    fn persist_interface_state(&mut self, if_state: &InterfaceState) -> CoreResult {
        self.broker.put(
            &keys::interface_state_key(&if_state.vnf, &if_state.interface),
            if_state,
        )?;
        self.interface_states.insert(
            InterfaceState::cache_key(&if_state.vnf, &if_state.interface),
            if_state.clone(),
        );
        Ok(())
    }
}

/// Order-insensitive comparison of two address lists.
fn address_sets_equal(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|addr| b.contains(addr))
}

/// First `n` and last `m` characters of `s` (all of it when short enough).
fn first_n_last_m(n: usize, m: usize, s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= n + m {
        return s.to_owned();
    }
    let mut out = String::with_capacity(n + m);
    out.extend(&chars[..n]);
    out.extend(&chars[chars.len() - m..]);
    out
}

/// Compress `(container, port)` into a host interface name that fits the
/// 15-char kernel limit. The container gets an 8-char budget split 4+4, the
/// port 7 split 3+4; a short side donates its unused budget to the other.
pub(crate) fn base_host_name(container: &str, port: &str) -> String {
    let mut cb = 4;
    let mut ce = 4;
    let mut pb = 3;
    let mut pe = 4;

    if container.len() < 8 {
        match container.len() {
            7 => pb += 1,
            6 => {
                pb += 1;
                pe += 1;
            }
            5 => {
                pb += 2;
                pe += 1;
            }
            4 => {
                pb += 2;
                pe += 2;
            }
            3 => {
                pb += 3;
                pe += 2;
            }
            2 => {
                pb += 3;
                pe += 3;
            }
            1 => {
                pb += 4;
                pe += 3;
            }
            _ => {}
        }
    }
    if port.len() < 7 {
        match port.len() {
            6 => cb += 1,
            5 => {
                cb += 1;
                ce += 1;
            }
            4 => {
                cb += 2;
                ce += 1;
            }
            3 => {
                cb += 2;
                ce += 2;
            }
            2 => {
                cb += 3;
                ce += 2;
            }
            1 => {
                cb += 3;
                ce += 3;
            }
            _ => {}
        }
    }

    format!(
        "{}{}",
        first_n_last_m(cb, ce, container),
        first_n_last_m(pb, pe, port)
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(base_host_name("vnf1", "port1"), "vnf1port1");
    }

    #[test]
    fn long_names_fit_kernel_limit() {
        let name = base_host_name("a-very-long-container-name", "a-very-long-port-name");
        assert!(name.len() <= 15, "{name} exceeds IFNAMSIZ budget");
    }

    #[test]
    fn long_container_keeps_ends() {
        // long container, short port: container budget grows
        let name = base_host_name("forwarder-alpha", "p1");
        assert!(name.len() <= 15);
        assert!(name.starts_with("forward"));
        assert!(name.contains("p1"));
    }

    #[test]
    fn compression_is_deterministic() {
        let a = base_host_name("container-zulu", "port-9000");
        let b = base_host_name("container-zulu", "port-9000");
        assert_eq!(a, b);
    }

    #[test]
    fn address_set_comparison_ignores_order() {
        let a = vec!["10.0.0.1/24".to_string(), "10.0.1.1/24".to_string()];
        let b = vec!["10.0.1.1/24".to_string(), "10.0.0.1/24".to_string()];
        assert!(address_sets_equal(&a, &b));
        assert!(!address_sets_equal(&a, &a[..1].to_vec()));
    }
}
