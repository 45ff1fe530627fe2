// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Node operations. A node render emits the node's ethernet interfaces and
//! node-level bridge domains; the vxlan helpers here also render the
//! loopback and static routes every overlay endpoint needs.

use crate::cache::ControllerCore;
use config::artifact::{Artifact, keys as akeys};
use config::node::node_l2bd_name;
use config::types::{AdminStatus, IfType, OperStatus, PoolScope, strip_prefix_len};
use config::vnf::Interface;
use config::{CoreResult, EntityState, Node, RenderedArtifact, keys};
use tracing::{debug, info, warn};

fn label_matches(iface: &Interface, label: &str, interface_count: usize) -> bool {
    // a node with a single ethernet interface does not need the label
    iface.custom_labels.iter().any(|l| l == label) || interface_count == 1
}

impl ControllerCore {
    pub(crate) fn node_create(&mut self, node: Node, render: bool) -> CoreResult {
        node.validate(&self.sys)?;
        if render {
            self.render_node(&node)?;
        }
        self.broker.put(&keys::node_key(&node.name), &node)?;
        let name = node.name.clone();
        self.nodes.insert(name.clone(), node);

        // a new node may need node-scoped pool allocators
        self.ipam_pool_entity_create(PoolScope::Node, &name);
        Ok(())
    }

    pub(crate) fn node_delete(&mut self, name: &str) -> CoreResult {
        if self.nodes.remove(name).is_none() {
            return Ok(());
        }
        info!("deleting node '{name}'");
        self.broker.delete(&keys::node_key(name))?;

        // nothing re-stages these keys, so commit removes every artifact
        // the node had rendered
        if let Some(state) = self.node_states.remove(name) {
            self.txn_capture_before(&state.rendered_entries);
        }
        self.broker.delete(&keys::node_status_key(name))?;

        self.vnf_services_render()?;
        self.ipam_pool_entity_delete(PoolScope::Node, name);
        Ok(())
    }

    pub(crate) fn nodes_render(&mut self) -> CoreResult {
        let nodes: Vec<Node> = self.nodes.values().cloned().collect();
        for node in nodes {
            self.render_node(&node)?;
        }
        Ok(())
    }

    /// Render one node: capture its previous manifest, emit its artifacts,
    /// publish the refreshed node state.
    pub(crate) fn render_node(&mut self, node: &Node) -> CoreResult {
        if let Some(state) = self.node_states.get(&node.name) {
            let manifest = state.rendered_entries.clone();
            self.txn_capture_before(&manifest);
        }
        self.node_states.remove(&node.name);

        let mut state = EntityState::new(&node.name);

        if let Err(e) = self.render_node_inner(node, &mut state) {
            state.append_msg(e.to_string());
        }

        if state.msgs.is_empty() {
            state.append_msg("OK");
            state.oper_status = OperStatus::Up;
        } else {
            self.txn_cleanup_rendering();
            state.rendered_entries.clear();
            state.oper_status = OperStatus::Down;
            warn!("node '{}' down: {:?}", node.name, state.msgs);
        }

        self.broker.put(&keys::node_status_key(&node.name), &state)?;
        self.node_states.insert(node.name.clone(), state);
        Ok(())
    }

    fn render_node_inner(&mut self, node: &Node, state: &mut EntityState) -> CoreResult {
        // interfaces of the single implicit vswitch
        if !node.interfaces.is_empty() {
            self.render_node_interfaces(&node.name, &node.interfaces, state);
        }
        // interfaces of each named vswitch
        for vswitch in &node.vswitches {
            self.render_node_interfaces(&vswitch.name, &vswitch.interfaces, state);
        }
        self.render_node_l2bds(node, state)
    }

    fn render_node_interfaces(
        &mut self,
        agent: &str,
        interfaces: &[Interface],
        state: &mut EntityState,
    ) {
        for iface in interfaces {
            if iface.if_type != IfType::Ethernet {
                continue;
            }
            let artifact = Artifact::ethernet(
                agent,
                &iface.name,
                iface.ip_addresses.clone(),
                iface.mac_address,
                self.resolve_mtu(iface.mtu),
                iface.admin_status,
                self.resolve_rx_mode(iface.rx_mode),
            );
            debug!("node '{agent}': ethernet '{}'", iface.name);
            self.stage(state, artifact);
        }
    }

    fn render_node_l2bds(&mut self, node: &Node, state: &mut EntityState) -> CoreResult {
        for l2bd in &node.l2bds {
            let parms = match &l2bd.l2bd_template {
                Some(template) => self.find_l2bd_template(template).ok_or_else(|| {
                    config::CoreError::UnknownL2bdTemplate {
                        owner: format!("node {}", node.name),
                        template: template.clone(),
                    }
                })?,
                None => l2bd
                    .bd_parms
                    .clone()
                    .unwrap_or_else(|| self.default_bd_parms()),
            };
            let artifact = Artifact::bridge_domain(
                &node.name,
                &node_l2bd_name(&node.name, &l2bd.name),
                vec![],
                &parms,
            );
            debug!("node '{}': l2bd '{}'", node.name, l2bd.name);
            self.stage(state, artifact);
        }
        Ok(())
    }

    /// Render the loopback carrying a node's vxlan endpoint address plus
    /// the static routes toward the remote endpoint, selecting the physical
    /// path by the mesh's outgoing-interface label.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn render_vxlan_static_routes(
        &mut self,
        manifest: &mut Vec<RenderedArtifact>,
        from_node: &str,
        to_node: &str,
        from_cidr: &str,
        to_bare: &str,
        outgoing_label: &str,
    ) -> CoreResult {
        let Some(n1) = self.nodes.get(from_node).cloned() else {
            return Ok(());
        };

        let loopback = Artifact::loopback(
            from_node,
            &format!("IF_VXLAN_LOOPBACK_{from_node}"),
            vec![from_cidr.to_owned()],
            None,
            self.sys.mtu,
            AdminStatus::Enabled,
            self.sys.rx_mode,
        );
        self.txn_add_after(manifest, loopback);

        let Some(n2) = self.nodes.get(to_node).cloned() else {
            return Ok(());
        };

        for n1_iface in &n1.interfaces {
            if n1_iface.if_type != IfType::Ethernet
                || !label_matches(n1_iface, outgoing_label, n1.interfaces.len())
            {
                continue;
            }
            for n2_iface in &n2.interfaces {
                if n2_iface.if_type != IfType::Ethernet
                    || !label_matches(n2_iface, outgoing_label, n2.interfaces.len())
                {
                    continue;
                }
                let Some(next_hop) = n2_iface.ip_addresses.first() else {
                    warn!(
                        "node/if {to_node}/{}: no address, skipping static route",
                        n2_iface.name
                    );
                    continue;
                };
                let route = Artifact::static_route(
                    from_node,
                    config::artifact::RouteSpec {
                        vrf_id: 0,
                        description: format!("L3VRF_VXLAN Node:{from_node} to Node:{to_node}"),
                        dst_address: format!("{to_bare}/32"),
                        next_hop_address: strip_prefix_len(next_hop).to_owned(),
                        outgoing_interface: n1_iface.name.clone(),
                        weight: self.sys.default_static_route_weight,
                        preference: self.sys.default_static_route_preference,
                    },
                );
                self.txn_add_after(manifest, route);
            }
        }
        Ok(())
    }

    /// Find the staged artifact of a node-level bridge domain in the open
    /// transaction. Only the current transaction is consulted: joining a
    /// node l2bd requires the node to have been rendered in this span.
    pub(crate) fn find_staged_node_l2bd(&self, node: &str, l2bd: &str) -> Option<&Artifact> {
        let key = akeys::l2bd_key(node, &node_l2bd_name(node, l2bd));
        self.txn.after.get(&key)
    }
}
