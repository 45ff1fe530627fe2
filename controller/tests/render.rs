// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end render scenarios against the in-memory datastore: intent goes
//! in through the config surface, artifacts come out under the forwarder
//! prefixes, and re-renders must be minimal.

use config::artifact::{ArtifactSpec, IfSpecType, keys as akeys};
use config::mesh::{VxlanHubAndSpokeParams, VxlanMeshParams};
use config::service::{ConnEndpoint, Connection};
use config::types::{ConnType, IfType, MeshConnectionType, MeshType, OperStatus, PoolScope, VnfType};
use config::vnf::Interface;
use config::{IpamPool, Node, Vnf, VnfService, VnfServiceMesh, VnfToNodeMap};
use controller::Controller;
use datastore::{KvStore, MemStore};
use std::sync::Arc;
use tracing_test::traced_test;

fn new_controller() -> (Controller, Arc<MemStore>) {
    let store = Arc::new(MemStore::new());
    (Controller::new(store.clone()), store)
}

fn memif_interface(name: &str) -> Interface {
    Interface {
        name: name.to_string(),
        if_type: IfType::Memif,
        ..Interface::default()
    }
}

fn vnf(name: &str, interfaces: Vec<Interface>) -> Vnf {
    Vnf {
        name: name.to_string(),
        vnf_type: VnfType::VppContainer,
        interfaces,
    }
}

fn node(name: &str, address: &str) -> Node {
    Node {
        name: name.to_string(),
        interfaces: vec![Interface {
            name: "GbE0".to_string(),
            if_type: IfType::Ethernet,
            ip_addresses: vec![address.to_string()],
            ..Interface::default()
        }],
        ..Node::default()
    }
}

fn l2pp_service(name: &str, mesh: Option<&str>) -> VnfService {
    VnfService {
        name: name.to_string(),
        vnfs: vec![
            vnf("a", vec![memif_interface("port1")]),
            vnf("b", vec![memif_interface("port1")]),
        ],
        connections: vec![Connection {
            conn_type: ConnType::L2pp,
            endpoints: vec![
                ConnEndpoint {
                    vnf: "a".to_string(),
                    interface: "port1".to_string(),
                },
                ConnEndpoint {
                    vnf: "b".to_string(),
                    interface: "port1".to_string(),
                },
            ],
            vnf_service_mesh: mesh.map(str::to_string),
            use_node_l2bd: None,
            l2bd: None,
        }],
    }
}

fn loopback_pool() -> IpamPool {
    IpamPool {
        name: "vxlan-loopbacks".to_string(),
        scope: PoolScope::System,
        network: "10.0.0.0/24".to_string(),
        start_range: 1,
        end_range: 10,
    }
}

fn vxlan_mesh(name: &str) -> VnfServiceMesh {
    VnfServiceMesh {
        name: name.to_string(),
        mesh_type: MeshType::Mesh,
        connection_type: MeshConnectionType::Vxlan,
        vxlan_mesh: Some(VxlanMeshParams {
            vni_range_start: 100,
            vni_range_end: 200,
            loopback_ipam_pool_name: "vxlan-loopbacks".to_string(),
            outgoing_interface_label: String::new(),
        }),
        vxlan_hub_and_spoke: None,
    }
}

fn bind(controller: &Controller, pairs: &[(&str, &str)]) {
    let bindings = pairs
        .iter()
        .map(|(vnf, node)| VnfToNodeMap {
            vnf: (*vnf).to_string(),
            node: (*node).to_string(),
        })
        .collect();
    controller.vnf_to_node_map_create(bindings, false).unwrap();
}

fn interface_spec(controller: &Controller, key: &str) -> config::artifact::InterfaceSpec {
    match controller.artifact(key).unwrap_or_else(|| panic!("missing artifact {key}")).spec {
        Some(ArtifactSpec::Interface(spec)) => spec,
        other => panic!("artifact {key} is not an interface: {other:?}"),
    }
}

// Scenario: two VNFs on one node, both memif, default policy: a direct
// memif pair with no vswitch interfaces, no cross-connect, no bridge.
#[test]
fn memif_direct_same_node() {
    let (controller, store) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", None), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);

    let stats = controller.render_all().unwrap();
    assert!(stats.writes > 0);

    let state = controller.vnf_service_state("v").unwrap();
    assert_eq!(state.oper_status, OperStatus::Up);
    assert_eq!(state.msgs, vec!["OK".to_string()]);

    // the two container-side memifs share id 1
    let a = interface_spec(&controller, &akeys::interface_key("a", "port1"));
    let b = interface_spec(&controller, &akeys::interface_key("b", "port1"));
    assert_eq!(a.memif.as_ref().unwrap().id, 1);
    assert_eq!(b.memif.as_ref().unwrap().id, 1);
    assert!(!a.memif.as_ref().unwrap().master);
    assert!(b.memif.as_ref().unwrap().master);

    // no vswitch memif, no cross-connect, no bridge domain anywhere
    let keys = controller.artifact_keys();
    assert!(!keys.iter().any(|k| k.contains("IF_MEMIF_VSWITCH")));
    assert!(!keys.iter().any(|k| k.contains("/l2xc/")));
    assert!(!keys.iter().any(|k| k.contains("/l2bd/")));

    // re-render with no intervening change: empty commit
    let stats = controller.render_all().unwrap();
    assert!(stats.is_empty(), "second render was not empty: {stats:?}");
    assert_eq!(store.list("/forwarder/").unwrap().len(), 3); // 2 memifs + n1 ethernet
}

// Scenario: one side forces inter-vnf-connection vswitch: both endpoints
// drop into the vswitch and get cross-connected.
#[test]
fn memif_vswitch_forced_same_node() {
    let (controller, _) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();

    let mut vs = l2pp_service("v", None);
    vs.vnfs[0].interfaces[0].memif_params = Some(config::vnf::MemifParams {
        inter_vnf_conn: config::types::InterVnfConn::Vswitch,
        ..config::vnf::MemifParams::default()
    });
    controller.vnf_service_create(vs, false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);
    controller.render_all().unwrap();

    let keys = controller.artifact_keys();
    assert!(keys.contains(&akeys::interface_key("n1", "IF_MEMIF_VSWITCH_a_port1")));
    assert!(keys.contains(&akeys::interface_key("n1", "IF_MEMIF_VSWITCH_b_port1")));
    assert!(keys.contains(&akeys::l2xc_key("n1", "IF_MEMIF_VSWITCH_a_port1")));
    assert!(keys.contains(&akeys::l2xc_key("n1", "IF_MEMIF_VSWITCH_b_port1")));
    // distinct memif ids per pair
    let a = interface_spec(&controller, &akeys::interface_key("a", "port1"));
    let b = interface_spec(&controller, &akeys::interface_key("b", "port1"));
    assert_ne!(a.memif.unwrap().id, b.memif.unwrap().id);
}

// Scenario: L2PP across two nodes over a vxlan mesh: tunnel pair with the
// first VNI of the range, loopbacks from the pool, static routes, and
// cross-connects in both directions on each node.
#[test]
#[traced_test]
fn l2pp_vxlan_mesh_inter_node() {
    let (controller, store) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.node_create(node("n2", "192.168.16.2/24"), false).unwrap();
    controller.ipam_pool_create(loopback_pool(), false).unwrap();
    controller.vnf_service_mesh_create(vxlan_mesh("m"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", Some("m")), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n2")]);

    controller.render_all().unwrap();
    let state = controller.vnf_service_state("v").unwrap();
    assert_eq!(state.oper_status, OperStatus::Up);

    let vxlan_n1 =
        "IF_VXLAN_L2PP_VSRVC_v_CONN_1_FROM_n1_a_port1_TO_n2_b_port1_VNI_100".to_string();
    let vxlan_n2 =
        "IF_VXLAN_L2PP_VSRVC_v_CONN_1_FROM_n2_b_port1_TO_n1_a_port1_VNI_100".to_string();

    let tunnel = interface_spec(&controller, &akeys::interface_key("n1", &vxlan_n1));
    let vxlan = tunnel.vxlan.unwrap();
    assert_eq!(vxlan.vni.as_u32(), 100);
    assert_eq!(vxlan.src_address, "10.0.0.1");
    assert_eq!(vxlan.dst_address, "10.0.0.2");

    let tunnel = interface_spec(&controller, &akeys::interface_key("n2", &vxlan_n2));
    let vxlan = tunnel.vxlan.unwrap();
    assert_eq!(vxlan.src_address, "10.0.0.2");
    assert_eq!(vxlan.dst_address, "10.0.0.1");

    // loopbacks carry the pool address in cidr form
    let loopback = interface_spec(&controller, &akeys::interface_key("n1", "IF_VXLAN_LOOPBACK_n1"));
    assert_eq!(loopback.if_type, IfSpecType::SoftwareLoopback);
    assert_eq!(loopback.ip_addresses, vec!["10.0.0.1/24".to_string()]);
    let loopback = interface_spec(&controller, &akeys::interface_key("n2", "IF_VXLAN_LOOPBACK_n2"));
    assert_eq!(loopback.ip_addresses, vec!["10.0.0.2/24".to_string()]);

    // static route toward the remote loopback via the single ethernet
    let route_key = akeys::route_key("n1", 0, "10.0.0.2/32", "192.168.16.2");
    let route = controller.artifact(&route_key).unwrap();
    match route.spec {
        Some(ArtifactSpec::L3vrfRoute(r)) => {
            assert_eq!(r.outgoing_interface, "GbE0");
            assert_eq!(r.preference, 5);
        }
        other => panic!("expected a route, got {other:?}"),
    }

    // cross-connects in both directions on each node
    let keys = controller.artifact_keys();
    assert!(keys.contains(&akeys::l2xc_key("n1", "IF_MEMIF_VSWITCH_a_port1")));
    assert!(keys.contains(&akeys::l2xc_key("n1", &vxlan_n1)));
    assert!(keys.contains(&akeys::l2xc_key("n2", "IF_MEMIF_VSWITCH_b_port1")));
    assert!(keys.contains(&akeys::l2xc_key("n2", &vxlan_n2)));

    // the manifest is contained in the index, and the index in the store
    let state = controller.vnf_service_state("v").unwrap();
    let keys = controller.artifact_keys();
    for entry in &state.rendered_entries {
        assert!(keys.contains(&entry.key), "manifest key {} not indexed", entry.key);
        assert!(store.get(&entry.key).unwrap().is_some());
    }

    // idempotent re-render
    let stats = controller.render_all().unwrap();
    assert!(stats.is_empty(), "second render was not empty: {stats:?}");
}

// Scenario: L2MP over a vxlan mesh, three endpoints on three nodes: per
// node one endpoint pair, two tunnels, one bridge domain joining all local
// interfaces with split horizon 1 on the tunnels, loopback and two routes.
#[test]
#[traced_test]
fn l2mp_vxlan_mesh_three_nodes() {
    let (controller, _) = new_controller();
    for (n, addr) in [
        ("n1", "192.168.16.1/24"),
        ("n2", "192.168.16.2/24"),
        ("n3", "192.168.16.3/24"),
    ] {
        controller.node_create(node(n, addr), false).unwrap();
    }
    controller.ipam_pool_create(loopback_pool(), false).unwrap();
    controller.vnf_service_mesh_create(vxlan_mesh("m"), false).unwrap();

    let vs = VnfService {
        name: "v".to_string(),
        vnfs: vec![
            vnf("a", vec![memif_interface("port1")]),
            vnf("b", vec![memif_interface("port1")]),
            vnf("c", vec![memif_interface("port1")]),
        ],
        connections: vec![Connection {
            conn_type: ConnType::L2mp,
            endpoints: ["a", "b", "c"]
                .iter()
                .map(|v| ConnEndpoint {
                    vnf: (*v).to_string(),
                    interface: "port1".to_string(),
                })
                .collect(),
            vnf_service_mesh: Some("m".to_string()),
            use_node_l2bd: None,
            l2bd: None,
        }],
    };
    controller.vnf_service_create(vs, false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n2"), ("c", "n3")]);

    controller.render_all().unwrap();
    assert_eq!(
        controller.vnf_service_state("v").unwrap().oper_status,
        OperStatus::Up
    );

    let keys = controller.artifact_keys();
    for n in ["n1", "n2", "n3"] {
        // two tunnels per node, one per remote
        let tunnels: Vec<&String> = keys
            .iter()
            .filter(|k| k.starts_with(&akeys::forwarder_prefix(n)) && k.contains("IF_VXLAN_MESH"))
            .collect();
        assert_eq!(tunnels.len(), 2, "node {n}: tunnels {tunnels:?}");

        // one bridge domain joining endpoint + both tunnels
        let bd = controller
            .artifact(&akeys::l2bd_key(n, "L2BD_v_CONN_1"))
            .unwrap_or_else(|| panic!("missing l2bd on {n}"));
        let Some(ArtifactSpec::L2bd(spec)) = bd.spec else {
            panic!("expected l2bd spec");
        };
        assert_eq!(spec.interfaces.len(), 3);
        let (tunnel_ports, local_ports): (Vec<_>, Vec<_>) = spec
            .interfaces
            .iter()
            .partition(|i| i.name.contains("IF_VXLAN_MESH"));
        assert_eq!(tunnel_ports.len(), 2);
        assert!(tunnel_ports.iter().all(|i| i.split_horizon_group == 1));
        assert!(local_ports.iter().all(|i| i.split_horizon_group == 0));

        // loopback and two static routes
        assert!(keys.contains(&akeys::interface_key(n, &format!("IF_VXLAN_LOOPBACK_{n}"))));
        let routes = keys
            .iter()
            .filter(|k| k.starts_with(&akeys::forwarder_prefix(n)) && k.contains("/vrf/"))
            .count();
        assert_eq!(routes, 2, "node {n}");
    }

    let stats = controller.render_all().unwrap();
    assert!(stats.is_empty());
}

// Scenario: hub-and-spoke where the only spoke is the hub itself: the
// tunnel pair is still emitted (degenerate but consistent) and a
// diagnostic lands on the service.
#[test]
fn hub_and_spoke_spoke_equals_hub() {
    let (controller, _) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.ipam_pool_create(loopback_pool(), false).unwrap();
    controller
        .vnf_service_mesh_create(
            VnfServiceMesh {
                name: "hs".to_string(),
                mesh_type: MeshType::HubAndSpoke,
                connection_type: MeshConnectionType::Vxlan,
                vxlan_mesh: None,
                vxlan_hub_and_spoke: Some(VxlanHubAndSpokeParams {
                    vni: 99,
                    hub_node_name: "n1".to_string(),
                    loopback_ipam_pool_name: "vxlan-loopbacks".to_string(),
                    outgoing_interface_label: String::new(),
                }),
            },
            false,
        )
        .unwrap();

    let mut vs = l2pp_service("v", None);
    vs.connections[0].conn_type = ConnType::L2mp;
    vs.connections[0].vnf_service_mesh = Some("hs".to_string());
    controller.vnf_service_create(vs, false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);

    controller.render_all().unwrap();
    let state = controller.vnf_service_state("v").unwrap();
    assert_eq!(state.oper_status, OperStatus::Down);
    assert!(
        state.msgs.iter().any(|m| m.contains("hub node 'n1' is also a spoke")),
        "missing diagnostic: {:?}",
        state.msgs
    );

    // both tunnel directions exist despite the degenerate shape
    let keys = controller.artifact_keys();
    assert!(keys.contains(&akeys::interface_key(
        "n1",
        "IF_VXLAN_FROM_HUB_n1_TO_SPOKE_n1_VSRVC_v_CONN_0_VNI_99"
    )));
    assert!(keys.contains(&akeys::interface_key(
        "n1",
        "IF_VXLAN_FROM_SPOKE_n1_TO_HUB_n1_VSRVC_v_CONN_0_VNI_99"
    )));
}

// Scenario: an endpoint whose VNF has no binding: service down with a
// diagnostic, manifest empty, prior artifacts removed from the store.
#[test]
fn unresolved_endpoint_tears_down() {
    let (controller, store) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", None), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);

    controller.render_all().unwrap();
    assert_eq!(
        controller.vnf_service_state("v").unwrap().oper_status,
        OperStatus::Up
    );
    assert!(!store.list(&akeys::forwarder_prefix("a")).unwrap().is_empty());

    // the binding disappears (watcher-style removal re-renders)
    controller.binding_remove("b").unwrap();

    let state = controller.vnf_service_state("v").unwrap();
    assert_eq!(state.oper_status, OperStatus::Down);
    assert!(state.msgs.iter().any(|m| m.contains("b/port1")));
    assert!(state.rendered_entries.is_empty());
    assert!(store.list(&akeys::forwarder_prefix("a")).unwrap().is_empty());
    assert!(store.list(&akeys::forwarder_prefix("b")).unwrap().is_empty());
}

// Scenario: a binding flips from n2 to n3 under a mesh L2PP connection:
// artifacts keyed under n2 disappear, n3 artifacts appear, and the peer's
// tunnel follows the new remote loopback.
#[test]
#[traced_test]
fn binding_flip_moves_artifacts() {
    let (controller, store) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.node_create(node("n2", "192.168.16.2/24"), false).unwrap();
    controller.node_create(node("n3", "192.168.16.3/24"), false).unwrap();
    controller.ipam_pool_create(loopback_pool(), false).unwrap();
    controller.vnf_service_mesh_create(vxlan_mesh("m"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", Some("m")), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n2")]);
    controller.render_all().unwrap();

    controller
        .binding_update(VnfToNodeMap {
            vnf: "b".to_string(),
            node: "n3".to_string(),
        })
        .unwrap();

    // nothing of the service remains under n2 but the node's own ethernet
    let n2_keys: Vec<String> = store
        .list(&akeys::forwarder_prefix("n2"))
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(n2_keys, vec![akeys::interface_key("n2", "GbE0")]);

    // the service landed on n3, with the same vni and a fresh loopback
    let vxlan_n1 =
        "IF_VXLAN_L2PP_VSRVC_v_CONN_1_FROM_n1_a_port1_TO_n3_b_port1_VNI_100".to_string();
    let tunnel = interface_spec(&controller, &akeys::interface_key("n1", &vxlan_n1));
    let vxlan = tunnel.vxlan.unwrap();
    assert_eq!(vxlan.src_address, "10.0.0.1");
    assert_eq!(vxlan.dst_address, "10.0.0.3");
    assert!(
        controller
            .artifact_keys()
            .iter()
            .any(|k| k.starts_with(&akeys::forwarder_prefix("n3")))
    );

    let stats = controller.render_all().unwrap();
    assert!(stats.is_empty());
}

// Minimality: a single field change rewrites only the artifact whose
// payload changed.
#[test]
fn single_field_change_is_minimal() {
    let (controller, _) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", None), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);
    controller.render_all().unwrap();

    let mut vs = l2pp_service("v", None);
    vs.vnfs[0].interfaces[0].mtu = 9000;
    let stats = controller.vnf_service_create(vs, true).unwrap();
    assert_eq!(stats.writes, 1, "expected exactly one rewrite");
    assert_eq!(stats.deletes, 0);

    let a = interface_spec(&controller, &akeys::interface_key("a", "port1"));
    assert_eq!(a.mtu, 9000);
}

// Allocator stability across a restart: a fresh controller over the same
// datastore re-renders to exactly the same artifacts.
#[test]
fn bootstrap_resync_is_empty() {
    let store = Arc::new(MemStore::new());
    {
        let controller = Controller::new(store.clone());
        controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
        controller.node_create(node("n2", "192.168.16.2/24"), false).unwrap();
        controller.ipam_pool_create(loopback_pool(), false).unwrap();
        controller.vnf_service_mesh_create(vxlan_mesh("m"), false).unwrap();
        controller
            .vnf_service_create(l2pp_service("v", Some("m")), false)
            .unwrap();
        bind(&controller, &[("a", "n1"), ("b", "n2")]);
        controller.render_all().unwrap();
    }

    // same store, new process
    let controller = Controller::new(store);
    let stats = controller.bootstrap(false).unwrap();
    assert!(stats.is_empty(), "restart resync was not empty: {stats:?}");
    assert_eq!(
        controller.vnf_service_state("v").unwrap().oper_status,
        OperStatus::Up
    );
}

// Clean mode removes the controller subtree and every artifact.
#[test]
fn clean_all_empties_the_store() {
    let (controller, store) = new_controller();
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", None), false).unwrap();
    bind(&controller, &[("a", "n1"), ("b", "n1")]);
    controller.render_all().unwrap();
    assert!(store.len() > 0);

    controller.clean_all().unwrap();
    assert!(store.is_empty(), "{} records left", store.len());
    assert!(controller.artifact_keys().is_empty());
}

// The binding watcher reacts to a put on the binding prefix by updating
// the cache and re-rendering.
#[tokio::test]
#[traced_test]
async fn watcher_applies_binding_puts() {
    let store: Arc<MemStore> = Arc::new(MemStore::new());
    let controller = Arc::new(Controller::new(store.clone()));
    controller.node_create(node("n1", "192.168.16.1/24"), false).unwrap();
    controller.vnf_service_create(l2pp_service("v", None), false).unwrap();
    controller.render_all().unwrap();
    assert_eq!(
        controller.vnf_service_state("v").unwrap().oper_status,
        OperStatus::Down
    );

    let watcher = tokio::spawn(controller::watcher::run_binding_watcher(
        controller.clone(),
        store.clone(),
    ));
    // discovered bindings arrive through the datastore
    for vnf in ["a", "b"] {
        let v2n = VnfToNodeMap {
            vnf: vnf.to_string(),
            node: "n1".to_string(),
        };
        store
            .put(
                &config::keys::vnf_to_node_key(vnf),
                serde_json::to_vec(&v2n).unwrap(),
            )
            .unwrap();
    }

    // give the watcher a moment to drain the events
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        if controller.bindings().len() == 2 {
            break;
        }
    }
    watcher.abort();

    assert_eq!(controller.bindings().len(), 2);
    assert_eq!(
        controller.vnf_service_state("v").unwrap().oper_status,
        OperStatus::Up
    );
}
