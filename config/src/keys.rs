// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The controller's datastore key tree. Every record the controller owns
//! lives under `/sfc-controller/`; rendered artifacts live under the
//! per-node forwarder prefixes defined in [`crate::artifact::keys`].

/// Base of every controller-owned record.
pub const CONTROLLER_PREFIX: &str = "/sfc-controller/";

#[must_use]
pub fn config_prefix() -> String {
    format!("{CONTROLLER_PREFIX}v2/config/")
}

#[must_use]
pub fn status_prefix() -> String {
    format!("{CONTROLLER_PREFIX}v2/status/")
}

#[must_use]
pub fn system_parameters_key() -> String {
    format!("{}system-parameters", config_prefix())
}

#[must_use]
pub fn node_prefix() -> String {
    format!("{}node/", config_prefix())
}

#[must_use]
pub fn node_key(name: &str) -> String {
    format!("{}{name}", node_prefix())
}

#[must_use]
pub fn vnf_service_prefix() -> String {
    format!("{}vnf-service/", config_prefix())
}

#[must_use]
pub fn vnf_service_key(name: &str) -> String {
    format!("{}{name}", vnf_service_prefix())
}

#[must_use]
pub fn vnf_service_mesh_prefix() -> String {
    format!("{}vnf-service-mesh/", config_prefix())
}

#[must_use]
pub fn vnf_service_mesh_key(name: &str) -> String {
    format!("{}{name}", vnf_service_mesh_prefix())
}

#[must_use]
pub fn ipam_pool_prefix() -> String {
    format!("{}ipam-pool/", config_prefix())
}

#[must_use]
pub fn ipam_pool_key(name: &str) -> String {
    format!("{}{name}", ipam_pool_prefix())
}

#[must_use]
pub fn vnf_to_node_prefix() -> String {
    format!("{}vnf-to-node/", config_prefix())
}

#[must_use]
pub fn vnf_to_node_key(vnf: &str) -> String {
    format!("{}{vnf}", vnf_to_node_prefix())
}

#[must_use]
pub fn node_status_prefix() -> String {
    format!("{}node/", status_prefix())
}

#[must_use]
pub fn node_status_key(name: &str) -> String {
    format!("{}{name}", node_status_prefix())
}

#[must_use]
pub fn vnf_service_status_prefix() -> String {
    format!("{}vnf-service/", status_prefix())
}

#[must_use]
pub fn vnf_service_status_key(name: &str) -> String {
    format!("{}{name}", vnf_service_status_prefix())
}

#[must_use]
pub fn interface_state_prefix() -> String {
    format!("{}interface/", status_prefix())
}

#[must_use]
pub fn interface_state_key(vnf: &str, interface: &str) -> String {
    format!("{}{vnf}/{interface}", interface_state_prefix())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tree_shape() {
        assert_eq!(
            system_parameters_key(),
            "/sfc-controller/v2/config/system-parameters"
        );
        assert_eq!(node_key("n1"), "/sfc-controller/v2/config/node/n1");
        assert_eq!(
            vnf_service_key("svc"),
            "/sfc-controller/v2/config/vnf-service/svc"
        );
        assert_eq!(
            interface_state_key("vnf-a", "port1"),
            "/sfc-controller/v2/status/interface/vnf-a/port1"
        );
        assert_eq!(
            vnf_to_node_key("vnf-a"),
            "/sfc-controller/v2/config/vnf-to-node/vnf-a"
        );
    }
}
