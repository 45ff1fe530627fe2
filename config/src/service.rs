// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF services: a set of VNFs plus the connections between their
//! interfaces. Connections reference service meshes and node bridge
//! domains by name; those references are resolved at render time.

use crate::errors::{CoreError, CoreResult};
use crate::node::L2Bd;
use crate::system::SystemParameters;
use crate::types::ConnType;
use crate::vnf::{Interface, Vnf};
use serde::{Deserialize, Serialize};

/// One endpoint of a connection: a `(vnf, interface)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnEndpoint {
    pub vnf: String,
    pub interface: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub conn_type: ConnType,
    pub endpoints: Vec<ConnEndpoint>,
    /// Overlay to use when endpoints land on different nodes.
    #[serde(default)]
    pub vnf_service_mesh: Option<String>,
    /// Join an existing node-level bridge domain instead of creating one.
    #[serde(default)]
    pub use_node_l2bd: Option<String>,
    /// Inline bridge domain for this connection.
    #[serde(default)]
    pub l2bd: Option<L2Bd>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnfService {
    pub name: String,
    pub vnfs: Vec<Vnf>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl VnfService {
    pub fn validate(&self, sys: &SystemParameters) -> CoreResult {
        if self.name.is_empty() {
            return Err(CoreError::MissingIdentifier("vnf-service name"));
        }
        if self.vnfs.is_empty() {
            return Err(CoreError::ServiceWithoutVnfs(self.name.clone()));
        }
        for vnf in &self.vnfs {
            vnf.validate(&self.name)?;
        }
        for conn in &self.connections {
            self.validate_connection(conn, sys)?;
        }
        Ok(())
    }

    fn validate_connection(&self, conn: &Connection, sys: &SystemParameters) -> CoreResult {
        match conn.conn_type {
            ConnType::L2pp => {
                if conn.endpoints.len() != 2 {
                    return Err(CoreError::L2ppArity {
                        service: self.name.clone(),
                    });
                }
            }
            ConnType::L2mp => {
                if conn.endpoints.is_empty() {
                    return Err(CoreError::L2mpArity {
                        service: self.name.clone(),
                    });
                }
                if conn.use_node_l2bd.is_some() && conn.l2bd.is_some() {
                    return Err(CoreError::L2bdConflict {
                        owner: format!("vnf-service {}", self.name),
                    });
                }
                if let Some(l2bd) = &conn.l2bd {
                    let owner = format!("vnf-service {}/l2bd {}", self.name, l2bd.name);
                    match (&l2bd.l2bd_template, &l2bd.bd_parms) {
                        (Some(_), Some(_)) => {
                            return Err(CoreError::L2bdTemplateConflict { owner });
                        }
                        (Some(template), None) => {
                            if sys.find_l2bd_template(template).is_none() {
                                return Err(CoreError::UnknownL2bdTemplate {
                                    owner,
                                    template: template.clone(),
                                });
                            }
                        }
                        (None, Some(_)) => {}
                        (None, None) => {
                            return Err(CoreError::L2bdUnderspecified { owner });
                        }
                    }
                }
            }
        }
        for endpoint in &conn.endpoints {
            if self
                .find_vnf_interface(&endpoint.vnf, &endpoint.interface)
                .is_none()
            {
                return Err(CoreError::EndpointNotInService {
                    service: self.name.clone(),
                    vnf: endpoint.vnf.clone(),
                    interface: endpoint.interface.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve an endpoint to its declared interface and the owning VNF.
    #[must_use]
    pub fn find_vnf_interface(&self, vnf_name: &str, if_name: &str) -> Option<(&Vnf, &Interface)> {
        self.vnfs
            .iter()
            .find(|v| v.name == vnf_name)
            .and_then(|v| v.find_interface(if_name).map(|i| (v, i)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{IfType, VnfType};

    fn service_with(endpoints: Vec<ConnEndpoint>, conn_type: ConnType) -> VnfService {
        VnfService {
            name: "svc".to_string(),
            vnfs: vec![
                Vnf {
                    name: "a".to_string(),
                    vnf_type: VnfType::VppContainer,
                    interfaces: vec![Interface {
                        name: "port1".to_string(),
                        if_type: IfType::Memif,
                        ..Interface::default()
                    }],
                },
                Vnf {
                    name: "b".to_string(),
                    vnf_type: VnfType::VppContainer,
                    interfaces: vec![Interface {
                        name: "port1".to_string(),
                        if_type: IfType::Memif,
                        ..Interface::default()
                    }],
                },
            ],
            connections: vec![Connection {
                conn_type,
                endpoints,
                vnf_service_mesh: None,
                use_node_l2bd: None,
                l2bd: None,
            }],
        }
    }

    fn ep(vnf: &str, iface: &str) -> ConnEndpoint {
        ConnEndpoint {
            vnf: vnf.to_string(),
            interface: iface.to_string(),
        }
    }

    #[test]
    fn l2pp_needs_two_endpoints() {
        let svc = service_with(vec![ep("a", "port1")], ConnType::L2pp);
        assert!(matches!(
            svc.validate(&SystemParameters::default()),
            Err(CoreError::L2ppArity { .. })
        ));
    }

    #[test]
    fn endpoint_must_name_service_vnf() {
        let svc = service_with(vec![ep("a", "port1"), ep("c", "port1")], ConnType::L2pp);
        assert!(matches!(
            svc.validate(&SystemParameters::default()),
            Err(CoreError::EndpointNotInService { .. })
        ));
    }

    #[test]
    fn valid_l2pp() {
        let svc = service_with(vec![ep("a", "port1"), ep("b", "port1")], ConnType::L2pp);
        svc.validate(&SystemParameters::default()).unwrap();
    }

    #[test]
    fn l2mp_l2bd_needs_parms_or_template() {
        let mut svc = service_with(vec![ep("a", "port1")], ConnType::L2mp);
        svc.connections[0].l2bd = Some(L2Bd {
            name: "bd1".to_string(),
            l2bd_template: None,
            bd_parms: None,
        });
        assert!(matches!(
            svc.validate(&SystemParameters::default()),
            Err(CoreError::L2bdUnderspecified { .. })
        ));
    }
}
