// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Host model. A node either carries one implicit virtual switch with a flat
//! interface list, or several named virtual switches; it may also declare
//! node-level bridge domains that services can join via `use_node_l2bd`.

use crate::errors::{CoreError, CoreResult};
use crate::system::{BdParms, SystemParameters};
use crate::types::{IfType, VnfType};
use crate::vnf::Interface;
use serde::{Deserialize, Serialize};

/// A named virtual switch hosted on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vswitch {
    pub name: String,
    pub vnf_type: VnfType,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

/// A node-level bridge domain, by template reference or inline parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct L2Bd {
    pub name: String,
    #[serde(default)]
    pub l2bd_template: Option<String>,
    #[serde(default)]
    pub bd_parms: Option<BdParms>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub vswitches: Vec<Vswitch>,
    #[serde(default)]
    pub has_multiple_vswitches: bool,
    #[serde(default)]
    pub l2bds: Vec<L2Bd>,
}

fn validate_node_interfaces(owner: &str, interfaces: &[Interface]) -> CoreResult {
    for iface in interfaces {
        if iface.if_type != IfType::Ethernet {
            return Err(CoreError::BadNodeInterfaceType {
                owner: owner.to_owned(),
                interface: iface.name.clone(),
                if_type: iface.if_type.to_string(),
            });
        }
        iface.validate_addresses(owner)?;
        if iface.ip_addresses.is_empty() {
            tracing::warn!("node/if {owner}/{}: missing ip address", iface.name);
        }
    }
    Ok(())
}

impl Node {
    /// Shape and field validation; template references are checked against
    /// the supplied system parameters.
    pub fn validate(&self, sys: &SystemParameters) -> CoreResult {
        if self.name.is_empty() {
            return Err(CoreError::MissingIdentifier("node name"));
        }
        let shape_conflict = (!self.interfaces.is_empty() && !self.vswitches.is_empty())
            || (self.has_multiple_vswitches && !self.interfaces.is_empty())
            || (!self.has_multiple_vswitches && !self.vswitches.is_empty());
        if shape_conflict {
            return Err(CoreError::NodeVswitchShape(self.name.clone()));
        }

        validate_node_interfaces(&self.name, &self.interfaces)?;

        for vswitch in &self.vswitches {
            if vswitch.name.is_empty() {
                return Err(CoreError::MissingIdentifier("vswitch name"));
            }
            match vswitch.vnf_type {
                VnfType::VppVswitch | VnfType::External => {}
                other => {
                    return Err(CoreError::BadVswitchType(
                        vswitch.name.clone(),
                        other.to_string(),
                    ));
                }
            }
            validate_node_interfaces(&vswitch.name, &vswitch.interfaces)?;
        }

        for l2bd in &self.l2bds {
            let owner = format!("node {}/l2bd {}", self.name, l2bd.name);
            if l2bd.l2bd_template.is_some() && l2bd.bd_parms.is_some() {
                return Err(CoreError::L2bdTemplateConflict { owner });
            }
            if let Some(template) = &l2bd.l2bd_template {
                if sys.find_l2bd_template(template).is_none() {
                    return Err(CoreError::UnknownL2bdTemplate {
                        owner,
                        template: template.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn find_l2bd(&self, name: &str) -> Option<&L2Bd> {
        self.l2bds.iter().find(|bd| bd.name == name)
    }
}

/// The conventional key name of a node-level bridge domain artifact.
#[must_use]
pub fn node_l2bd_name(node: &str, l2bd: &str) -> String {
    format!("L2BD_{node}_{l2bd}")
}

#[cfg(test)]
mod test {
    use super::*;

    fn eth(name: &str) -> Interface {
        Interface {
            name: name.to_string(),
            if_type: IfType::Ethernet,
            ip_addresses: vec!["192.168.10.1/24".to_string()],
            ..Interface::default()
        }
    }

    #[test]
    fn single_vswitch_node() {
        let node = Node {
            name: "n1".to_string(),
            interfaces: vec![eth("GbE0")],
            ..Node::default()
        };
        node.validate(&SystemParameters::default()).unwrap();
    }

    #[test]
    fn interfaces_and_vswitches_conflict() {
        let node = Node {
            name: "n1".to_string(),
            interfaces: vec![eth("GbE0")],
            vswitches: vec![Vswitch {
                name: "vs1".to_string(),
                vnf_type: VnfType::VppVswitch,
                interfaces: vec![],
            }],
            has_multiple_vswitches: true,
            ..Node::default()
        };
        assert!(matches!(
            node.validate(&SystemParameters::default()),
            Err(CoreError::NodeVswitchShape(_))
        ));
    }

    #[test]
    fn non_ethernet_node_interface_rejected() {
        let mut node = Node {
            name: "n1".to_string(),
            interfaces: vec![eth("GbE0")],
            ..Node::default()
        };
        node.interfaces[0].if_type = IfType::Memif;
        assert!(matches!(
            node.validate(&SystemParameters::default()),
            Err(CoreError::BadNodeInterfaceType { .. })
        ));
    }

    #[test]
    fn l2bd_template_must_exist() {
        let node = Node {
            name: "n1".to_string(),
            l2bds: vec![L2Bd {
                name: "east-west".to_string(),
                l2bd_template: Some("missing".to_string()),
                bd_parms: None,
            }],
            ..Node::default()
        };
        assert!(matches!(
            node.validate(&SystemParameters::default()),
            Err(CoreError::UnknownL2bdTemplate { .. })
        ));
    }
}
