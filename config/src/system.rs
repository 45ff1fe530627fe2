// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! System-wide parameters: defaults applied wherever an entity leaves a
//! field unset, plus the named bridge-domain parameter templates.

use crate::errors::{CoreError, CoreResult};
use crate::types::RxMode;
use serde::{Deserialize, Serialize};

/// Bridge-domain forwarding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BdParms {
    pub flood: bool,
    pub unknown_unicast_flood: bool,
    pub learn: bool,
    pub forward: bool,
    pub arp_termination: bool,
    pub mac_age_minutes: u32,
}

impl Default for BdParms {
    fn default() -> Self {
        Self {
            flood: true,
            unknown_unicast_flood: true,
            learn: true,
            forward: true,
            arp_termination: false,
            mac_age_minutes: 0,
        }
    }
}

/// A named, reusable set of [`BdParms`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2BdTemplate {
    pub name: String,
    #[serde(flatten)]
    pub parms: BdParms,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemParameters {
    #[serde(default)]
    pub mtu: u32,
    #[serde(default)]
    pub rx_mode: RxMode,
    #[serde(default)]
    pub default_static_route_weight: u32,
    #[serde(default)]
    pub default_static_route_preference: u32,
    #[serde(default)]
    pub l2bd_templates: Vec<L2BdTemplate>,
}

impl SystemParameters {
    /// Validate and fill in defaults for unset fields.
    pub fn validate(&mut self) -> CoreResult {
        if self.mtu == 0 {
            self.mtu = 1500;
        }
        if self.default_static_route_preference == 0 {
            self.default_static_route_preference = 5;
        }
        if self.default_static_route_weight == 0 {
            self.default_static_route_weight = 1;
        }
        for template in &self.l2bd_templates {
            if template.name.is_empty() {
                return Err(CoreError::MissingIdentifier("l2bd template name"));
            }
        }
        Ok(())
    }

    /// Look a bridge-domain template up by name.
    #[must_use]
    pub fn find_l2bd_template(&self, name: &str) -> Option<&BdParms> {
        self.l2bd_templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.parms)
    }
}
