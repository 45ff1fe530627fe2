// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! System parameter handling and the defaults other renders fall back to.

use crate::cache::ControllerCore;
use config::system::BdParms;
use config::types::RxMode;
use config::{CoreResult, SystemParameters, keys};
use tracing::debug;

impl ControllerCore {
    /// Install (or replace) the system parameters; optionally re-render
    /// everything, since defaults feed into most artifacts.
    pub(crate) fn system_parameters_create(
        &mut self,
        mut sp: SystemParameters,
        render: bool,
    ) -> CoreResult {
        sp.validate()?;
        self.broker.put(&keys::system_parameters_key(), &sp)?;
        debug!("system parameters installed: mtu {}", sp.mtu);
        self.sys = sp;
        if render {
            self.render_config()?;
        }
        Ok(())
    }

    /// The given MTU, or the system default when unset.
    pub(crate) fn resolve_mtu(&self, mtu: u32) -> u32 {
        if mtu == 0 { self.sys.mtu } else { mtu }
    }

    /// The given RX mode, or the system default when unset.
    pub(crate) fn resolve_rx_mode(&self, rx_mode: Option<RxMode>) -> RxMode {
        rx_mode.unwrap_or(self.sys.rx_mode)
    }

    /// Resolve bridge-domain parameters: named template from the system
    /// parameters, else the built-in default.
    pub(crate) fn find_l2bd_template(&self, name: &str) -> Option<BdParms> {
        self.sys.find_l2bd_template(name).cloned()
    }

    pub(crate) fn default_bd_parms(&self) -> BdParms {
        BdParms::default()
    }
}
