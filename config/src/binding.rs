// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VNF-to-node bindings. A binding may be authored through the config
//! surface or discovered by the binding watcher; either way it drives
//! where a VNF's artifacts are rendered.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnfToNodeMap {
    pub vnf: String,
    pub node: String,
}
