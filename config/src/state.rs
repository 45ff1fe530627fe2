// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Derived per-entity state. Produced only by rendering, never authored.

use crate::artifact::ArtifactKind;
use crate::types::OperStatus;
use net::Mac;
use serde::{Deserialize, Serialize};

/// One entry of a rendered-artifact manifest: enough to re-read the full
/// artifact from the datastore and to stage its deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub key: String,
    pub kind: ArtifactKind,
}

/// Operational state of a node or a vnf-service: status, diagnostics, and
/// the manifest of artifacts rendered on the entity's behalf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub name: String,
    pub oper_status: OperStatus,
    #[serde(default)]
    pub msgs: Vec<String>,
    #[serde(default)]
    pub rendered_entries: Vec<RenderedArtifact>,
}

impl EntityState {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn append_msg(&mut self, msg: impl Into<String>) {
        self.msgs.push(msg.into());
    }
}

/// Resolved identity of one VNF interface: which node it lives on and the
/// MAC / addresses / memif id it was given. Cached so repeated renders hand
/// the same identifiers back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceState {
    pub vnf: String,
    pub interface: String,
    pub node: String,
    #[serde(default)]
    pub mac_address: Option<Mac>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    /// 0 = not allocated yet.
    #[serde(default)]
    pub memif_id: u32,
}

impl InterfaceState {
    /// Cache key, `vnf/interface`.
    #[must_use]
    pub fn cache_key(vnf: &str, interface: &str) -> String {
        format!("{vnf}/{interface}")
    }
}
