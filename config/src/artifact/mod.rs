// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Forwarder artifact model. One [`Artifact`] is one record a downstream
//! forwarder agent realizes in its dataplane: an interface, a linux
//! interface, a bridge domain, a cross-connect or a static route. The
//! record carries its own datastore key; the kind tag selects the payload
//! variant and drives serialization, exactly mirroring what is stored.

pub mod build;
pub mod keys;

use crate::errors::CoreError;
use crate::system::BdParms;
use crate::types::{AdminStatus, MemifMode, RxMode};
use datastore::StoreError;
use net::{Mac, Vni};
use serde::{Deserialize, Serialize};

/// Artifact kinds, as stored in rendered-artifact manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Interface,
    LinuxInterface,
    L2bd,
    L2xc,
    L3vrfRoute,
}

/// Dataplane interface flavor of an [`InterfaceSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IfSpecType {
    Memif,
    VxlanTunnel,
    SoftwareLoopback,
    Ethernet,
    AfPacket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemifSpec {
    pub id: u32,
    pub master: bool,
    pub mode: MemifMode,
    pub socket_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxlanSpec {
    pub vni: Vni,
    pub src_address: String,
    pub dst_address: String,
}

/// A dataplane interface on a virtual switch or inside a VNF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub name: String,
    pub if_type: IfSpecType,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub mac_address: Option<Mac>,
    #[serde(default)]
    pub mtu: u32,
    pub admin_status: AdminStatus,
    #[serde(default)]
    pub rx_mode: RxMode,
    #[serde(default)]
    pub memif: Option<MemifSpec>,
    #[serde(default)]
    pub vxlan: Option<VxlanSpec>,
    /// Kernel interface an af-packet binds to.
    #[serde(default)]
    pub host_if_name: Option<String>,
}

/// A kernel (veth) interface placed into a container namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxInterfaceSpec {
    pub name: String,
    pub host_if_name: String,
    pub peer_if_name: String,
    pub namespace: String,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub mac_address: Option<Mac>,
    #[serde(default)]
    pub mtu: u32,
    pub admin_status: AdminStatus,
}

/// One member interface of a bridge domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeInterface {
    pub name: String,
    #[serde(default)]
    pub bvi: bool,
    #[serde(default)]
    pub split_horizon_group: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDomainSpec {
    pub name: String,
    #[serde(flatten)]
    pub parms: BdParms,
    #[serde(default)]
    pub interfaces: Vec<BridgeInterface>,
}

/// A directional L2 cross-connect between two vswitch interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XConnectSpec {
    pub receive_interface: String,
    pub transmit_interface: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub vrf_id: u32,
    /// Informational only; excluded from artifact equality.
    #[serde(default)]
    pub description: String,
    pub dst_address: String,
    pub next_hop_address: String,
    pub outgoing_interface: String,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub preference: u32,
}

/// Kind-tagged artifact payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSpec {
    Interface(InterfaceSpec),
    LinuxInterface(LinuxInterfaceSpec),
    L2bd(BridgeDomainSpec),
    L2xc(XConnectSpec),
    L3vrfRoute(RouteSpec),
}

impl ArtifactSpec {
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactSpec::Interface(_) => ArtifactKind::Interface,
            ArtifactSpec::LinuxInterface(_) => ArtifactKind::LinuxInterface,
            ArtifactSpec::L2bd(_) => ArtifactKind::L2bd,
            ArtifactSpec::L2xc(_) => ArtifactKind::L2xc,
            ArtifactSpec::L3vrfRoute(_) => ArtifactKind::L3vrfRoute,
        }
    }
}

/// One rendered forwarder record: `(key, kind, payload)`.
///
/// A `spec` of `None` is the skeleton form: key and kind are known (from a
/// manifest) but the payload was never read back. Skeletons compare unequal
/// to everything except other skeletons with the same key, which is what
/// lets the transaction engine stage deletions for records it cannot load.
#[derive(Debug, Clone, Eq)]
pub struct Artifact {
    pub key: String,
    pub kind: ArtifactKind,
    pub spec: Option<ArtifactSpec>,
}

impl Artifact {
    #[must_use]
    pub fn skeleton(key: &str, kind: ArtifactKind) -> Self {
        Self {
            key: key.to_owned(),
            kind,
            spec: None,
        }
    }

    pub(crate) fn new(key: String, spec: ArtifactSpec) -> Self {
        Self {
            key,
            kind: spec.kind(),
            spec: Some(spec),
        }
    }

    /// Serialize the payload for storage at [`Artifact::key`].
    pub fn encode_value(&self) -> Result<Vec<u8>, StoreError> {
        let encode_err = |e: serde_json::Error| StoreError::Encode {
            key: self.key.clone(),
            reason: e.to_string(),
        };
        match &self.spec {
            None => Err(StoreError::Encode {
                key: self.key.clone(),
                reason: "skeleton artifact has no payload".to_string(),
            }),
            Some(ArtifactSpec::Interface(s)) => serde_json::to_vec(s).map_err(encode_err),
            Some(ArtifactSpec::LinuxInterface(s)) => serde_json::to_vec(s).map_err(encode_err),
            Some(ArtifactSpec::L2bd(s)) => serde_json::to_vec(s).map_err(encode_err),
            Some(ArtifactSpec::L2xc(s)) => serde_json::to_vec(s).map_err(encode_err),
            Some(ArtifactSpec::L3vrfRoute(s)) => serde_json::to_vec(s).map_err(encode_err),
        }
    }

    /// Decode a stored payload of the given kind back into an artifact.
    pub fn decode_value(key: &str, kind: ArtifactKind, bytes: &[u8]) -> Result<Self, CoreError> {
        let decode_err = |e: serde_json::Error| {
            CoreError::Datastore(StoreError::Decode {
                key: key.to_owned(),
                reason: e.to_string(),
            })
        };
        let spec = match kind {
            ArtifactKind::Interface => {
                ArtifactSpec::Interface(serde_json::from_slice(bytes).map_err(decode_err)?)
            }
            ArtifactKind::LinuxInterface => {
                ArtifactSpec::LinuxInterface(serde_json::from_slice(bytes).map_err(decode_err)?)
            }
            ArtifactKind::L2bd => {
                ArtifactSpec::L2bd(serde_json::from_slice(bytes).map_err(decode_err)?)
            }
            ArtifactKind::L2xc => {
                ArtifactSpec::L2xc(serde_json::from_slice(bytes).map_err(decode_err)?)
            }
            ArtifactKind::L3vrfRoute => {
                ArtifactSpec::L3vrfRoute(serde_json::from_slice(bytes).map_err(decode_err)?)
            }
        };
        Ok(Artifact::new(key.to_owned(), spec))
    }

    /// The manifest entry for this artifact.
    #[must_use]
    pub fn manifest_entry(&self) -> crate::state::RenderedArtifact {
        crate::state::RenderedArtifact {
            key: self.key.clone(),
            kind: self.kind,
        }
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.key != other.key {
            return false;
        }
        match (&self.spec, &other.spec) {
            (None, None) => true,
            // routes are equal if all but the description is equal
            (Some(ArtifactSpec::L3vrfRoute(a)), Some(ArtifactSpec::L3vrfRoute(b))) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.description.clear();
                b.description.clear();
                a == b
            }
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn route(description: &str, weight: u32) -> Artifact {
        Artifact::new(
            keys::route_key("n1", 0, "10.0.0.2/32", "192.168.16.2"),
            ArtifactSpec::L3vrfRoute(RouteSpec {
                vrf_id: 0,
                description: description.to_string(),
                dst_address: "10.0.0.2/32".to_string(),
                next_hop_address: "192.168.16.2".to_string(),
                outgoing_interface: "GbE0".to_string(),
                weight,
                preference: 5,
            }),
        )
    }

    #[test]
    fn routes_equal_mod_description() {
        assert_eq!(route("to n2", 1), route("toward node 2", 1));
        assert_ne!(route("to n2", 1), route("to n2", 2));
    }

    #[test]
    fn skeleton_matches_only_skeleton() {
        let full = route("x", 1);
        let skeleton = Artifact::skeleton(&full.key, full.kind);
        assert_ne!(full, skeleton);
        assert_eq!(skeleton, Artifact::skeleton(&full.key, full.kind));
    }

    #[test]
    fn key_and_kind_participate_in_equality() {
        let a = Artifact::skeleton("/forwarder/n1/vpp/interface/if0", ArtifactKind::Interface);
        let b = Artifact::skeleton("/forwarder/n1/vpp/interface/if1", ArtifactKind::Interface);
        let c = Artifact::skeleton("/forwarder/n1/vpp/interface/if0", ArtifactKind::L2bd);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn encode_decode_round_trip() {
        let artifact = build::tests_support::sample_memif();
        let bytes = artifact.encode_value().unwrap();
        let decoded = Artifact::decode_value(&artifact.key, artifact.kind, &bytes).unwrap();
        assert_eq!(artifact, decoded);
    }

    #[test]
    fn skeleton_encode_refuses() {
        let skeleton = Artifact::skeleton("/k", ArtifactKind::Interface);
        assert!(skeleton.encode_value().is_err());
    }
}
