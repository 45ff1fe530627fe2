// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VXLAN network identifier.

use std::fmt::{Display, Formatter};

/// A VXLAN network identifier, the 24-bit tag that selects an overlay
/// segment inside a tunnel.
///
/// The wire format gives a VNI 24 bits, and the all-zero value is kept
/// reserved here (many dataplanes treat it as "untagged"), so the valid
/// range is `1..=0xff_ffff`. Construction goes through [`Vni::new_checked`],
/// which is the only way to obtain one; a `Vni` in hand is therefore always
/// safe to splice into a tunnel artifact.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Vni(u32);

/// Why a `u32` was refused as a [`Vni`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum InvalidVni {
    /// The reserved all-zero identifier.
    #[error("vni 0 is reserved")]
    Zero,
    /// A value that does not fit the 24-bit identifier field.
    #[error("vni {0:#x} does not fit in 24 bits")]
    OutOfRange(u32),
}

impl Vni {
    /// Largest identifier the 24-bit field can carry.
    pub const MAX: u32 = 0x00ff_ffff;

    /// Validate `raw` and wrap it.
    pub fn new_checked(raw: u32) -> Result<Vni, InvalidVni> {
        if raw == 0 {
            Err(InvalidVni::Zero)
        } else if raw > Vni::MAX {
            Err(InvalidVni::OutOfRange(raw))
        } else {
            Ok(Vni(raw))
        }
    }

    /// The identifier value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for Vni {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Vni {
    type Error = InvalidVni;

    fn try_from(raw: u32) -> Result<Vni, InvalidVni> {
        Vni::new_checked(raw)
    }
}

impl From<Vni> for u32 {
    fn from(vni: Vni) -> u32 {
        vni.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn range_edges() {
        let cases = [
            (0, Err(InvalidVni::Zero)),
            (1, Ok(1)),
            (4096, Ok(4096)),
            (Vni::MAX, Ok(Vni::MAX)),
            (Vni::MAX + 1, Err(InvalidVni::OutOfRange(Vni::MAX + 1))),
            (u32::MAX, Err(InvalidVni::OutOfRange(u32::MAX))),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                Vni::new_checked(raw).map(Vni::as_u32),
                expected,
                "raw value {raw}"
            );
        }
    }

    #[test]
    fn display_is_decimal() {
        let vni = Vni::new_checked(100).unwrap();
        assert_eq!(vni.to_string(), "100");
        assert_eq!(format!("VNI_{vni}"), "VNI_100");
    }

    #[test]
    fn serde_round_trip() {
        let vni = Vni::new_checked(10_000).unwrap();
        let encoded = serde_json::to_string(&vni).unwrap();
        assert_eq!(encoded, "10000");
        assert_eq!(serde_json::from_str::<Vni>(&encoded).unwrap(), vni);
        // the reserved and oversized forms must not decode
        assert!(serde_json::from_str::<Vni>("0").is_err());
        assert!(serde_json::from_str::<Vni>("16777216").is_err());
    }

    #[test]
    fn contract_holds_for_arbitrary_input() {
        bolero::check!()
            .with_type()
            .cloned()
            .for_each(|raw: u32| match Vni::new_checked(raw) {
                Ok(vni) => {
                    assert_eq!(vni.as_u32(), raw);
                    assert!(raw >= 1 && raw <= Vni::MAX);
                    assert_eq!(u32::from(vni), raw);
                }
                Err(InvalidVni::Zero) => assert_eq!(raw, 0),
                Err(InvalidVni::OutOfRange(bad)) => {
                    assert_eq!(bad, raw);
                    assert!(raw > Vni::MAX);
                }
            });
    }
}
