// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Mac address type and logic.

use arrayvec::ArrayVec;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A [MAC Address] type.
///
/// `Mac` is a transparent wrapper around `[u8; 6]` which provides
/// parsing, formatting and a small collection of predicates.
///
/// [MAC Address]: https://en.wikipedia.org/wiki/MAC_address
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Mac(pub [u8; 6]);

impl From<[u8; 6]> for Mac {
    fn from(value: [u8; 6]) -> Self {
        Mac(value)
    }
}

impl From<Mac> for [u8; 6] {
    fn from(value: Mac) -> Self {
        value.0
    }
}

impl AsRef<[u8; 6]> for Mac {
    fn as_ref(&self) -> &[u8; 6] {
        &self.0
    }
}

/// Errors which can occur while converting a string to a [`Mac`]
#[derive(Debug, thiserror::Error)]
pub enum MacFromStringError {
    /// Invalid string representation of mac address
    #[error("invalid string representation of mac address: {0}")]
    Invalid(String),
}

impl TryFrom<&str> for Mac {
    type Error = MacFromStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        const MAX_OCTETS: usize = 6;
        let mut octet_strs = value.split(':');
        let parsed =
            octet_strs.try_fold(ArrayVec::<_, MAX_OCTETS>::new(), |mut acc, octet_str| {
                if octet_str.len() != 2 || octet_str.chars().any(|c| !c.is_ascii_hexdigit()) {
                    return Err(MacFromStringError::Invalid(value.to_string()));
                }
                let octet = u8::from_str_radix(octet_str, 16)
                    .map_err(|_| MacFromStringError::Invalid(value.to_string()))?;
                acc.try_push(octet)
                    .map_err(|_| MacFromStringError::Invalid(value.to_string()))?;
                Ok(acc)
            })?;

        let octets = match parsed.as_slice() {
            [o0, o1, o2, o3, o4, o5] => [*o0, *o1, *o2, *o3, *o4, *o5],
            _ => return Err(MacFromStringError::Invalid(value.to_string())),
        };

        Ok(Mac(octets))
    }
}

impl TryFrom<String> for Mac {
    type Error = MacFromStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Mac::try_from(value.as_str())
    }
}

impl FromStr for Mac {
    type Err = MacFromStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mac::try_from(s)
    }
}

impl Display for Mac {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl From<Mac> for String {
    fn from(value: Mac) -> Self {
        value.to_string()
    }
}

impl Mac {
    /// The zero `Mac`.
    ///
    /// `ZERO` is illegal as a source or destination `Mac` in most contexts.
    pub const ZERO: Mac = Mac([0; 6]);

    /// Returns true iff the least significant bit of the first octet is one.
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    /// Returns true iff the locally-administered bit of the first octet is set.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0[0] & 0x02 == 0x02
    }

    /// Build a `Mac` from the low 48 bits of a `u64`.
    #[must_use]
    pub fn from_u64(value: u64) -> Mac {
        let b = value.to_be_bytes();
        Mac([b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    /// The low 48 bits of this `Mac` as a `u64`.
    #[must_use]
    pub fn to_u64(self) -> u64 {
        let [o0, o1, o2, o3, o4, o5] = self.0;
        u64::from_be_bytes([0, 0, o0, o1, o2, o3, o4, o5])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_canonical() {
        let mac = Mac::try_from("02:00:00:ab:cd:ef").unwrap();
        assert_eq!(mac, Mac([0x02, 0x00, 0x00, 0xab, 0xcd, 0xef]));
        assert!(mac.is_local());
        assert!(!mac.is_multicast());
    }

    #[test]
    fn reject_malformed() {
        assert!(Mac::try_from("02:00:00:ab:cd").is_err());
        assert!(Mac::try_from("02:00:00:ab:cd:ef:01").is_err());
        assert!(Mac::try_from("02:00:00:ab:cd:zz").is_err());
        assert!(Mac::try_from("0200.00ab.cdef").is_err());
    }

    #[test]
    fn display_round_trip() {
        bolero::check!()
            .with_type()
            .for_each(|octets: &[u8; 6]| {
                let mac = Mac(*octets);
                let parsed = Mac::try_from(mac.to_string().as_str()).unwrap();
                assert_eq!(mac, parsed);
            });
    }

    #[test]
    fn u64_round_trip() {
        bolero::check!().with_type().for_each(|octets: &[u8; 6]| {
            let mac = Mac(*octets);
            assert_eq!(Mac::from_u64(mac.to_u64()), mac);
        });
    }
}
