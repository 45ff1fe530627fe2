// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::store::StoreError;
use serde::de::DeserializeOwned;

/// What happened to a watched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Put,
    Delete,
}

/// One change observed under a watched prefix.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl ChangeEvent {
    /// Decode the event payload, if any, into `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        match &self.value {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    key: self.key.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}
