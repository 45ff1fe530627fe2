// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::store::{KvStore, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Typed layer over a [`KvStore`]: serde-encodes records on the way in and
/// decodes them on the way out. All controller persistence goes through here.
#[derive(Clone)]
pub struct Broker {
    store: Arc<dyn KvStore>,
}

impl Broker {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Raw access for callers that manage their own encoding.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Encode {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
        debug!("put: key '{key}'");
        self.store.put(key, bytes)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    key: key.to_owned(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        debug!("delete: key '{key}'");
        self.store.delete(key)
    }

    pub fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        debug!("delete-prefix: '{prefix}'");
        self.store.delete_prefix(prefix)
    }

    /// List and decode every record under `prefix`, ordered by key.
    pub fn list_values<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let mut out = Vec::new();
        for (key, bytes) in self.store.list(prefix)? {
            let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            out.push((key, value));
        }
        Ok(out)
    }
}
