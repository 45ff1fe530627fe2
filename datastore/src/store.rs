// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::watch::ChangeEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// Failures surfaced by a datastore driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The driver could not complete the operation.
    #[error("datastore i/o failure on key '{key}': {reason}")]
    Io { key: String, reason: String },
    /// A stored record could not be decoded into the requested type.
    #[error("cannot decode record at key '{key}': {reason}")]
    Decode { key: String, reason: String },
    /// A record could not be encoded for storage.
    #[error("cannot encode record for key '{key}': {reason}")]
    Encode { key: String, reason: String },
}

/// Contract every datastore driver must satisfy.
///
/// Keys form a flat, `/`-separated tree; values are opaque bytes. The
/// controller only ever uses the operations below, so any driver that can
/// put/get/delete/list/watch (etcd, consul, an in-process map) can back it.
pub trait KvStore: Send + Sync {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Returns true if the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete every key under `prefix`; returns how many were removed.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError>;

    /// List `(key, value)` pairs under `prefix`, ordered by key.
    fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Subscribe to changes under `prefix`. Events are delivered in commit
    /// order; the subscription ends when the receiver is dropped.
    fn watch(&self, prefix: &str) -> UnboundedReceiver<ChangeEvent>;
}
