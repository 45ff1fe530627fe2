// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::store::{KvStore, StoreError};
use crate::watch::{ChangeEvent, ChangeKind};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

/// In-memory [`KvStore`]. Complete enough to stand in for a real driver:
/// ordered prefix listing and per-prefix watch subscriptions included.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemStoreInner>,
}

#[derive(Default)]
struct MemStoreInner {
    records: BTreeMap<String, Vec<u8>>,
    watchers: Vec<Watcher>,
}

struct Watcher {
    prefix: String,
    tx: UnboundedSender<ChangeEvent>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored (test helper).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemStoreInner> {
        // a poisoned store lock means a writer panicked mid-update; the
        // record map itself is always left consistent, so keep going
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MemStoreInner {
    fn notify(&mut self, kind: ChangeKind, key: &str, value: Option<&Vec<u8>>) {
        self.watchers.retain(|w| {
            if !key.starts_with(&w.prefix) {
                return true;
            }
            let event = ChangeEvent {
                kind,
                key: key.to_owned(),
                value: value.cloned(),
            };
            // drop subscriptions whose receiver is gone
            w.tx.send(event).is_ok()
        });
    }
}

impl KvStore for MemStore {
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        trace!("memstore put '{key}' ({} bytes)", value.len());
        inner.records.insert(key.to_owned(), value.clone());
        inner.notify(ChangeKind::Put, key, Some(&value));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().records.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let existed = inner.records.remove(key).is_some();
        if existed {
            trace!("memstore delete '{key}'");
            inner.notify(ChangeKind::Delete, key, None);
        }
        Ok(existed)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let doomed: Vec<String> = inner
            .records
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            inner.records.remove(key);
            inner.notify(ChangeKind::Delete, key, None);
        }
        Ok(doomed.len())
    }

    fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .lock()
            .records
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn watch(&self, prefix: &str) -> UnboundedReceiver<ChangeEvent> {
        let (tx, rx) = unbounded_channel();
        self.lock().watchers.push(Watcher {
            prefix: prefix.to_owned(),
            tx,
        });
        rx
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_get_delete() {
        let store = MemStore::new();
        store.put("/a/b", b"one".to_vec()).unwrap();
        assert_eq!(store.get("/a/b").unwrap(), Some(b"one".to_vec()));
        assert!(store.delete("/a/b").unwrap());
        assert!(!store.delete("/a/b").unwrap());
        assert_eq!(store.get("/a/b").unwrap(), None);
    }

    #[test]
    fn list_is_prefix_scoped_and_ordered() {
        let store = MemStore::new();
        store.put("/x/2", b"2".to_vec()).unwrap();
        store.put("/x/1", b"1".to_vec()).unwrap();
        store.put("/y/1", b"3".to_vec()).unwrap();
        let listed = store.list("/x/").unwrap();
        assert_eq!(
            listed.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["/x/1", "/x/2"]
        );
    }

    #[test]
    fn delete_prefix_counts() {
        let store = MemStore::new();
        store.put("/p/1", vec![]).unwrap();
        store.put("/p/2", vec![]).unwrap();
        store.put("/q/1", vec![]).unwrap();
        assert_eq!(store.delete_prefix("/p/").unwrap(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn watch_sees_puts_and_deletes() {
        let store = MemStore::new();
        let mut rx = store.watch("/w/");
        store.put("/w/k", b"v".to_vec()).unwrap();
        store.put("/other", b"v".to_vec()).unwrap();
        store.delete("/w/k").unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Put);
        assert_eq!(ev.key, "/w/k");
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Delete);
        assert_eq!(ev.key, "/w/k");
    }
}
