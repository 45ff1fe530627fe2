// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The transaction engine. A transaction is a scoped span that accumulates
//! *before* and *after* artifact sets keyed by artifact key; the commit at
//! `txn_end` emits the minimal mutation set against the datastore.
//!
//! Many renders touch the same artifact several times (a bridge domain
//! gains interfaces one at a time). Committing per mutation would flap the
//! downstream agents, so nothing is written until the end of the span: at
//! most one write per final-state artifact, and exactly the necessary
//! deletes.

use crate::cache::ControllerCore;
use config::artifact::Artifact;
use config::{CoreError, CoreResult, RenderedArtifact};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Default)]
pub struct Txn {
    pub(crate) in_progress: bool,
    pub(crate) before: BTreeMap<String, Artifact>,
    pub(crate) after: BTreeMap<String, Artifact>,
}

/// What a commit actually did, for callers that care about minimality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub writes: usize,
    pub deletes: usize,
}

impl CommitStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes == 0 && self.deletes == 0
    }
}

impl ControllerCore {
    /// Open a transaction. Nested begins are a programming error and are
    /// rejected to keep the single-writer discipline honest.
    pub(crate) fn txn_begin(&mut self) -> CoreResult {
        if self.txn.in_progress {
            return Err(CoreError::NestedTransaction);
        }
        debug!("transaction start");
        self.txn.in_progress = true;
        self.txn.before.clear();
        self.txn.after.clear();
        Ok(())
    }

    /// Stage an artifact into the *after* set and record it in the owning
    /// entity's manifest (once per key).
    pub(crate) fn txn_add_after(
        &mut self,
        manifest: &mut Vec<RenderedArtifact>,
        artifact: Artifact,
    ) {
        if !self.txn.after.contains_key(&artifact.key) {
            manifest.push(artifact.manifest_entry());
        }
        debug!("staging artifact '{}'", artifact.key);
        self.txn.after.insert(artifact.key.clone(), artifact);
    }

    /// Stage an artifact on behalf of an entity being rendered.
    pub(crate) fn stage(&mut self, state: &mut config::EntityState, artifact: Artifact) {
        self.txn_add_after(&mut state.rendered_entries, artifact);
    }

    /// Copy the current record of every manifest entry into the *before*
    /// set. A key missing from the index gets a skeleton entry so that its
    /// deletion still fires at commit.
    pub(crate) fn txn_capture_before(&mut self, manifest: &[RenderedArtifact]) {
        for entry in manifest {
            match self.artifacts.get(&entry.key) {
                Some(artifact) => {
                    self.txn.before.insert(entry.key.clone(), artifact.clone());
                }
                None => {
                    warn!("missing artifact index entry for '{}'", entry.key);
                    self.txn
                        .before
                        .insert(entry.key.clone(), Artifact::skeleton(&entry.key, entry.kind));
                }
            }
        }
    }

    /// A render failed mid-way: erase everything staged so far so that
    /// commit tears down whatever this render had produced.
    pub(crate) fn txn_cleanup_rendering(&mut self) {
        debug!("render failed: clearing staged artifacts");
        self.txn.after.clear();
    }

    /// Commit: delete before-entries absent from the after set, drop
    /// unchanged after-entries, write the rest, then fold the survivors
    /// into the artifact index.
    pub(crate) fn txn_end(&mut self) -> CoreResult<CommitStats> {
        if !self.txn.in_progress {
            return Err(CoreError::NoTransaction);
        }
        let mut stats = CommitStats::default();

        let before = std::mem::take(&mut self.txn.before);
        for (key, before_entry) in before {
            match self.txn.after.get(&key) {
                None => {
                    info!("transaction end: removing '{key}'");
                    self.broker.delete(&key)?;
                    self.artifacts.remove(&key);
                    stats.deletes += 1;
                }
                Some(after_entry) if *after_entry == before_entry => {
                    // unchanged: make sure it is not resent
                    self.txn.after.remove(&key);
                }
                Some(_) => {
                    debug!("transaction end: '{key}' changed, will rewrite");
                }
            }
        }

        let after = std::mem::take(&mut self.txn.after);
        for (key, artifact) in &after {
            info!("transaction end: writing '{key}'");
            let bytes = artifact.encode_value()?;
            self.broker.store().put(key, bytes)?;
            stats.writes += 1;
        }
        for (key, artifact) in after {
            self.artifacts.insert(key, artifact);
        }

        self.txn.in_progress = false;
        debug!(
            "transaction end: {} writes, {} deletes",
            stats.writes, stats.deletes
        );
        Ok(stats)
    }

    /// Drop a transaction without committing anything further. Used when an
    /// operation fails after `txn_begin`; whatever the commit already wrote
    /// stays (the datastore is the source of truth and the next full render
    /// reconciles).
    pub(crate) fn txn_abort(&mut self) {
        self.txn.in_progress = false;
        self.txn.before.clear();
        self.txn.after.clear();
    }

    /// Run `f` inside its own transaction span and commit.
    pub(crate) fn with_txn(
        &mut self,
        f: impl FnOnce(&mut Self) -> CoreResult,
    ) -> CoreResult<CommitStats> {
        self.txn_begin()?;
        if let Err(e) = f(self) {
            self.txn_abort();
            return Err(e);
        }
        match self.txn_end() {
            Ok(stats) => Ok(stats),
            Err(e) => {
                self.txn_abort();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use config::artifact::ArtifactKind;
    use config::types::{AdminStatus, RxMode};
    use datastore::{Broker, MemStore};
    use std::sync::Arc;

    fn core() -> (ControllerCore, Arc<MemStore>) {
        let store = Arc::new(MemStore::new());
        let core = ControllerCore::new(Broker::new(store.clone()));
        (core, store)
    }

    fn loopback(name: &str, address: &str) -> Artifact {
        Artifact::loopback(
            "n1",
            name,
            vec![address.to_string()],
            None,
            1500,
            AdminStatus::Enabled,
            RxMode::Interrupt,
        )
    }

    #[test]
    fn nested_begin_rejected() {
        let (mut core, _) = core();
        core.txn_begin().unwrap();
        assert_eq!(core.txn_begin(), Err(CoreError::NestedTransaction));
    }

    #[test]
    fn end_without_begin_rejected() {
        let (mut core, _) = core();
        assert!(matches!(core.txn_end(), Err(CoreError::NoTransaction)));
    }

    #[test]
    fn commit_writes_once_per_final_artifact() {
        let (mut core, store) = core();
        let mut manifest = Vec::new();
        core.txn_begin().unwrap();
        // staged twice, written once with the final payload
        core.txn_add_after(&mut manifest, loopback("lo0", "10.0.0.1/24"));
        core.txn_add_after(&mut manifest, loopback("lo0", "10.0.0.2/24"));
        let stats = core.txn_end().unwrap();
        assert_eq!(stats, CommitStats { writes: 1, deletes: 0 });
        assert_eq!(manifest.len(), 1);
        assert_eq!(store.len(), 1);
        let indexed = core.artifacts.values().next().unwrap();
        assert_eq!(indexed, &loopback("lo0", "10.0.0.2/24"));
    }

    #[test]
    fn unchanged_artifact_is_not_rewritten() {
        let (mut core, _) = core();
        let mut manifest = Vec::new();
        core.txn_begin().unwrap();
        core.txn_add_after(&mut manifest, loopback("lo0", "10.0.0.1/24"));
        core.txn_end().unwrap();

        // re-render the same artifact under a captured before set
        core.txn_begin().unwrap();
        core.txn_capture_before(&manifest);
        let mut manifest2 = Vec::new();
        core.txn_add_after(&mut manifest2, loopback("lo0", "10.0.0.1/24"));
        let stats = core.txn_end().unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn vanished_key_is_deleted() {
        let (mut core, store) = core();
        let mut manifest = Vec::new();
        core.txn_begin().unwrap();
        core.txn_add_after(&mut manifest, loopback("lo0", "10.0.0.1/24"));
        core.txn_end().unwrap();
        assert_eq!(store.len(), 1);

        core.txn_begin().unwrap();
        core.txn_capture_before(&manifest);
        let stats = core.txn_end().unwrap();
        assert_eq!(stats, CommitStats { writes: 0, deletes: 1 });
        assert!(store.is_empty());
        assert!(core.artifacts.is_empty());
    }

    #[test]
    fn missing_index_entry_still_deletes() {
        let (mut core, _) = core();
        // a manifest entry whose artifact was never indexed
        let manifest = vec![RenderedArtifact {
            key: "/forwarder/n1/vpp/interface/ghost".to_string(),
            kind: ArtifactKind::Interface,
        }];
        core.txn_begin().unwrap();
        core.txn_capture_before(&manifest);
        let stats = core.txn_end().unwrap();
        assert_eq!(stats.deletes, 1);
    }

    #[test]
    fn cleanup_rendering_tears_down_staged_state() {
        let (mut core, store) = core();
        let mut manifest = Vec::new();
        core.txn_begin().unwrap();
        core.txn_add_after(&mut manifest, loopback("lo0", "10.0.0.1/24"));
        core.txn_end().unwrap();

        core.txn_begin().unwrap();
        core.txn_capture_before(&manifest);
        let mut manifest2 = Vec::new();
        core.txn_add_after(&mut manifest2, loopback("lo0", "10.0.0.1/24"));
        core.txn_cleanup_rendering();
        let stats = core.txn_end().unwrap();
        assert_eq!(stats, CommitStats { writes: 0, deletes: 1 });
        assert!(store.is_empty());
    }
}
