// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Binding watcher: a background task that keeps the VNF-to-node binding
//! cache in sync with the datastore. Two triggers feed it: change events
//! on the binding prefix, and a one-minute safety timer that re-lists the
//! prefix and reconciles any drift the watch may have missed.

use crate::Controller;
use config::{VnfToNodeMap, keys};
use datastore::{ChangeEvent, ChangeKind, KvStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const RECONCILE_PERIOD: Duration = Duration::from_secs(60);

/// Run the watcher until the store drops the watch channel.
pub async fn run_binding_watcher(controller: Arc<Controller>, store: Arc<dyn KvStore>) {
    let prefix = keys::vnf_to_node_prefix();
    let mut events = store.watch(&prefix);
    let mut ticker = tokio::time::interval(RECONCILE_PERIOD);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // the first tick fires immediately; bootstrap already loaded bindings
    ticker.tick().await;

    info!("binding watcher running on '{prefix}'");
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    None => {
                        warn!("binding watch channel closed, watcher exiting");
                        return;
                    }
                    Some(event) => handle_event(&controller, &prefix, event),
                }
            }
            _ = ticker.tick() => {
                reconcile(&controller, store.as_ref(), &prefix);
            }
        }
    }
}

fn handle_event(controller: &Controller, prefix: &str, event: ChangeEvent) {
    match event.kind {
        ChangeKind::Put => match event.value_as::<VnfToNodeMap>() {
            Ok(Some(v2n)) => {
                debug!("binding watcher: put '{}'", event.key);
                if let Err(e) = controller.binding_update(v2n) {
                    error!("binding update failed: {e}");
                }
            }
            Ok(None) => warn!("binding watcher: put without value at '{}'", event.key),
            Err(e) => error!("binding watcher: undecodable value at '{}': {e}", event.key),
        },
        ChangeKind::Delete => {
            let vnf = event.key.trim_start_matches(prefix);
            debug!("binding watcher: delete '{vnf}'");
            if let Err(e) = controller.binding_remove(vnf) {
                error!("binding removal failed: {e}");
            }
        }
    }
}

/// Safety-timer pass: list the watched prefix and repair any divergence
/// between the datastore and the binding cache.
fn reconcile(controller: &Controller, store: &dyn KvStore, prefix: &str) {
    let listed = match store.list(prefix) {
        Ok(listed) => listed,
        Err(e) => {
            error!("binding reconcile: cannot list '{prefix}': {e}");
            return;
        }
    };

    let mut stored: BTreeMap<String, String> = BTreeMap::new();
    for (key, bytes) in listed {
        match serde_json::from_slice::<VnfToNodeMap>(&bytes) {
            Ok(v2n) => {
                stored.insert(v2n.vnf, v2n.node);
            }
            Err(e) => warn!("binding reconcile: skipping undecodable '{key}': {e}"),
        }
    }

    let cached = controller.bindings();
    for (vnf, node) in &stored {
        if cached.get(vnf) != Some(node) {
            info!("binding reconcile: repairing {vnf} → {node}");
            if let Err(e) = controller.binding_update(VnfToNodeMap {
                vnf: vnf.clone(),
                node: node.clone(),
            }) {
                error!("binding reconcile: update failed: {e}");
            }
        }
    }
    for vnf in cached.keys() {
        if !stored.contains_key(vnf) {
            info!("binding reconcile: dropping stale {vnf}");
            if let Err(e) = controller.binding_remove(vnf) {
                error!("binding reconcile: removal failed: {e}");
            }
        }
    }
}
