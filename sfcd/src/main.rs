// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! SFC controller daemon: wires a datastore, bootstraps the controller
//! core, and runs the binding watcher until interrupted.

mod args;

use args::Args;
use clap::Parser;
use controller::Controller;
use controller::watcher::run_binding_watcher;
use datastore::{KvStore, MemStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // the datastore driver is deployment plumbing; the in-process store
    // keeps the daemon self-contained
    let store: Arc<dyn KvStore> = Arc::new(MemStore::new());
    let controller = Arc::new(Controller::new(store.clone()));

    if let Err(e) = controller.bootstrap(args.clean) {
        error!("bootstrap failed: {e}");
        std::process::exit(1);
    }

    let watcher = tokio::spawn(run_binding_watcher(controller.clone(), store));
    info!("sfcd up");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("signal handling failed: {e}");
    }
    info!("sfcd shutting down");
    watcher.abort();
}
