// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "sfcd", about = "SFC controller daemon")]
pub struct Args {
    /// Remove the controller subtree and every rendered artifact before
    /// bootstrapping, yielding an empty controller.
    #[arg(long)]
    pub clean: bool,

    /// Tracing filter, e.g. `info` or `controller=debug`.
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}
