//! treeify-probe: print how a `TreeHashMap` grows and treeifies while a
//! fixed key script is inserted.
//!
//! The report goes to stdout. Set `RUST_LOG=debug` to also see resize and
//! treeify events on stderr.

use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let observations = treeify_hashmap::run_demo(&mut out)?;
    out.flush()?;
    tracing::info!(steps = observations.len(), "probe finished");
    Ok(())
}
