//! Rank-biased overlap graph builder
mod logging;

pub use logging::init_logging;

use anyhow::{bail, Context, Result};
use list_clustering_core::{
    compute_graph_with, BatchResults, CancellationToken, Edge, GraphConfig, PairPolicy,
    SharedList, SimpleList,
};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Read a JSON array of `{"label": ..., "members": [...]}` objects
pub fn load_lists(path: &Path) -> Result<Vec<SharedList>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let lists: Vec<SimpleList> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse ranked lists from {}", path.display()))?;

    let mut labels = HashSet::with_capacity(lists.len());
    for list in &lists {
        if !labels.insert(list.label.as_str()) {
            tracing::warn!("Label `{}` appears more than once", list.label);
        }
    }

    Ok(lists
        .into_iter()
        .map(|list| Arc::new(list) as SharedList)
        .collect())
}

/// Write edges as pretty JSON to `path`, or to stdout when `None`
pub fn write_edges(edges: &[Edge], path: Option<&Path>) -> Result<()> {
    let payload = serde_json::to_string_pretty(edges)?;
    match path {
        Some(path) => fs::write(path, payload)
            .with_context(|| format!("Failed to write edges to {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{payload}").context("Failed to write edges to stdout")?;
        }
    }
    Ok(())
}

/// Cancel `token` unless the returned sender is used or dropped within `timeout`
fn watchdog(token: CancellationToken, timeout: Duration) -> mpsc::Sender<()> {
    let (sender, receiver) = mpsc::channel::<()>();
    std::thread::spawn(move || {
        if let Err(mpsc::RecvTimeoutError::Timeout) = receiver.recv_timeout(timeout) {
            tracing::warn!("Timeout of {timeout:?} reached, cancelling remaining pairs");
            token.cancel();
        }
    });
    sender
}

/// Build the similarity graph for the lists stored in `input`
pub fn run(
    input: &Path,
    output: Option<&Path>,
    p: f64,
    workers: Option<usize>,
    queue_capacity: Option<usize>,
    policy: PairPolicy,
    timeout: Option<Duration>,
) -> Result<BatchResults> {
    if !(0.0..=1.0).contains(&p) {
        bail!("`p` must be between 0 and 1, got {p}");
    }

    let lists = load_lists(input)?;
    tracing::info!("Loaded {} ranked lists", lists.len());

    let config = GraphConfig {
        workers,
        queue_capacity,
        policy,
        ..Default::default()
    };
    let token = CancellationToken::new();
    let guard = timeout.map(|timeout| watchdog(token.clone(), timeout));

    let results = compute_graph_with(p, &lists, &config, token)?;
    drop(guard);

    if results.edges.is_empty() {
        if let Some(err) = results.first_error() {
            bail!("Every pair failed, first error: {err}");
        }
    }
    for err in &results.errors {
        tracing::debug!("{err}");
    }

    write_edges(&results.edges, output)?;
    Ok(results)
}
