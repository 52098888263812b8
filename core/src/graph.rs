//! Similarity graph over a collection of ranked lists
//!
//! Every candidate pair becomes one task for the worker pool. The estimator is
//! symmetric, so by default each unordered pair yields a single edge.

use crate::pool::{compute_edge, BatchResults, Pool, PoolConfig, SharedList, SimilarityTask};
use crate::ClusteringError;
use list_clustering_rbo::CancellationToken;
use std::fmt;
use tracing::instrument;

/// Which pairs of lists get compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairPolicy {
    /// One edge per unordered pair `(i, j)` with `i < j`
    #[default]
    Unordered,
    /// One edge per direction
    Ordered,
}

impl PairPolicy {
    /// Number of pairs enumerated for `n` lists
    pub fn pair_count(&self, n: usize) -> usize {
        let ordered = n * n.saturating_sub(1);
        match self {
            PairPolicy::Unordered => ordered / 2,
            PairPolicy::Ordered => ordered,
        }
    }
}

impl std::str::FromStr for PairPolicy {
    type Err = ClusteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unordered" => Ok(Self::Unordered),
            "ordered" => Ok(Self::Ordered),
            _ => Err(ClusteringError::Validation(format!(
                "Invalid pair policy: {s}. Valid values: unordered, ordered"
            ))),
        }
    }
}

impl fmt::Display for PairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PairPolicy::Unordered => write!(f, "unordered"),
            PairPolicy::Ordered => write!(f, "ordered"),
        }
    }
}

/// Index pairs compared for `n` lists under `policy`
pub fn candidate_pairs(n: usize, policy: PairPolicy) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| {
        let start = match policy {
            PairPolicy::Unordered => i + 1,
            PairPolicy::Ordered => 0,
        };
        (start..n).filter(move |j| *j != i).map(move |j| (i, j))
    })
}

#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    /// Worker threads. Defaults to the number of CPUs.
    pub workers: Option<usize>,
    /// Task buffer size. Defaults to four tasks per worker.
    pub queue_capacity: Option<usize>,
    /// Outcome buffer size. Defaults to four outcomes per worker.
    pub results_capacity: Option<usize>,
    pub policy: PairPolicy,
}

impl GraphConfig {
    fn pool_config(&self, pairs: usize) -> PoolConfig {
        // No point starting more workers than there are pairs
        let workers = self.workers.unwrap_or_else(num_cpus::get).min(pairs);
        let mut config = PoolConfig::new(workers);
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        if let Some(capacity) = self.results_capacity {
            config = config.with_results_capacity(capacity);
        }
        config
    }
}

/// Compare every unordered pair of `lists` on all CPUs
pub fn compute_graph(p: f64, lists: &[SharedList]) -> Result<BatchResults, ClusteringError> {
    compute_graph_with(p, lists, &GraphConfig::default(), CancellationToken::new())
}

/// Compare the candidate pairs of `lists` on a worker pool.
///
/// Failed pairs do not abort the batch: the returned results hold every edge that
/// could be computed alongside the per-pair errors. `cancel` lets another thread
/// abandon the batch, in which case the remaining pairs report `PoolError::Cancelled`.
///
/// # Errors
/// Returns an error if the configuration asks for zero workers.
#[instrument(skip_all, fields(lists = lists.len(), policy = %config.policy))]
pub fn compute_graph_with(
    p: f64,
    lists: &[SharedList],
    config: &GraphConfig,
    cancel: CancellationToken,
) -> Result<BatchResults, ClusteringError> {
    let pairs = config.policy.pair_count(lists.len());
    let histogram = metrics::histogram!("lc_graph_pairs");
    histogram.record(pairs as f64);

    if pairs == 0 {
        tracing::debug!("Fewer than two lists, nothing to compare");
        return Ok(BatchResults::default());
    }

    let pool = Pool::with_cancellation(config.pool_config(pairs), cancel)?;
    for (i, j) in candidate_pairs(lists.len(), config.policy) {
        pool.add(SimilarityTask::new(lists[i].clone(), lists[j].clone(), p))?;
    }
    pool.done_adding();
    let results = pool.results();

    tracing::info!(
        "Computed {} edges out of {} pairs",
        results.edges.len(),
        pairs
    );
    if let Some(err) = results.first_error() {
        tracing::warn!("{} pairs failed, first failure: {err}", results.errors.len());
    }
    Ok(results)
}

/// Same edge set as [`compute_graph_with`], computed on the calling thread
pub fn compute_sequential(p: f64, lists: &[SharedList], policy: PairPolicy) -> BatchResults {
    let cancel = CancellationToken::new();
    let mut results = BatchResults::default();

    for (i, j) in candidate_pairs(lists.len(), policy) {
        let task = SimilarityTask::new(lists[i].clone(), lists[j].clone(), p);
        match compute_edge(&task, &cancel) {
            Ok(edge) => results.edges.push(edge),
            Err(err) => results.errors.push(err),
        }
    }

    results
}
