pub mod graph;
pub mod pool;

pub use graph::{
    candidate_pairs, compute_graph, compute_graph_with, compute_sequential, GraphConfig,
    PairPolicy,
};
pub use list_clustering_rbo::{CancellationToken, RankedList, RboError, RboScore, SimpleList};
pub use pool::{BatchResults, Edge, Pool, PoolConfig, SharedList, SimilarityTask};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("could not compute RBO for {source_label} -> {target_label}: {error}")]
    Task {
        source_label: String,
        target_label: String,
        #[source]
        error: RboError,
    },
    #[error("computation for {source_label} -> {target_label} was cancelled")]
    Cancelled {
        source_label: String,
        target_label: String,
    },
    #[error("computation for {source_label} -> {target_label} panicked")]
    Panicked {
        source_label: String,
        target_label: String,
    },
    #[error("pool is not accepting new tasks")]
    Closed,
    #[error("pool concurrency must be at least 1")]
    InvalidConcurrency,
}

impl PoolError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::Task { .. } => "task",
            PoolError::Cancelled { .. } => "cancelled",
            PoolError::Panicked { .. } => "panicked",
            PoolError::Closed => "closed",
            PoolError::InvalidConcurrency => "concurrency",
        }
    }
}

#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error("Input validation error: {0}")]
    Validation(String),
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}
