//! Rank-biased overlap between ranked lists
//!
//! The estimator follows Webber, Moffat & Zobel, "A Similarity Measure for Indefinite
//! Rankings" (2010). Three views of the same pair are produced: a tight lower bound,
//! the residual mass that could still be gained beyond the evaluated depth, and an
//! extrapolated point estimate.

mod cancel;
mod estimator;
mod list;
mod overlap;

pub use cancel::CancellationToken;
pub use estimator::{rbo, rbo_ext, rbo_min, rbo_res, rbo_with_cancel};
pub use list::{RankedList, SimpleList};
pub use overlap::{agreement, overlap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All three RBO quantities for one pair of lists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RboScore {
    /// Tight lower bound at the evaluated depth
    pub min: f64,
    /// Upper bound on the overlap mass beyond the evaluated depth
    pub residual: f64,
    /// Point estimate, used as the graph edge weight
    pub extrapolated: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RboError {
    #[error("p must be between 0 and 1, got {0}")]
    Parameter(f64),
    #[error("ranked list `{0}` is empty")]
    DegenerateInput(String),
    #[error("computation was cancelled")]
    Cancelled,
}
