use list_clustering_core::{Edge, RankedList, SharedList};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct Score(pub f64);

impl Score {
    fn is_close(&self, other: &Self, abs_tol: f64) -> bool {
        is_close::default()
            .abs_tol(abs_tol)
            .is_close(self.0, other.0)
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.is_close(other, 1e-9)
    }
}

/// Search results for a keyword, the way a SERP scraper would hand them over
#[derive(Debug)]
pub struct Serp {
    pub keyword: String,
    pub urls: Vec<String>,
    /// Only the first `depth` results are ranked
    pub depth: usize,
}

impl RankedList for Serp {
    fn label(&self) -> &str {
        &self.keyword
    }

    fn members(&self) -> &[String] {
        &self.urls
    }

    fn len(&self) -> usize {
        self.depth.min(self.urls.len())
    }
}

pub fn serp(keyword: &str, urls: &[&str], depth: usize) -> SharedList {
    Arc::new(Serp {
        keyword: keyword.to_string(),
        urls: urls.iter().map(|u| u.to_string()).collect(),
        depth,
    })
}

pub fn by_pair(edges: &[Edge]) -> HashMap<(String, String), Score> {
    edges
        .iter()
        .map(|e| ((e.source.clone(), e.target.clone()), Score(e.similarity)))
        .collect()
}
