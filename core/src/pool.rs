//! Bounded worker pool for pairwise similarity
use crate::PoolError;
use list_clustering_rbo::{rbo_with_cancel, CancellationToken, RankedList, RboError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{instrument, Span};

/// Ranked list shared read-only between worker threads
pub type SharedList = Arc<dyn RankedList + Send + Sync>;

/// One pairwise comparison, consumed exactly once by a worker
#[derive(Clone)]
pub struct SimilarityTask {
    pub source: SharedList,
    pub target: SharedList,
    /// Persistence probability
    pub p: f64,
}

impl SimilarityTask {
    pub fn new(source: SharedList, target: SharedList, p: f64) -> Self {
        Self { source, target, p }
    }
}

impl fmt::Debug for SimilarityTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityTask")
            .field("source", &self.source.label())
            .field("target", &self.target.label())
            .field("p", &self.p)
            .finish()
    }
}

/// Weighted edge between two lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Extrapolated RBO of the pair
    pub similarity: f64,
}

/// Everything a batch produced. Edge order is not meaningful.
#[derive(Debug, Clone, Default)]
pub struct BatchResults {
    pub edges: Vec<Edge>,
    /// Failures in the order the collector received them
    pub errors: Vec<PoolError>,
}

impl BatchResults {
    pub fn first_error(&self) -> Option<&PoolError> {
        self.errors.first()
    }

    /// Split into the edges and the first failure, if any
    pub fn into_parts(self) -> (Vec<Edge>, Option<PoolError>) {
        let first = self.errors.into_iter().next();
        (self.edges, first)
    }

    /// Number of terminal outcomes
    pub fn len(&self) -> usize {
        self.edges.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Tasks buffered before `add` blocks
    pub queue_capacity: usize,
    /// Outcomes buffered between the workers and the collector
    pub results_capacity: usize,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue_capacity: workers * 4,
            results_capacity: workers * 4,
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_results_capacity(mut self, results_capacity: usize) -> Self {
        self.results_capacity = results_capacity;
        self
    }
}

/// Fixed set of worker threads fed through a bounded channel.
///
/// Single use: tasks are added until [`Pool::done_adding`], then [`Pool::results`]
/// drains the pool. A single collector thread owns the accumulated edges and errors.
pub struct Pool {
    /// Task intake shared by all workers
    sender: async_channel::Sender<PoolCommand>,
    pending: Arc<Pending>,
    cancel: CancellationToken,
    /// Set when the pool is dropped unconsumed. Never shared with the caller.
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    collector: Option<JoinHandle<BatchResults>>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    pub fn with_cancellation(
        config: PoolConfig,
        cancel: CancellationToken,
    ) -> Result<Self, PoolError> {
        if config.workers == 0 {
            return Err(PoolError::InvalidConcurrency);
        }
        tracing::info!("Starting {} similarity workers", config.workers);

        let (sender, receiver) = async_channel::bounded(config.queue_capacity.max(1));
        let (outcome_sender, outcome_receiver) =
            async_channel::bounded(config.results_capacity.max(1));
        let pending = Arc::new(Pending::default());
        let shutdown = CancellationToken::new();

        let workers = (0..config.workers)
            .map(|_| {
                let receiver_clone = receiver.clone();
                let outcome_sender_clone = outcome_sender.clone();
                let cancel_clone = cancel.clone();
                let shutdown_clone = shutdown.clone();
                std::thread::spawn(move || {
                    similarity_worker(
                        receiver_clone,
                        outcome_sender_clone,
                        cancel_clone,
                        shutdown_clone,
                    )
                })
            })
            .collect();
        // Workers hold the remaining outcome senders: the collector stops once they all exit
        drop(outcome_sender);

        let pending_clone = pending.clone();
        let collector =
            std::thread::spawn(move || collect_outcomes(outcome_receiver, pending_clone));

        Ok(Self {
            sender,
            pending,
            cancel,
            shutdown,
            workers,
            collector: Some(collector),
        })
    }

    /// Submit a task. Blocks while the intake buffer is full.
    #[instrument(skip_all)]
    pub fn add(&self, task: SimilarityTask) -> Result<(), PoolError> {
        // Registered before the send so a fast worker can never complete it first
        self.pending.increment();
        let command = PoolCommand {
            task,
            span: Span::current(),
        };
        if self.sender.send_blocking(command).is_err() {
            self.pending.complete();
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Close the intake. Queued tasks still run.
    pub fn done_adding(&self) {
        if self.sender.close() {
            tracing::debug!("Task intake closed with {} pending", self.pending());
        }
    }

    /// Tasks submitted and not yet collected
    pub fn pending(&self) -> usize {
        self.pending.current()
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask workers to skip the remaining tasks. Skipped tasks report `PoolError::Cancelled`.
    ///
    /// This cancels the token given to [`Pool::with_cancellation`], along with every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for every submitted task to reach an outcome and return them all.
    ///
    /// Closes the intake if [`Pool::done_adding`] was not called.
    #[instrument(skip_all)]
    pub fn results(mut self) -> BatchResults {
        self.done_adding();
        self.pending.wait_idle();

        for worker in self.workers.drain(..) {
            worker
                .join()
                .expect("Similarity worker panicked. This is a bug.");
        }
        let results = self
            .collector
            .take()
            .expect("Pool collector already joined. This is a bug.")
            .join()
            .expect("Pool collector panicked. This is a bug.");

        tracing::debug!(
            "Pool drained: {} edges, {} errors",
            results.edges.len(),
            results.errors.len()
        );
        results
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // Only reached with live threads when `results` was never called
        if self.collector.is_none() {
            return;
        }
        // The caller's token may be shared with other batches: only stop this pool
        self.shutdown.cancel();
        self.sender.close();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(collector) = self.collector.take() {
            let _ = collector.join();
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("workers", &self.workers.len())
            .field("pending", &self.pending())
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

#[derive(Debug)]
struct PoolCommand {
    task: SimilarityTask,
    span: Span,
}

type Outcome = Result<Edge, PoolError>;

/// Counting barrier over submitted tasks
#[derive(Debug, Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn increment(&self) {
        *self.lock() += 1;
    }

    fn complete(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn current(&self) -> usize {
        *self.lock()
    }

    fn wait_idle(&self) {
        let count = self.lock();
        let _idle = self
            .idle
            .wait_while(count, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

fn similarity_worker(
    receiver: async_channel::Receiver<PoolCommand>,
    outcomes: async_channel::Sender<Outcome>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
) {
    while let Ok(PoolCommand { task, span }) = receiver.recv_blocking() {
        let outcome = match shutdown.is_cancelled() {
            true => Err(cancelled(&task)),
            false => span.in_scope(|| compute_edge(&task, &cancel)),
        };
        if outcomes.send_blocking(outcome).is_err() {
            tracing::error!("Pool collector dropped the receiver. This is a bug.");
            break;
        }
    }
}

/// Run the estimator for one task, mapping its failure to the pair.
///
/// A panic inside a `RankedList` implementation is caught and reported as
/// `PoolError::Panicked` so that every task still reaches exactly one outcome.
pub(crate) fn compute_edge(task: &SimilarityTask, cancel: &CancellationToken) -> Outcome {
    panic::catch_unwind(AssertUnwindSafe(|| estimate_edge(task, cancel))).unwrap_or_else(|_| {
        Err(PoolError::Panicked {
            source_label: label_of(&task.source),
            target_label: label_of(&task.target),
        })
    })
}

/// Label of a list that may have panicked already
fn label_of(list: &SharedList) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| list.label().to_string()))
        .unwrap_or_else(|_| String::from("<unknown>"))
}

fn cancelled(task: &SimilarityTask) -> PoolError {
    PoolError::Cancelled {
        source_label: label_of(&task.source),
        target_label: label_of(&task.target),
    }
}

fn estimate_edge(task: &SimilarityTask, cancel: &CancellationToken) -> Outcome {
    if cancel.is_cancelled() {
        return Err(cancelled(task));
    }
    let source_label = task.source.label();
    let target_label = task.target.label();

    let start = Instant::now();
    let score = rbo_with_cancel(&*task.source, &*task.target, task.p, cancel);
    let histogram = metrics::histogram!("lc_pool_task_duration");
    histogram.record(start.elapsed().as_secs_f64());

    match score {
        Ok(score) => Ok(Edge {
            source: source_label.to_string(),
            target: target_label.to_string(),
            similarity: score.extrapolated,
        }),
        Err(RboError::Cancelled) => Err(cancelled(task)),
        Err(error) => Err(PoolError::Task {
            source_label: source_label.to_string(),
            target_label: target_label.to_string(),
            error,
        }),
    }
}

fn collect_outcomes(
    receiver: async_channel::Receiver<Outcome>,
    pending: Arc<Pending>,
) -> BatchResults {
    let mut results = BatchResults::default();

    while let Ok(outcome) = receiver.recv_blocking() {
        match outcome {
            Ok(edge) => {
                let counter = metrics::counter!("lc_pool_task_success");
                counter.increment(1);
                results.edges.push(edge);
            }
            Err(err) => {
                let counter = metrics::counter!("lc_pool_task_failure", "err" => err.kind());
                counter.increment(1);
                tracing::warn!("{err}");
                results.errors.push(err);
            }
        }
        pending.complete();
    }

    results
}
