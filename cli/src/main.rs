use anyhow::Result;
use clap::Parser;
use list_clustering_core::PairPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// App Configuration
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file holding an array of ranked lists.
    /// Each list is an object like `{"label": "running shoes", "members": ["nike.com", ...]}`
    /// with members in rank order.
    #[clap(long, env)]
    input: PathBuf,

    /// Where to write the edge list. Defaults to stdout.
    #[clap(long, env)]
    output: Option<PathBuf>,

    /// Persistence parameter: the probability of looking at rank k + 1 after rank k.
    /// Must be within [0, 1]. Higher values give more weight to deep ranks.
    #[clap(default_value = "0.9", long, env = "RBO_P")]
    p: f64,

    /// Number of worker threads computing pair similarities.
    /// Default to the number of CPU cores on the machine.
    #[clap(long, env)]
    workers: Option<usize>,

    /// How many pairs can wait for a worker before submission blocks.
    /// Default to four per worker.
    #[clap(long, env)]
    queue_capacity: Option<usize>,

    /// Which pairs get compared. Valid values: unordered, ordered.
    ///
    /// `unordered` emits a single edge per pair of lists, `ordered` emits both directions.
    #[clap(default_value = "unordered", long, env)]
    pair_policy: String,

    /// Abandon the pairs still pending after this many milliseconds.
    /// Edges computed so far are still written.
    #[clap(long, env)]
    timeout_ms: Option<u64>,

    /// Outputs the logs in JSON format (useful for telemetry)
    #[clap(long, env)]
    json_output: bool,

    /// Disables the span logging trace
    #[clap(long, env)]
    disable_spans: bool,
}

impl Args {
    pub fn parse_pair_policy(&self) -> Result<PairPolicy> {
        Ok(self.pair_policy.parse()?)
    }
}

#[cfg(test)]
mod main_tests;

fn main() -> Result<()> {
    // Pattern match configuration
    let args: Args = Args::parse();

    list_clustering_cli::init_logging(args.json_output, args.disable_spans);

    tracing::info!("{args:?}");

    let policy = args.parse_pair_policy()?;

    list_clustering_cli::run(
        &args.input,
        args.output.as_deref(),
        args.p,
        args.workers,
        args.queue_capacity,
        policy,
        args.timeout_ms.map(Duration::from_millis),
    )?;

    Ok(())
}
