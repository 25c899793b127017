use canopy_metrics::{exponential_buckets, Counter, Gauge, Histogram, SharedRegistry};

#[derive(Clone, Debug)]
pub struct Metrics {
    /// Number of votes recorded in the ledger
    pub votes_recorded: Counter,

    /// Number of submissions rejected by validation
    pub submissions_rejected: Counter,

    /// Number of tree requests committed
    pub commits: Counter,

    /// Number of commits which failed or timed out
    pub commit_failures: Counter,

    /// Number of names with an open tally
    pub open_tallies: Gauge,

    /// Time taken by each commit, in seconds
    pub commit_latency: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            votes_recorded: Counter::default(),
            submissions_rejected: Counter::default(),
            commits: Counter::default(),
            commit_failures: Counter::default(),
            open_tallies: Gauge::default(),
            commit_latency: Histogram::new(exponential_buckets(0.001, 2.0, 14)),
        }
    }

    pub fn register(registry: &SharedRegistry) -> Self {
        let metrics = Self::new();

        registry.with_prefix("canopy", |registry| {
            registry.register(
                "votes_recorded",
                "Number of votes recorded in the ledger",
                metrics.votes_recorded.clone(),
            );

            registry.register(
                "submissions_rejected",
                "Number of submissions rejected by validation",
                metrics.submissions_rejected.clone(),
            );

            registry.register(
                "commits",
                "Number of tree requests committed",
                metrics.commits.clone(),
            );

            registry.register(
                "commit_failures",
                "Number of commits which failed or timed out",
                metrics.commit_failures.clone(),
            );

            registry.register(
                "open_tallies",
                "Number of names with an open tally",
                metrics.open_tallies.clone(),
            );

            registry.register(
                "commit_latency_seconds",
                "Time taken by each commit, in seconds",
                metrics.commit_latency.clone(),
            );
        });

        metrics
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
