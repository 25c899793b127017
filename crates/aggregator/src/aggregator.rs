use std::time::Instant;

use tracing::{debug, error, info, warn};

use canopy_core_types::{validate, RawSubmission, Submission, TreeName, TreeType, ValidationError, Votes};
use canopy_core_votekeeper::{ConsensusResolver, Decision, InvariantViolation, VoteLedger};
use canopy_store::{RequestId, TreeStore};

use crate::gateway::{CommitGateway, PersistenceError};
use crate::metrics::Metrics;

/// What became of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The vote was recorded, the tally has not reached quorum yet
    Pending {
        name: TreeName,
        votes: Votes,
        threshold: Votes,
    },

    /// The vote completed the tally, which was committed and cleared
    Committed {
        name: TreeName,

        /// Type of the stored request
        tree_type: TreeType,
        votes: Votes,
        request_id: RequestId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    /// The tally was resolved but could not be committed.
    /// It is kept in the ledger, so the next vote retries the commit.
    #[error("tally for `{name}` reached {votes} votes but was not committed: {source}")]
    Persistence {
        name: TreeName,
        votes: Votes,
        #[source]
        source: PersistenceError,
    },

    #[error("concurrency invariant violated: {0}")]
    ConcurrencyInvariantViolation(#[from] InvariantViolation),
}

/// Runs submissions through validation, vote recording, resolution and commit.
pub struct Aggregator<S> {
    ledger: VoteLedger,
    resolver: ConsensusResolver,
    gateway: CommitGateway<S>,
    metrics: Metrics,
}

impl<S> Aggregator<S>
where
    S: TreeStore,
{
    pub fn new(resolver: ConsensusResolver, gateway: CommitGateway<S>, metrics: Metrics) -> Self {
        Self {
            ledger: VoteLedger::new(),
            resolver,
            gateway,
            metrics,
        }
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn resolver(&self) -> &ConsensusResolver {
        &self.resolver
    }

    pub fn gateway(&self) -> &CommitGateway<S> {
        &self.gateway
    }

    /// Validate a raw submission and, if it is well-formed, cast its vote.
    ///
    /// A rejected submission leaves the ledger untouched.
    pub async fn submit(&self, raw: &RawSubmission) -> Result<Outcome, SubmitError> {
        let submission = validate(raw).inspect_err(|e| {
            warn!(error = %e, "Rejected submission");
            self.metrics.submissions_rejected.inc();
        })?;

        self.submit_validated(submission).await
    }

    /// Cast the vote of an already validated submission.
    ///
    /// The lock on the submission's name is held until the tally is either
    /// left pending, committed and cleared, or kept after a failed commit.
    /// Commits for the same name are therefore serialized.
    #[tracing::instrument(name = "submit", skip_all, fields(name = %submission.name))]
    pub async fn submit_validated(&self, submission: Submission) -> Result<Outcome, SubmitError> {
        let outcome = self.run(submission).await;

        if let Err(SubmitError::ConcurrencyInvariantViolation(e)) = &outcome {
            error!(error = %e, "Aborting submission, ledger state is inconsistent");
        }

        self.metrics.open_tallies.set(gauge_value(self.ledger.open_tallies()));

        outcome
    }

    async fn run(&self, submission: Submission) -> Result<Outcome, SubmitError> {
        let Submission {
            name,
            tree_type,
            measurements,
        } = submission;

        let mut guard = self.ledger.lock(&name).await;

        let snapshot = guard.record(tree_type, measurements)?;
        self.metrics.votes_recorded.inc();

        let winner = match self.resolver.evaluate(&snapshot) {
            Decision::Pending { votes, threshold } => {
                debug!(votes, threshold, "Quorum not reached yet");
                return Ok(Outcome::Pending {
                    name,
                    votes,
                    threshold,
                });
            }
            Decision::Resolved(winner) => winner,
        };

        let resolved = snapshot.resolve(winner);
        info!(
            tree_type = %resolved.tree_type,
            votes = snapshot.total_votes,
            tally_id = %resolved.tally_id,
            "Quorum reached, committing tree request"
        );

        let started = Instant::now();
        let committed = self.gateway.commit(&resolved).await;
        self.metrics
            .commit_latency
            .observe(started.elapsed().as_secs_f64());

        match committed {
            Ok(receipt) => {
                let cleared = guard.clear()?;
                self.metrics.commits.inc();

                info!(
                    request_id = receipt.request_id,
                    tree_type = %receipt.tree_type,
                    duplicate = receipt.duplicate,
                    "Tree request added successfully"
                );

                Ok(Outcome::Committed {
                    name,
                    tree_type: receipt.tree_type,
                    votes: cleared.total_votes,
                    request_id: receipt.request_id,
                })
            }
            Err(e) => {
                // Dropping the guard keeps the tally, the next vote retries
                self.metrics.commit_failures.inc();
                warn!(error = %e, votes = snapshot.total_votes, "Failed to add the tree request");

                Err(SubmitError::Persistence {
                    name,
                    votes: snapshot.total_votes,
                    source: e,
                })
            }
        }
    }
}

fn gauge_value(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
