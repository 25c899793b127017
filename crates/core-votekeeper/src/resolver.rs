use core::cmp::Reverse;

use canopy_core_types::{TreeType, Votes, DEFAULT_QUORUM};

use crate::count::TypeVotes;
use crate::ledger::TallySnapshot;

/// What to do with a tally after a vote was recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Quorum not reached yet
    Pending { votes: Votes, threshold: Votes },

    /// Quorum reached, the given type wins
    Resolved(TreeType),
}

/// Decides when a tally has enough votes, and which type it settles on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConsensusResolver {
    threshold: Votes,
}

impl ConsensusResolver {
    /// A threshold of zero is treated as one: a tally always needs a vote.
    pub fn new(threshold: Votes) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> Votes {
        self.threshold
    }

    /// Once the tally holds at least `threshold` votes, resolve it to the type
    /// with the most votes. Ties go to the type which reached that count first.
    pub fn evaluate(&self, snapshot: &TallySnapshot) -> Decision {
        if snapshot.total_votes < self.threshold {
            return self.pending(snapshot);
        }

        match leader(&snapshot.votes) {
            Some(leader) => Decision::Resolved(leader.tree_type.clone()),
            None => self.pending(snapshot),
        }
    }

    fn pending(&self, snapshot: &TallySnapshot) -> Decision {
        Decision::Pending {
            votes: snapshot.total_votes,
            threshold: self.threshold,
        }
    }
}

impl Default for ConsensusResolver {
    fn default() -> Self {
        Self::new(DEFAULT_QUORUM)
    }
}

fn leader(votes: &[TypeVotes]) -> Option<&TypeVotes> {
    votes
        .iter()
        .max_by_key(|t| (t.votes, Reverse(t.reached_at)))
}
