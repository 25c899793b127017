//! The vote ledger: every open tally, keyed by tree name.
//!
//! Each name has its own lock. A [`LedgerGuard`] holds the lock for one name
//! for as long as the caller needs, so that recording a vote, evaluating the
//! tally and committing it happen as a single step with respect to other
//! submissions for the same name. Tallies for different names never contend.
//!
//! The ledger lives in memory only: a restart discards every open tally.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

use canopy_core_types::{
    Measurements, ResolvedSubmission, Submission, TallyId, TreeName, TreeType, Votes,
};

use crate::count::{TypeVotes, VoteCount};

/// Raised when the tally state contradicts the locking discipline,
/// eg. the per-type counts no longer add up to the total.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("tally for `{name}` counts {counted} votes across types but holds a total of {total}")]
    CountMismatch {
        name: TreeName,
        counted: Votes,
        total: Votes,
    },

    #[error("no open tally for `{0}` to clear")]
    NothingToClear(TreeName),
}

/// Immutable copy of a tally, handed out after each recorded vote.
#[derive(Clone, Debug, PartialEq)]
pub struct TallySnapshot {
    pub tally_id: TallyId,
    pub name: TreeName,
    pub total_votes: Votes,

    /// Per-type counts, in order of first appearance
    pub votes: Vec<TypeVotes>,

    /// Measurements of the most recent submission for that name
    pub representative: Measurements,
}

impl TallySnapshot {
    /// Number of votes for the given type.
    pub fn votes_for(&self, tree_type: &TreeType) -> Votes {
        self.votes
            .iter()
            .find(|t| &t.tree_type == tree_type)
            .map_or(0, |t| t.votes)
    }

    /// Build the submission to commit once `tree_type` has won this tally.
    pub fn resolve(&self, tree_type: TreeType) -> ResolvedSubmission {
        ResolvedSubmission {
            tally_id: self.tally_id,
            name: self.name.clone(),
            tree_type,
            measurements: self.representative,
        }
    }
}

#[derive(Clone, Debug)]
struct Tally {
    id: TallyId,
    count: VoteCount,
    representative: Measurements,
}

#[derive(Debug, Default)]
struct Slot {
    tally: Option<Tally>,

    /// Set once the slot has been removed from the ledger.
    /// A retired slot must never be written to again.
    retired: bool,
}

type SharedSlot = Arc<Mutex<Slot>>;

/// Keeps track of the open tallies, one per tree name.
#[derive(Debug)]
pub struct VoteLedger {
    slots: DashMap<TreeName, SharedSlot>,
    next_tally_id: AtomicU64,

    /// Slots holding a tally, as opposed to slots merely locked
    open: AtomicUsize,
}

impl VoteLedger {
    /// Tally ids start from the current time in microseconds, so that they
    /// keep increasing across restarts of the process.
    pub fn new() -> Self {
        let start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX / 2));

        Self::starting_at(start)
    }

    /// Create a ledger whose first tally gets the id `first + 1`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            slots: DashMap::new(),
            next_tally_id: AtomicU64::new(first),
            open: AtomicUsize::new(0),
        }
    }

    /// Acquire the lock for `name`, waiting for any other holder to release it.
    pub async fn lock(&self, name: &TreeName) -> LedgerGuard<'_> {
        loop {
            // The map entry must not be held across the await below.
            let slot = self.slots.entry(name.clone()).or_default().value().clone();
            let state = Arc::clone(&slot).lock_owned().await;

            if state.retired {
                trace!(%name, "Slot was retired while waiting, retrying");
                continue;
            }

            return LedgerGuard {
                ledger: self,
                name: name.clone(),
                slot,
                state,
            };
        }
    }

    /// Record a vote for the submission's type and return the updated tally.
    pub async fn record(&self, submission: &Submission) -> Result<TallySnapshot, InvariantViolation> {
        let mut guard = self.lock(&submission.name).await;
        guard.record(submission.tree_type.clone(), submission.measurements)
    }

    /// Remove the tally for `name`, returning its final state.
    pub async fn clear(&self, name: &TreeName) -> Result<TallySnapshot, InvariantViolation> {
        self.lock(name).await.clear()
    }

    /// Current state of the tally for `name`, if one is open.
    pub async fn snapshot(&self, name: &TreeName) -> Option<TallySnapshot> {
        self.lock(name).await.snapshot()
    }

    /// Number of open tallies.
    pub fn open_tallies(&self) -> usize {
        self.open.load(Ordering::Relaxed)
    }

    /// Number of names in the ledger.
    ///
    /// Unlike [`Self::open_tallies`], this includes names which are locked
    /// but hold no tally yet.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn next_tally_id(&self) -> TallyId {
        TallyId::new(self.next_tally_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Exclusive access to the tally of a single name.
///
/// Dropping the guard releases the lock. If no vote was recorded while it
/// was held and no tally existed, the name is removed from the ledger.
pub struct LedgerGuard<'a> {
    ledger: &'a VoteLedger,
    name: TreeName,
    slot: SharedSlot,
    state: OwnedMutexGuard<Slot>,
}

impl LedgerGuard<'_> {
    pub fn name(&self) -> &TreeName {
        &self.name
    }

    pub fn snapshot(&self) -> Option<TallySnapshot> {
        self.state
            .tally
            .as_ref()
            .map(|tally| snapshot(&self.name, tally))
    }

    /// Add one vote for `tree_type`, opening a tally if none exists, and make
    /// `measurements` the representative values of the tally.
    pub fn record(
        &mut self,
        tree_type: TreeType,
        measurements: Measurements,
    ) -> Result<TallySnapshot, InvariantViolation> {
        let ledger = self.ledger;
        let name = &self.name;

        let tally = self.state.tally.get_or_insert_with(|| {
            let id = ledger.next_tally_id();
            ledger.open.fetch_add(1, Ordering::Relaxed);
            debug!(%name, tally_id = %id, "Opening tally");

            Tally {
                id,
                count: VoteCount::new(),
                representative: measurements,
            }
        });

        let votes = tally.count.add(tree_type.clone());
        tally.representative = measurements;
        let total = tally.count.total();

        let counted = tally.count.counted();
        if counted != total {
            return Err(InvariantViolation::CountMismatch {
                name: name.clone(),
                counted,
                total,
            });
        }

        debug!(%name, %tree_type, votes, total, "Recorded vote");

        Ok(snapshot(name, tally))
    }

    /// Remove the tally for this name from the ledger, returning its final state.
    ///
    /// The next vote for the name opens a fresh tally.
    pub fn clear(mut self) -> Result<TallySnapshot, InvariantViolation> {
        let Some(tally) = self.state.tally.take() else {
            return Err(InvariantViolation::NothingToClear(self.name.clone()));
        };

        self.ledger.open.fetch_sub(1, Ordering::Relaxed);
        self.retire();

        debug!(name = %self.name, tally_id = %tally.id, "Cleared tally");

        Ok(snapshot(&self.name, &tally))
    }

    fn retire(&mut self) {
        self.state.retired = true;

        let slot = &self.slot;
        self.ledger
            .slots
            .remove_if(&self.name, |_, current| Arc::ptr_eq(current, slot));
    }
}

impl Drop for LedgerGuard<'_> {
    fn drop(&mut self) {
        if self.state.tally.is_none() && !self.state.retired {
            self.retire();
        }
    }
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot(name: &TreeName, tally: &Tally) -> TallySnapshot {
    TallySnapshot {
        tally_id: tally.id,
        name: name.clone(),
        total_votes: tally.count.total(),
        votes: tally.count.types().to_vec(),
        representative: tally.representative,
    }
}
