//! Tally votes cast by anonymous submitters for the type of a named tree,
//! and decide which type wins once enough votes have been cast.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

pub mod count;
pub mod ledger;
pub mod resolver;

pub use count::{TypeVotes, VoteCount};
pub use ledger::{InvariantViolation, LedgerGuard, TallySnapshot, VoteLedger};
pub use resolver::{ConsensusResolver, Decision};
