//! Core types shared by every stage of the tree submission pipeline.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod submission;
pub use submission::{Measurements, ResolvedSubmission, Submission, TallyId, TreeName, TreeType};

pub mod validate;
pub use validate::{validate, Field, RawSubmission, ValidationError};

/// Number of votes, either for a single type or in total.
pub type Votes = u64;

/// Minimum number of votes for a name before its type is resolved,
/// unless configured otherwise.
pub const DEFAULT_QUORUM: Votes = 3;
