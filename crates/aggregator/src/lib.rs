//! Aggregates anonymous submissions describing the same named tree into a
//! single tree request.
//!
//! Each submission goes through four stages: it is validated, recorded as a
//! vote in the ledger, the tally is evaluated against the quorum and, once
//! resolved, the winning type is committed to the store and the tally cleared.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod aggregator;
pub use aggregator::{Aggregator, Outcome, SubmitError};

mod gateway;
pub use gateway::{CommitGateway, CommitReceipt, PersistenceError};

mod metrics;
pub use metrics::Metrics;
