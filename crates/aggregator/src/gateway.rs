use std::time::Duration;

use tracing::warn;

use canopy_core_types::{ResolvedSubmission, TreeType};
use canopy_store::{Inserted, RequestId, StoreError, TreeRequest, TreeStore};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to store the tree request: {0}")]
    Store(#[from] StoreError),

    #[error("storing the tree request timed out after {0:?}")]
    Timeout(Duration),
}

/// Proof that a resolved submission is durably stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub request_id: RequestId,

    /// Type held by the stored request
    pub tree_type: TreeType,

    /// The same tally had already been committed by an earlier attempt
    pub duplicate: bool,
}

/// Writes resolved submissions to the store, within a bounded time.
pub struct CommitGateway<S> {
    store: S,
    timeout: Duration,
}

impl<S> CommitGateway<S>
where
    S: TreeStore,
{
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Insert the resolved submission as a single atomic write.
    ///
    /// A tally committed twice, eg. when a write succeeded but its
    /// acknowledgement timed out, is stored only once. The receipt then
    /// describes the request stored by the first write.
    pub async fn commit(
        &self,
        resolved: &ResolvedSubmission,
    ) -> Result<CommitReceipt, PersistenceError> {
        let request = TreeRequest::from(resolved);

        let inserted = tokio::time::timeout(self.timeout, self.store.insert_tree_request(&request))
            .await
            .map_err(|_| PersistenceError::Timeout(self.timeout))??;

        let receipt = match inserted {
            Inserted::New(request_id) => CommitReceipt {
                request_id,
                tree_type: request.tree_type,
                duplicate: false,
            },
            Inserted::Existing {
                id: request_id,
                stored,
            } => {
                warn!(
                    name = %resolved.name,
                    tally_id = %resolved.tally_id,
                    request_id,
                    stored_type = %stored.tree_type,
                    offered_type = %resolved.tree_type,
                    "Tally was already committed, keeping the stored request"
                );

                CommitReceipt {
                    request_id,
                    tree_type: stored.tree_type,
                    duplicate: true,
                }
            }
        };

        Ok(receipt)
    }
}
