//! Storage of tree requests: the submissions which reached consensus and
//! await review before joining the tree inventory.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use canopy_core_types::{ResolvedSubmission, TallyId, TreeName, TreeType};

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

mod disk;
pub use disk::RedbStore;

/// Row identifier assigned by the store.
pub type RequestId = u64;

/// A tree request, as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeRequest {
    /// Deduplication key, together with the name
    pub tally_id: TallyId,
    pub name: TreeName,
    pub tree_type: TreeType,
    pub height: f64,
    pub age: u32,
    pub latitude: f64,
    pub longitude: f64,
}

impl TreeRequest {
    /// Key under which a request is deduplicated.
    pub fn key(&self) -> String {
        format!("{}/{}", self.tally_id.as_u64(), self.name)
    }
}

impl From<&ResolvedSubmission> for TreeRequest {
    fn from(resolved: &ResolvedSubmission) -> Self {
        Self {
            tally_id: resolved.tally_id,
            name: resolved.name.clone(),
            tree_type: resolved.tree_type.clone(),
            height: resolved.measurements.height,
            age: resolved.measurements.age,
            latitude: resolved.measurements.latitude,
            longitude: resolved.measurements.longitude,
        }
    }
}

/// Result of a successful insert.
#[derive(Clone, Debug, PartialEq)]
pub enum Inserted {
    /// The request was stored under a new id
    New(RequestId),

    /// A request with the same key was already stored under that id,
    /// nothing was written. `stored` is the request as first written,
    /// which may differ from the one just offered.
    Existing { id: RequestId, stored: TreeRequest },
}

impl Inserted {
    pub fn id(&self) -> RequestId {
        match self {
            Self::New(id) | Self::Existing { id, .. } => *id,
        }
    }
}

/// Durable store for tree requests.
///
/// Every insert is atomic: it either fully happens or leaves the store untouched.
#[async_trait]
pub trait TreeStore: Send + Sync + 'static {
    async fn insert_tree_request(&self, request: &TreeRequest) -> Result<Inserted, StoreError>;

    /// All stored requests, in insertion order.
    async fn list(&self) -> Result<Vec<(RequestId, TreeRequest)>, StoreError>;
}

#[async_trait]
impl<S> TreeStore for Arc<S>
where
    S: TreeStore + ?Sized,
{
    async fn insert_tree_request(&self, request: &TreeRequest) -> Result<Inserted, StoreError> {
        (**self).insert_tree_request(request).await
    }

    async fn list(&self) -> Result<Vec<(RequestId, TreeRequest)>, StoreError> {
        (**self).list().await
    }
}
