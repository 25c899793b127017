use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Inserted, RequestId, StoreError, TreeRequest, TreeStore};

#[derive(Debug, Default)]
struct Rows {
    requests: Vec<(RequestId, TreeRequest)>,
    keys: HashMap<String, RequestId>,
}

/// Keeps tree requests in memory, for tests and throwaway deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.requests.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn insert_tree_request(&self, request: &TreeRequest) -> Result<Inserted, StoreError> {
        let mut rows = self.rows.lock().await;

        let key = request.key();
        if let Some(id) = rows.keys.get(&key).copied() {
            let stored = rows
                .requests
                .iter()
                .find(|(row, _)| *row == id)
                .map(|(_, stored)| stored.clone())
                .ok_or(StoreError::MissingRequest(id))?;

            return Ok(Inserted::Existing { id, stored });
        }

        let id = rows.requests.last().map_or(1, |(id, _)| id + 1);
        rows.requests.push((id, request.clone()));
        rows.keys.insert(key, id);

        Ok(Inserted::New(id))
    }

    async fn list(&self) -> Result<Vec<(RequestId, TreeRequest)>, StoreError> {
        Ok(self.rows.lock().await.requests.clone())
    }
}
