use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::db;
use crate::{Inserted, RequestId, StoreError, TreeRequest, TreeStore};

/// Requests, serialized as JSON, keyed by request id.
const REQUESTS: TableDefinition<u64, &[u8]> = TableDefinition::new("tree_requests");

/// Request id, keyed by [`TreeRequest::key`].
const KEYS: TableDefinition<&str, u64> = TableDefinition::new("tree_request_keys");

/// Tree requests stored in a single redb database file.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open the database at `path`, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
        }

        let database = Database::create(path).map_err(db)?;

        // Make sure both tables exist, so that read transactions can open them
        let tx = database.begin_write().map_err(db)?;
        {
            tx.open_table(REQUESTS).map_err(db)?;
            tx.open_table(KEYS).map_err(db)?;
        }
        tx.commit().map_err(db)?;

        debug!(path = %path.display(), "Opened tree request store");

        Ok(Self {
            db: Arc::new(database),
        })
    }

    fn insert_blocking(database: &Database, request: &TreeRequest) -> Result<Inserted, StoreError> {
        let key = request.key();
        let bytes = serde_json::to_vec(request)?;

        let tx = database.begin_write().map_err(db)?;

        let inserted = {
            let mut keys = tx.open_table(KEYS).map_err(db)?;
            let existing = keys.get(key.as_str()).map_err(db)?.map(|id| id.value());

            match existing {
                Some(id) => {
                    let requests = tx.open_table(REQUESTS).map_err(db)?;
                    let stored = match requests.get(id).map_err(db)? {
                        Some(row) => serde_json::from_slice(row.value())?,
                        None => return Err(StoreError::MissingRequest(id)),
                    };

                    Inserted::Existing { id, stored }
                }
                None => {
                    let mut requests = tx.open_table(REQUESTS).map_err(db)?;
                    let id = requests
                        .last()
                        .map_err(db)?
                        .map_or(1, |(id, _)| id.value() + 1);

                    requests.insert(id, bytes.as_slice()).map_err(db)?;
                    keys.insert(key.as_str(), id).map_err(db)?;

                    Inserted::New(id)
                }
            }
        };

        tx.commit().map_err(db)?;

        Ok(inserted)
    }

    fn list_blocking(database: &Database) -> Result<Vec<(RequestId, TreeRequest)>, StoreError> {
        let tx = database.begin_read().map_err(db)?;
        let table = tx.open_table(REQUESTS).map_err(db)?;

        let mut requests = Vec::new();
        for entry in table.iter().map_err(db)? {
            let (id, bytes) = entry.map_err(db)?;
            let request = serde_json::from_slice(bytes.value())?;
            requests.push((id.value(), request));
        }

        Ok(requests)
    }
}

#[async_trait]
impl TreeStore for RedbStore {
    async fn insert_tree_request(&self, request: &TreeRequest) -> Result<Inserted, StoreError> {
        let database = Arc::clone(&self.db);
        let request = request.clone();

        tokio::task::spawn_blocking(move || Self::insert_blocking(&database, &request)).await?
    }

    async fn list(&self) -> Result<Vec<(RequestId, TreeRequest)>, StoreError> {
        let database = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || Self::list_blocking(&database)).await?
    }
}
