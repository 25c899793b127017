use std::path::Path;
use std::sync::Arc;

use canopy_aggregator::{Aggregator, CommitGateway, Metrics};
use canopy_config::{Config, StorageBackend};
use canopy_core_votekeeper::ConsensusResolver;
use canopy_metrics::SharedRegistry;
use canopy_store::{MemoryStore, RedbStore, StoreError, TreeStore};

pub type SharedAggregator = Arc<Aggregator<Arc<dyn TreeStore>>>;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    aggregator: SharedAggregator,
    registry: SharedRegistry,
}

impl AppState {
    pub fn new(aggregator: SharedAggregator, registry: SharedRegistry) -> Self {
        Self {
            aggregator,
            registry,
        }
    }

    /// Open the configured store and build the aggregator on top of it,
    /// registering its metrics in `registry`.
    ///
    /// A relative storage path is resolved against `home_dir`.
    pub fn from_config(
        config: &Config,
        home_dir: &Path,
        registry: SharedRegistry,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn TreeStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Redb => Arc::new(RedbStore::open(home_dir.join(&config.storage.path))?),
        };

        let aggregator = Aggregator::new(
            ConsensusResolver::new(config.aggregator.quorum),
            CommitGateway::new(store, config.aggregator.commit_timeout),
            Metrics::register(&registry),
        );

        Ok(Self::new(Arc::new(aggregator), registry))
    }

    pub fn aggregator(&self) -> &SharedAggregator {
        &self.aggregator
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}
