use std::sync::Arc;

use geotrack_application::ProcessorState;
use geotrack_domain::ports::KeyValueStore;
use geotrack_domain::StoreConfig;
use geotrack_infrastructure::{
    AppConfig, KvActivityCounters, KvAnomalyLog, KvLocationStateStore, MemoryKeyValueStore,
    RetryPolicy,
};

pub struct AppContext {
    pub config: AppConfig,
    pub store_config: StoreConfig,
    pub store: MemoryKeyValueStore,
    pub state: ProcessorState,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let runtime_config = config.to_runtime_config();
        let store_config = config.to_store_config();
        let retry = RetryPolicy::from_config(&store_config);

        let store = MemoryKeyValueStore::new();
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());

        let state = ProcessorState::new(
            runtime_config,
            Arc::new(KvLocationStateStore::new(shared.clone(), retry)),
            Arc::new(KvActivityCounters::new(shared.clone(), retry)),
            Arc::new(KvAnomalyLog::new(shared, retry)),
        );

        Self {
            config,
            store_config,
            store,
            state,
        }
    }
}
