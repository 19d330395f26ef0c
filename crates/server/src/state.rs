use std::sync::Arc;
use docshift_core::{
    ArtifactStore, BatchOrchestrator, Config, FileConverter, StrategyRegistry,
};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<ArtifactStore>,
    converter: Arc<FileConverter>,
    orchestrator: BatchOrchestrator<FileConverter>,
}

impl AppState {
    /// Wires the store, the converter and the worker pool from `config`.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(ArtifactStore::new(config.store.clone()));
        let converter = Arc::new(FileConverter::new(
            Arc::new(StrategyRegistry::with_defaults()),
            Arc::clone(&store),
            config.converter.clone(),
        ));
        let orchestrator = BatchOrchestrator::with_shared_converter(
            config.batch.clone(),
            Arc::clone(&converter),
            Arc::clone(&store),
        );

        Self {
            config,
            store,
            converter,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &StrategyRegistry {
        self.converter.registry()
    }

    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub fn converter(&self) -> &FileConverter {
        self.converter.as_ref()
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator<FileConverter> {
        &self.orchestrator
    }
}
