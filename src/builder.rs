use std::sync::Arc;

use crate::{
    CareflowError, Config, Registry, Result, StoreType,
    store::{HttpStore, MemStore, WorkflowCollection},
};

#[derive(Default)]
pub struct RegistryBuilder {
    config: Config,
    store: Option<Arc<dyn WorkflowCollection>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Uses `store` instead of the one described by the config.
    pub fn store(
        mut self,
        store: Arc<dyn WorkflowCollection>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(&self) -> Result<Registry> {
        let store: Arc<dyn WorkflowCollection> = match &self.store {
            Some(store) => store.clone(),
            None => match self.config.store.store_type {
                StoreType::Mem => Arc::new(MemStore::new()),
                StoreType::Http => {
                    let http = self.config.store.http.as_ref().ok_or_else(|| CareflowError::Config("store.http is required when store type is http".into()))?;
                    Arc::new(HttpStore::new(http)?)
                }
            },
        };

        Ok(Registry::new(store))
    }
}
