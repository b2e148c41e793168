use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::{
    CareflowError, Result,
    model::{WorkflowModel, WorkflowPayload},
    store::{WorkflowCollection, data::Workflow},
    utils,
};

/// In-memory workflow collection. Records keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    workflows: Arc<RwLock<Vec<Workflow>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowCollection for MemStore {
    async fn list(&self) -> Result<Vec<WorkflowModel>> {
        trace!("mem::list()");
        let workflows = self.workflows.read().await;
        workflows.iter().map(|w| w.to_model()).collect()
    }

    async fn create(
        &self,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel> {
        let record = Workflow::new(utils::uuid(), payload, utils::time::time_millis())?;
        trace!("mem::create({})", record.id);
        let model = record.to_model()?;

        self.workflows.write().await.push(record);
        Ok(model)
    }

    async fn update(
        &self,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel> {
        trace!("mem::update({})", id);
        let mut workflows = self.workflows.write().await;
        let record = workflows.iter_mut().find(|w| w.id == id).ok_or_else(|| CareflowError::Persistence(format!("workflow {} not found", id)))?;

        record.apply(payload, utils::time::time_millis())?;
        record.to_model()
    }
}
