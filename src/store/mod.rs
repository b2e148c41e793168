//! Persistence collaborators for workflow documents.
//!
//! Provides an abstraction over the workflow api:
//! - `MemStore`: in-process storage for tests and local authoring
//! - `HttpStore`: the remote `workflows` REST resource

pub mod data;
mod db;

use async_trait::async_trait;

use crate::{
    Result,
    model::{WorkflowModel, WorkflowPayload},
};

pub use db::{HttpStore, MemStore};

/// Operations the registry needs from a persistence collaborator.
#[async_trait]
pub trait WorkflowCollection: Send + Sync {
    /// Returns every stored workflow document.
    async fn list(&self) -> Result<Vec<WorkflowModel>>;

    /// Creates a document and returns it with its assigned id.
    async fn create(
        &self,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel>;

    /// Replaces the document `id`.
    async fn update(
        &self,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowModel>;
}
