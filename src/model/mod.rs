mod workflow;

pub use workflow::{WorkflowModel, WorkflowPayload};
