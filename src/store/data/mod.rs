mod workflow;

pub use workflow::Workflow;
