//! Authoring model: nodes, the editable tree, the compiler and the default template.

pub mod compiler;
pub mod duration;
pub mod node;
pub mod template;
pub mod tree;

pub use compiler::{Compilation, CompiledStep, StepType, compile, compile_with_report};
pub use node::{ActionConfig, Branch, Branches, Channel, ConfigMut, DelayConfig, Node, NodeBody, NodeFields, NodeId, NodeKind};
pub use tree::{Outcome, Tree};
