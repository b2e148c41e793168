//! # Careflow
//!
//! Careflow is the authoring core for patient-communication workflows: a
//! clinician builds a branching sequence of timed messages ("on booking, send
//! a confirmation, wait 24h, send a reminder") and Careflow compiles it into
//! the linear step list an execution engine runs.
//!
//! ## Core Features
//!
//! - **Typed Node Model**: triggers, actions, delays and reply conditions as one tagged type
//! - **Tree Store**: find, append, remove and update over children and condition branches
//! - **Compiler**: deterministic flattening with all delays normalized to minutes
//! - **Registry**: one document per `(trigger type, audience)`, created on first save
//! - **Pluggable Storage**: in-memory (testing) or the remote workflow api over HTTP
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use careflow::{Audience, Editor, RegistryBuilder, TriggerType};
//!
//! let registry = RegistryBuilder::new().build()?;
//! let mut editor = Editor::open(&registry, &TriggerType::AppointmentCreated, Audience::New).await?;
//! let preview = editor.preview()?;
//! editor.save(&registry).await?;
//! ```

mod builder;
mod config;
mod editor;
mod error;
pub mod model;
mod registry;
pub mod store;
mod utils;
pub mod workflow;

pub use builder::RegistryBuilder;
pub use config::{Config, HttpConfig, StoreConfig, StoreType};
pub use editor::Editor;
pub use error::CareflowError;
pub use registry::{Audience, Registry, TriggerType, WorkflowDocument};
pub use workflow::{Branch, Channel, CompiledStep, Node, NodeKind, Outcome, StepType, Tree, compile};

/// Result type alias for Careflow operations.
pub type Result<T> = std::result::Result<T, CareflowError>;
