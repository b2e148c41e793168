//! Flattens an authoring tree into the linear step list consumed by the
//! execution engine.
//!
//! The executor has no branching primitive, so a condition contributes only
//! its `truePath`. Everything on the `falsePath` is dropped from the step
//! list and reported in [`Compilation::discarded`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    CareflowError, Result,
    workflow::{
        duration,
        node::{Channel, Node, NodeBody, NodeId},
        tree::Tree,
    },
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    Action,
    Delay,
}

/// One executable entry of a compiled workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompiledStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// 0-based position in the step list
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_minutes: Option<u64>,
}

impl CompiledStep {
    pub fn action(
        order: usize,
        channel: Channel,
        message: &str,
    ) -> Self {
        Self {
            step_type: StepType::Action,
            order,
            channel: Some(channel),
            message: Some(message.to_string()),
            delay_minutes: None,
        }
    }

    pub fn delay(
        order: usize,
        minutes: u64,
    ) -> Self {
        Self {
            step_type: StepType::Delay,
            order,
            channel: None,
            message: None,
            delay_minutes: Some(minutes),
        }
    }
}

/// Compiler output: the step list plus the authored nodes it could not represent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compilation {
    pub steps: Vec<CompiledStep>,
    /// ids of every node that sat on a condition's `falsePath`
    pub discarded: Vec<NodeId>,
}

#[derive(Default)]
struct Flattener {
    steps: Vec<CompiledStep>,
    discarded: Vec<NodeId>,
}

impl Flattener {
    /// Pre-order emit. A condition's `truePath` is flattened before its own `children`,
    /// unlike [`Tree::find`], which searches `children` first.
    fn visit(
        &mut self,
        node: &Node,
    ) -> Result<()> {
        let order = self.steps.len();
        match &node.body {
            NodeBody::Trigger => {}
            NodeBody::Action {
                channel,
                config,
            } => self.steps.push(CompiledStep::action(order, *channel, &config.message)),
            NodeBody::Delay {
                config,
            } => {
                let minutes = duration::parse_minutes(&config.duration).map_err(|e| CareflowError::compile(&node.id, e))?;
                self.steps.push(CompiledStep::delay(order, minutes));
            }
            NodeBody::Condition {
                branches,
            } => {
                for child in &branches.true_path {
                    self.visit(child)?;
                }
                for child in &branches.false_path {
                    self.discarded.extend(child.subtree_ids());
                }
            }
        }

        for child in &node.children {
            self.visit(child)?;
        }
        Ok(())
    }
}

/// Compiles a tree and reports what the branch policy dropped.
pub fn compile_with_report(tree: &Tree) -> Result<Compilation> {
    let mut flattener = Flattener::default();
    for root in tree.roots() {
        flattener.visit(root)?;
    }

    debug!("compiler::compile(nodes: {}, steps: {})", tree.len(), flattener.steps.len());
    if !flattener.discarded.is_empty() {
        warn!("compiler::compile: {} node(s) on a false path are not part of the step list: {:?}", flattener.discarded.len(), flattener.discarded);
    }

    Ok(Compilation {
        steps: flattener.steps,
        discarded: flattener.discarded,
    })
}

/// Compiles a tree into its ordered step list.
pub fn compile(tree: &Tree) -> Result<Vec<CompiledStep>> {
    compile_with_report(tree).map(|c| c.steps)
}
