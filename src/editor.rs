//! Single-author editing session.
//!
//! The editor owns the working copy of one document and the selected-node
//! cursor. Nothing here is shared or global; each session is its own value.

use tracing::debug;

use crate::{
    Result,
    registry::{Audience, Registry, TriggerType, WorkflowDocument},
    workflow::{Branch, Compilation, Node, NodeFields, NodeId, Outcome, Tree, compiler, template},
};

pub struct Editor {
    document: WorkflowDocument,
    selected: Option<NodeId>,
}

impl Editor {
    pub fn new(document: WorkflowDocument) -> Self {
        Self {
            document,
            selected: None,
        }
    }

    /// Opens the document for the key, seeded from the template if none is stored.
    pub async fn open(
        registry: &Registry,
        trigger_type: &TriggerType,
        audience: Audience,
    ) -> Result<Self> {
        let document = registry.resolve(trigger_type, audience).await?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &WorkflowDocument {
        &self.document
    }

    pub fn tree(&self) -> &Tree {
        &self.document.tree
    }

    pub fn rename(
        &mut self,
        name: impl Into<String>,
    ) {
        self.document.name = name.into();
    }

    pub fn set_audience(
        &mut self,
        audience: Audience,
    ) {
        self.document.audience = audience;
    }

    pub fn select(
        &mut self,
        id: &str,
    ) -> Outcome {
        if self.document.tree.contains(id) {
            self.selected = Some(id.to_string());
            Outcome::Applied
        } else {
            Outcome::NotFound
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected.as_deref().and_then(|id| self.document.tree.find(id))
    }

    pub fn append_child(
        &mut self,
        parent_id: &str,
        node: Node,
    ) -> Result<Outcome> {
        self.document.tree.append_child(parent_id, node)
    }

    pub fn append_to_branch(
        &mut self,
        condition_id: &str,
        branch: Branch,
        node: Node,
    ) -> Result<Outcome> {
        self.document.tree.append_to_branch(condition_id, branch, node)
    }

    /// Appends under the selected node; `NotFound` when nothing is selected.
    pub fn append_to_selected(
        &mut self,
        node: Node,
    ) -> Result<Outcome> {
        match self.selected.clone() {
            Some(id) => self.append_child(&id, node),
            None => Ok(Outcome::NotFound),
        }
    }

    /// Removes a node with its subtree and drops the selection if it went with it.
    pub fn remove(
        &mut self,
        id: &str,
    ) -> Result<Outcome> {
        let outcome = self.document.tree.remove(id)?;
        self.prune_selection();
        Ok(outcome)
    }

    pub fn update_field<F>(
        &mut self,
        id: &str,
        mutator: F,
    ) -> Outcome
    where
        F: FnOnce(&mut NodeFields<'_>),
    {
        self.document.tree.update_field(id, mutator)
    }

    /// Replaces the tree with a fresh copy of the default template.
    pub fn reset_to_default(&mut self) {
        self.document.tree = template::default_tree();
        self.selected = None;
    }

    /// Compiles the working tree without saving it.
    pub fn preview(&self) -> Result<Compilation> {
        compiler::compile_with_report(&self.document.tree)
    }

    /// Saves through the registry. The working copy is replaced only when the save succeeds.
    pub async fn save(
        &mut self,
        registry: &Registry,
    ) -> Result<&WorkflowDocument> {
        let saved = registry.save(&self.document).await?;
        debug!("editor::save({:?})", saved.id);
        self.document = saved;
        self.prune_selection();
        Ok(&self.document)
    }

    fn prune_selection(&mut self) {
        if self.selected.as_deref().is_some_and(|id| !self.document.tree.contains(id)) {
            self.selected = None;
        }
    }
}
