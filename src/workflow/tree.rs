//! Mutable authoring tree.
//!
//! Every mutation locates its target through one traversal ([`visit`]) that
//! walks `children` and, for condition nodes, both branch lists. All
//! checks run before the tree is touched, so a rejected call leaves the
//! tree exactly as it was.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    CareflowError, Result,
    workflow::node::{Branch, Node, NodeFields, NodeId, NodeKind},
};

/// Result of a mutation whose target id may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    Applied,
    NotFound,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        *self == Outcome::Applied
    }
}

/// A workflow tree: an ordered list of roots, the first trigger among them binding the workflow.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Tree {
    roots: Vec<Node>,
}

/// Pre-order search for `id`; on a hit, `op` receives the list holding the node and its index.
fn visit<F, R>(
    nodes: &mut Vec<Node>,
    id: &str,
    op: &mut Option<F>,
) -> Option<R>
where
    F: FnOnce(&mut Vec<Node>, usize) -> R,
{
    for idx in 0..nodes.len() {
        if nodes[idx].id == id {
            return op.take().map(|f| f(nodes, idx));
        }
        for list in nodes[idx].child_lists_mut() {
            if let Some(r) = visit(list, id, op) {
                return Some(r);
            }
        }
    }
    None
}

fn find_in<'a>(
    nodes: &'a [Node],
    id: &str,
) -> Option<&'a Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        for list in node.child_lists() {
            if let Some(found) = find_in(list, id) {
                return Some(found);
            }
        }
    }
    None
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from roots, rejecting anything that breaks the tree invariants.
    pub fn from_roots(roots: Vec<Node>) -> Result<Self> {
        let tree = Self {
            roots,
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<Node> {
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes, branches included.
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.roots.iter().flat_map(|r| r.subtree_ids()).collect()
    }

    /// The root trigger, if the workflow has been configured.
    pub fn trigger(&self) -> Option<&Node> {
        self.roots.iter().find(|n| n.kind() == NodeKind::Trigger)
    }

    /// Depth-first search across `children`, then `truePath`, then `falsePath`.
    pub fn find(
        &self,
        id: &str,
    ) -> Option<&Node> {
        find_in(&self.roots, id)
    }

    pub fn contains(
        &self,
        id: &str,
    ) -> bool {
        self.find(id).is_some()
    }

    /// Adds a new root. The first root of a tree must be a trigger, and there is only ever one.
    pub fn insert_root(
        &mut self,
        node: Node,
    ) -> Result<()> {
        if node.kind() == NodeKind::Trigger {
            if self.trigger().is_some() {
                return Err(CareflowError::Structural("workflow already has a trigger".into()));
            }
        } else if self.trigger().is_none() {
            return Err(CareflowError::Structural("the first root of a workflow must be a trigger".into()));
        }
        self.check_insertable(&node, true)?;

        self.roots.push(node);
        Ok(())
    }

    /// Appends `node` as the last child of `parent_id`. Condition nodes only accept branch inserts.
    pub fn append_child(
        &mut self,
        parent_id: &str,
        node: Node,
    ) -> Result<Outcome> {
        let Some(parent) = self.find(parent_id) else {
            return Ok(Outcome::NotFound);
        };
        if parent.kind() == NodeKind::Condition {
            return Err(CareflowError::Structural(format!("condition {} takes new nodes on a branch, not as children", parent_id)));
        }
        self.check_insertable(&node, false)?;

        self.apply(parent_id, move |list, idx| list[idx].children.push(node));
        Ok(Outcome::Applied)
    }

    /// Appends `node` to the given branch of condition `condition_id`.
    pub fn append_to_branch(
        &mut self,
        condition_id: &str,
        branch: Branch,
        node: Node,
    ) -> Result<Outcome> {
        let Some(parent) = self.find(condition_id) else {
            return Ok(Outcome::NotFound);
        };
        if parent.kind() != NodeKind::Condition {
            return Err(CareflowError::Structural(format!("node {} is a {}, only conditions have branches", condition_id, parent.kind().as_ref())));
        }
        self.check_insertable(&node, false)?;

        self.apply(condition_id, move |list, idx| {
            if let Some(branches) = list[idx].branches_mut() {
                branches.path_mut(branch).push(node);
            }
        });
        Ok(Outcome::Applied)
    }

    /// Removes the node and its whole subtree. The trigger cannot be removed.
    pub fn remove(
        &mut self,
        id: &str,
    ) -> Result<Outcome> {
        let Some(node) = self.find(id) else {
            return Ok(Outcome::NotFound);
        };
        if node.kind() == NodeKind::Trigger {
            return Err(CareflowError::Structural("the trigger cannot be removed, only reconfigured".into()));
        }

        self.apply(id, |list, idx| {
            list.remove(idx);
        });
        Ok(Outcome::Applied)
    }

    /// Applies `mutator` to the title, description and config of one node.
    pub fn update_field<F>(
        &mut self,
        id: &str,
        mutator: F,
    ) -> Outcome
    where
        F: FnOnce(&mut NodeFields<'_>),
    {
        match self.apply(id, move |list, idx| mutator(&mut list[idx].fields_mut())) {
            Some(()) => Outcome::Applied,
            None => Outcome::NotFound,
        }
    }

    fn apply<F, R>(
        &mut self,
        id: &str,
        op: F,
    ) -> Option<R>
    where
        F: FnOnce(&mut Vec<Node>, usize) -> R,
    {
        visit(&mut self.roots, id, &mut Some(op))
    }

    /// A new subtree may not reuse an id already in the tree, nor hide a trigger below its root.
    fn check_insertable(
        &self,
        node: &Node,
        as_root: bool,
    ) -> Result<()> {
        let mut seen: HashSet<NodeId> = self.ids().into_iter().collect();
        let mut error: Option<CareflowError> = None;
        node.walk(&mut |n| {
            if error.is_some() {
                return;
            }
            if !seen.insert(n.id.clone()) {
                error = Some(CareflowError::Structural(format!("duplicate node id {}", n.id)));
            } else if n.kind() == NodeKind::Trigger && !(as_root && std::ptr::eq(n, node)) {
                error = Some(CareflowError::Structural("a trigger may only appear as the workflow root".into()));
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Checks the tree invariants: one root trigger leading the roots (unless empty), triggers only at the root, unique ids.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.roots.first() else {
            return Ok(());
        };
        if first.kind() != NodeKind::Trigger {
            return Err(CareflowError::Structural("the first root of a workflow must be a trigger".into()));
        }
        let triggers = self.roots.iter().filter(|n| n.kind() == NodeKind::Trigger).count();
        if triggers != 1 {
            return Err(CareflowError::Structural(format!("expected exactly one root trigger, found {}", triggers)));
        }

        let mut seen = HashSet::new();
        for root in &self.roots {
            for list in root.child_lists() {
                for child in list {
                    let mut nested_trigger = false;
                    child.walk(&mut |n| nested_trigger |= n.kind() == NodeKind::Trigger);
                    if nested_trigger {
                        return Err(CareflowError::Structural("a trigger may only appear as the workflow root".into()));
                    }
                }
            }
            for id in root.subtree_ids() {
                if !seen.insert(id.clone()) {
                    return Err(CareflowError::Structural(format!("duplicate node id {}", id)));
                }
            }
        }
        Ok(())
    }
}
