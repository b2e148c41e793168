//! Workflow node definitions.
//!
//! A node is one authored step. Its kind-dependent payload lives in
//! [`NodeBody`], so only a condition node can ever carry branches.

use serde::{Deserialize, Serialize};

use crate::utils;

/// node id
pub type NodeId = String;

/// Kind of a workflow node. Fixed at creation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Action,
    Delay,
    Condition,
}

/// Delivery channel of an action node.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    #[serde(rename = "whatsapp")]
    #[strum(serialize = "whatsapp")]
    WhatsApp,
}

/// Which path of a condition node. `True` means the recipient replied.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Branch {
    True,
    False,
}

impl From<bool> for Branch {
    fn from(value: bool) -> Self {
        if value { Branch::True } else { Branch::False }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionConfig {
    /// message text, may contain `{Placeholder}` tokens
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayConfig {
    /// duration token such as `24h` or `30m`
    #[serde(default)]
    pub duration: String,
}

/// The two ordered paths of a condition node.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branches {
    #[serde(default)]
    pub true_path: Vec<Node>,
    #[serde(default)]
    pub false_path: Vec<Node>,
}

impl Branches {
    pub fn path(
        &self,
        branch: Branch,
    ) -> &Vec<Node> {
        match branch {
            Branch::True => &self.true_path,
            Branch::False => &self.false_path,
        }
    }

    pub fn path_mut(
        &mut self,
        branch: Branch,
    ) -> &mut Vec<Node> {
        match branch {
            Branch::True => &mut self.true_path,
            Branch::False => &mut self.false_path,
        }
    }
}

/// Kind-dependent payload of a node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeBody {
    Trigger,
    Action {
        #[serde(rename = "actionChannel")]
        channel: Channel,
        #[serde(default)]
        config: ActionConfig,
    },
    Delay {
        #[serde(default)]
        config: DelayConfig,
    },
    Condition {
        #[serde(default)]
        branches: Branches,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    /// node id
    pub id: NodeId,
    /// node title
    #[serde(default)]
    pub title: String,
    /// node description
    #[serde(default)]
    pub description: String,
    /// kind and payload
    #[serde(flatten)]
    pub body: NodeBody,
    /// linear continuation
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Mutable view of a node's config, handed to tree update mutators.
#[derive(Debug)]
pub enum ConfigMut<'a> {
    Trigger,
    Action(&'a mut ActionConfig),
    Delay(&'a mut DelayConfig),
    Condition,
}

/// The editable fields of a node. Kind, id and child lists are not reachable from here.
#[derive(Debug)]
pub struct NodeFields<'a> {
    pub title: &'a mut String,
    pub description: &'a mut String,
    pub config: ConfigMut<'a>,
}

impl NodeFields<'_> {
    /// Sets the message of an action node. Returns false for other kinds.
    pub fn set_message(
        &mut self,
        message: impl Into<String>,
    ) -> bool {
        match &mut self.config {
            ConfigMut::Action(config) => {
                config.message = message.into();
                true
            }
            _ => false,
        }
    }

    /// Sets the duration token of a delay node. Returns false for other kinds.
    pub fn set_duration(
        &mut self,
        duration: impl Into<String>,
    ) -> bool {
        match &mut self.config {
            ConfigMut::Delay(config) => {
                config.duration = duration.into();
                true
            }
            _ => false,
        }
    }
}

impl Node {
    fn with_body(
        title: &str,
        description: &str,
        body: NodeBody,
    ) -> Self {
        Self {
            id: utils::longid(),
            title: title.to_string(),
            description: description.to_string(),
            body,
            children: Vec::new(),
        }
    }

    pub fn trigger() -> Self {
        Self::with_body("Trigger", "Starts the workflow when the bound event fires", NodeBody::Trigger)
    }

    pub fn action(channel: Channel) -> Self {
        let title = match channel {
            Channel::Email => "Send Email",
            Channel::Sms => "Send SMS",
            Channel::WhatsApp => "Send WhatsApp",
        };
        Self::with_body(
            title,
            "",
            NodeBody::Action {
                channel,
                config: ActionConfig::default(),
            },
        )
    }

    pub fn delay() -> Self {
        Self::with_body(
            "Wait",
            "",
            NodeBody::Delay {
                config: DelayConfig::default(),
            },
        )
    }

    pub fn condition() -> Self {
        Self::with_body(
            "Replied?",
            "Splits on whether the recipient replied",
            NodeBody::Condition {
                branches: Branches::default(),
            },
        )
    }

    pub fn with_title(
        mut self,
        title: impl Into<String>,
    ) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(
        mut self,
        description: impl Into<String>,
    ) -> Self {
        self.description = description.into();
        self
    }

    /// Has no effect unless this is an action node.
    pub fn with_message(
        mut self,
        message: impl Into<String>,
    ) -> Self {
        self.fields_mut().set_message(message);
        self
    }

    /// Has no effect unless this is a delay node.
    pub fn with_duration(
        mut self,
        duration: impl Into<String>,
    ) -> Self {
        self.fields_mut().set_duration(duration);
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Trigger => NodeKind::Trigger,
            NodeBody::Action {
                ..
            } => NodeKind::Action,
            NodeBody::Delay {
                ..
            } => NodeKind::Delay,
            NodeBody::Condition {
                ..
            } => NodeKind::Condition,
        }
    }

    pub fn channel(&self) -> Option<Channel> {
        match &self.body {
            NodeBody::Action {
                channel,
                ..
            } => Some(*channel),
            _ => None,
        }
    }

    pub fn branches(&self) -> Option<&Branches> {
        match &self.body {
            NodeBody::Condition {
                branches,
            } => Some(branches),
            _ => None,
        }
    }

    pub fn branches_mut(&mut self) -> Option<&mut Branches> {
        match &mut self.body {
            NodeBody::Condition {
                branches,
            } => Some(branches),
            _ => None,
        }
    }

    pub fn fields_mut(&mut self) -> NodeFields<'_> {
        let config = match &mut self.body {
            NodeBody::Trigger => ConfigMut::Trigger,
            NodeBody::Action {
                config,
                ..
            } => ConfigMut::Action(config),
            NodeBody::Delay {
                config,
            } => ConfigMut::Delay(config),
            NodeBody::Condition {
                ..
            } => ConfigMut::Condition,
        };

        NodeFields {
            title: &mut self.title,
            description: &mut self.description,
            config,
        }
    }

    /// Child lists in search order: `children`, then `truePath`, then `falsePath`.
    pub fn child_lists(&self) -> impl Iterator<Item = &Vec<Node>> {
        let branches = self.branches();
        std::iter::once(&self.children).chain(branches.into_iter().flat_map(|b| [&b.true_path, &b.false_path]))
    }

    /// Mutable child lists, same order as [`Node::child_lists`].
    pub fn child_lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<Node>> {
        let Node {
            children,
            body,
            ..
        } = self;
        let branches = match body {
            NodeBody::Condition {
                branches,
            } => Some(branches),
            _ => None,
        };
        std::iter::once(children).chain(branches.into_iter().flat_map(|b| {
            let Branches {
                true_path,
                false_path,
            } = b;
            [true_path, false_path]
        }))
    }

    /// Pre-order walk over this node and every descendant.
    pub fn walk<'a>(
        &'a self,
        f: &mut impl FnMut(&'a Node),
    ) {
        f(self);
        for list in self.child_lists() {
            for child in list {
                child.walk(f);
            }
        }
    }

    /// Ids of this node and all of its descendants.
    pub fn subtree_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.walk(&mut |n| ids.push(n.id.clone()));
        ids
    }
}
