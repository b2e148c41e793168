//! Built-in safety-net template used to seed new workflows.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    registry::{Audience, TriggerType, WorkflowDocument},
    workflow::{
        compiler,
        node::{Channel, Node},
        tree::Tree,
    },
};

/// Regex pattern for message placeholders
/// Format: `{PatientName}`, `{Time}`
const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z][A-Za-z0-9_]*)\}";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).unwrap());

pub const CONFIRMATION_EMAIL: &str = "Hi {PatientName}, your appointment on {Time} is confirmed. We look forward to seeing you.";
pub const CONFIRMATION_WHATSAPP: &str = "Hi {PatientName}, your appointment on {Time} is confirmed. Reply CANCEL if you can no longer make it.";
pub const REMINDER_DELAY: &str = "24h";
pub const REMINDER_SMS: &str = "Reminder: you have an appointment on {Time}. Reply CANCEL if you can no longer make it.";

/// Returns a fresh copy of the default chain:
/// trigger -> email -> whatsapp -> wait 24h -> sms.
///
/// Every call generates new ids, so a copy never collides with a tree already open.
pub fn default_tree() -> Tree {
    let mut sms = Node::action(Channel::Sms).with_title("Send reminder").with_message(REMINDER_SMS);
    sms.description = "Sent a day after booking".to_string();

    let mut delay = Node::delay().with_title("Wait 24 hours").with_duration(REMINDER_DELAY);
    delay.children.push(sms);

    let mut whatsapp = Node::action(Channel::WhatsApp).with_title("Confirm on WhatsApp").with_message(CONFIRMATION_WHATSAPP);
    whatsapp.children.push(delay);

    let mut email = Node::action(Channel::Email).with_title("Confirm by email").with_message(CONFIRMATION_EMAIL);
    email.children.push(whatsapp);

    let mut trigger = Node::trigger();
    trigger.children.push(email);

    Tree::from_roots(vec![trigger]).expect("default template is a valid tree")
}

/// An unsaved document for `(trigger_type, audience)` seeded from the default tree, with its steps already compiled.
pub fn default_document(
    trigger_type: TriggerType,
    audience: Audience,
) -> WorkflowDocument {
    let tree = default_tree();
    let compiled_steps = compiler::compile(&tree).expect("default template compiles");
    WorkflowDocument {
        id: None,
        name: default_name(&trigger_type, audience),
        trigger_type,
        audience,
        tree,
        compiled_steps,
        is_active: true,
    }
}

pub fn default_name(
    trigger_type: &TriggerType,
    audience: Audience,
) -> String {
    format!("{} / {}", trigger_type.as_str(), audience.as_ref())
}

/// Lists the placeholder names used in a message, in order of first appearance.
pub fn placeholders(message: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(message) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
