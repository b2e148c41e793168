//! Maps a `(trigger type, audience)` pair to its workflow document.
//!
//! Documents are created on their first save. Saves are last-writer-wins:
//! there is no version check, and two concurrent first saves for the same
//! key will both create a document.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    CareflowError, Result,
    model::{WorkflowModel, WorkflowPayload},
    store::WorkflowCollection,
    workflow::{CompiledStep, Tree, compiler, template},
};

/// Domain event a workflow is bound to. Values outside the known catalog are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    AppointmentCreated,
    AppointmentCompleted,
    AppointmentMissed,
    MeetingCreated,
    EmailOpened,
    EmailClicked,
    #[strum(default)]
    Other(String),
}

impl TriggerType {
    pub const KNOWN: [TriggerType; 6] = [
        TriggerType::AppointmentCreated,
        TriggerType::AppointmentCompleted,
        TriggerType::AppointmentMissed,
        TriggerType::MeetingCreated,
        TriggerType::EmailOpened,
        TriggerType::EmailClicked,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TriggerType::AppointmentCreated => "APPOINTMENT_CREATED",
            TriggerType::AppointmentCompleted => "APPOINTMENT_COMPLETED",
            TriggerType::AppointmentMissed => "APPOINTMENT_MISSED",
            TriggerType::MeetingCreated => "MEETING_CREATED",
            TriggerType::EmailOpened => "EMAIL_OPENED",
            TriggerType::EmailClicked => "EMAIL_CLICKED",
            TriggerType::Other(s) => s,
        }
    }
}

impl From<String> for TriggerType {
    fn from(value: String) -> Self {
        TriggerType::from_str(&value).unwrap_or(TriggerType::Other(value))
    }
}

impl From<TriggerType> for String {
    fn from(value: TriggerType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TriggerType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient segment a workflow applies to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Audience {
    #[default]
    All,
    New,
    Returning,
}

/// A workflow as seen by the author: the tree plus its compiled form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// `None` until the first successful save
    pub id: Option<String>,
    pub name: String,
    pub trigger_type: TriggerType,
    pub audience: Audience,
    pub tree: Tree,
    pub compiled_steps: Vec<CompiledStep>,
    pub is_active: bool,
}

impl WorkflowDocument {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl TryFrom<WorkflowModel> for WorkflowDocument {
    type Error = CareflowError;

    fn try_from(model: WorkflowModel) -> Result<Self> {
        model.definition.validate().map_err(|e| CareflowError::Structural(format!("stored workflow {} is invalid: {}", model.id, e)))?;

        Ok(Self {
            id: Some(model.id),
            name: model.name,
            trigger_type: model.trigger_type,
            audience: model.audience,
            tree: model.definition,
            compiled_steps: model.steps,
            is_active: model.is_active,
        })
    }
}

/// Resolves and persists workflow documents through a [`WorkflowCollection`].
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn WorkflowCollection>,
}

impl Registry {
    pub fn new(store: Arc<dyn WorkflowCollection>) -> Self {
        Self {
            store,
        }
    }

    /// All stored documents.
    pub async fn list(&self) -> Result<Vec<WorkflowDocument>> {
        self.store.list().await?.into_iter().map(WorkflowDocument::try_from).collect()
    }

    /// Returns the stored document for the key, or an unsaved copy of the default template.
    ///
    /// When several stored documents share the key, an active one is preferred, then the first listed.
    pub async fn resolve(
        &self,
        trigger_type: &TriggerType,
        audience: Audience,
    ) -> Result<WorkflowDocument> {
        trace!("registry::resolve({}, {})", trigger_type, audience.as_ref());
        let mut matches: Vec<WorkflowModel> = self.store.list().await?.into_iter().filter(|m| &m.trigger_type == trigger_type && m.audience == audience).collect();

        if matches.is_empty() {
            debug!("registry::resolve: no document for ({}, {}), seeding from template", trigger_type, audience.as_ref());
            return Ok(template::default_document(trigger_type.clone(), audience));
        }
        if matches.len() > 1 {
            let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
            warn!("registry::resolve: {} documents for ({}, {}): {:?}", matches.len(), trigger_type, audience.as_ref(), ids);
        }

        let pick = matches.iter().position(|m| m.is_active).unwrap_or(0);
        WorkflowDocument::try_from(matches.swap_remove(pick))
    }

    /// Compiles the tree and persists the document, creating it if it has no id yet.
    ///
    /// The input is never modified; on success the persisted document is returned.
    pub async fn save(
        &self,
        document: &WorkflowDocument,
    ) -> Result<WorkflowDocument> {
        document.tree.validate()?;
        let steps = compiler::compile(&document.tree)?;

        let payload = WorkflowPayload {
            name: document.name.clone(),
            trigger_type: document.trigger_type.clone(),
            audience: document.audience,
            definition: document.tree.clone(),
            steps,
        };

        let model = match &document.id {
            None => {
                trace!("registry::save: create ({}, {})", document.trigger_type, document.audience.as_ref());
                self.store.create(&payload).await?
            }
            Some(id) => {
                trace!("registry::save: update {}", id);
                self.store.update(id, &payload).await?
            }
        };

        debug!("registry::save: stored {} with {} step(s)", model.id, model.steps.len());
        WorkflowDocument::try_from(model).map_err(|e| CareflowError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        store::MemStore,
        workflow::{Node, NodeKind, StepType},
    };

    struct FailingStore;

    #[async_trait]
    impl WorkflowCollection for FailingStore {
        async fn list(&self) -> Result<Vec<WorkflowModel>> {
            Ok(vec![])
        }

        async fn create(
            &self,
            _payload: &WorkflowPayload,
        ) -> Result<WorkflowModel> {
            Err(CareflowError::Persistence("connection refused".into()))
        }

        async fn update(
            &self,
            _id: &str,
            _payload: &WorkflowPayload,
        ) -> Result<WorkflowModel> {
            Err(CareflowError::Persistence("connection refused".into()))
        }
    }

    fn registry() -> Registry {
        Registry::new(Arc::new(MemStore::new()))
    }

    #[test]
    fn test_trigger_type_strings() {
        assert_eq!(TriggerType::from("APPOINTMENT_MISSED".to_string()), TriggerType::AppointmentMissed);
        assert_eq!(TriggerType::from("PAYMENT_DUE".to_string()), TriggerType::Other("PAYMENT_DUE".into()));
        assert_eq!(TriggerType::MeetingCreated.to_string(), "MEETING_CREATED");
        for t in TriggerType::KNOWN {
            assert_eq!(TriggerType::from(t.to_string()), t);
        }
        assert_eq!(Audience::from_str("RETURNING").unwrap(), Audience::Returning);
        assert_eq!(Audience::New.as_ref(), "NEW");
    }

    #[tokio::test]
    async fn test_resolve_unknown_key_returns_template() {
        let registry = registry();
        let doc = registry.resolve(&TriggerType::AppointmentCreated, Audience::New).await.unwrap();
        assert!(doc.id.is_none());
        assert_eq!(doc.trigger_type, TriggerType::AppointmentCreated);
        assert_eq!(doc.audience, Audience::New);
        assert_eq!(doc.tree.trigger().unwrap().kind(), NodeKind::Trigger);
        assert_eq!(doc.tree.len(), 5);
    }

    #[tokio::test]
    async fn test_create_on_first_save() {
        let registry = registry();
        let doc = registry.resolve(&TriggerType::AppointmentCreated, Audience::New).await.unwrap();
        let saved = registry.save(&doc).await.unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.tree, doc.tree);
        assert_eq!(saved.compiled_steps.len(), 4);
        assert_eq!(saved.compiled_steps[2].step_type, StepType::Delay);
        assert_eq!(saved.compiled_steps[2].delay_minutes, Some(1440));

        let resolved = registry.resolve(&TriggerType::AppointmentCreated, Audience::New).await.unwrap();
        assert_eq!(resolved, saved);

        let other = registry.resolve(&TriggerType::AppointmentCreated, Audience::Returning).await.unwrap();
        assert!(other.id.is_none());
    }

    #[tokio::test]
    async fn test_second_save_updates_in_place() {
        let registry = registry();
        let doc = registry.resolve(&TriggerType::AppointmentMissed, Audience::All).await.unwrap();
        let mut saved = registry.save(&doc).await.unwrap();
        let id = saved.id.clone();

        let delay_id = saved.tree.ids()[3].clone();
        assert!(saved.tree.remove(&delay_id).unwrap().is_applied());
        saved.name = "Missed, short".to_string();
        let updated = registry.save(&saved).await.unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Missed, short");
        assert_eq!(updated.compiled_steps.len(), 2);
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_uncompilable_tree_before_io() {
        let registry = registry();
        let mut doc = registry.resolve(&TriggerType::MeetingCreated, Audience::All).await.unwrap();
        let trigger_id = doc.tree.trigger().unwrap().id.clone();
        assert!(doc.tree.append_child(&trigger_id, Node::delay().with_duration("tomorrow")).unwrap().is_applied());

        let err = registry.save(&doc).await.unwrap_err();
        assert!(matches!(err, CareflowError::Compile { .. }));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_document() {
        let registry = Registry::new(Arc::new(FailingStore));
        let doc = registry.resolve(&TriggerType::EmailClicked, Audience::All).await.unwrap();
        let before = doc.clone();
        let err = registry.save(&doc).await.unwrap_err();
        assert!(matches!(err, CareflowError::Persistence(_)));
        assert_eq!(doc, before);
    }

    #[tokio::test]
    async fn test_racing_first_saves_create_two_documents() {
        let registry = registry();
        let doc = registry.resolve(&TriggerType::AppointmentCompleted, Audience::New).await.unwrap();
        let (a, b) = tokio::join!(registry.save(&doc), registry.save(&doc));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id, b.id);
        assert_eq!(registry.list().await.unwrap().len(), 2);

        let resolved = registry.resolve(&TriggerType::AppointmentCompleted, Audience::New).await.unwrap();
        assert!(resolved.id == a.id || resolved.id == b.id);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let registry = registry();
        let mut doc = registry.resolve(&TriggerType::EmailOpened, Audience::All).await.unwrap();
        doc.id = Some("gone".to_string());
        assert!(matches!(registry.save(&doc).await, Err(CareflowError::Persistence(_))));
    }

    #[test]
    fn test_stored_tree_must_lead_with_trigger() {
        let text = serde_json::json!({
            "id": "wf-orphan",
            "triggerType": "APPOINTMENT_CREATED",
            "audience": "ALL",
            "definition": [
                { "id": "a", "kind": "action", "actionChannel": "sms", "config": { "message": "orphan" } },
                { "id": "t", "kind": "trigger" }
            ]
        })
        .to_string();
        let model = WorkflowModel::from_json(&text).unwrap();
        assert!(matches!(WorkflowDocument::try_from(model), Err(CareflowError::Structural(_))));
    }
}
