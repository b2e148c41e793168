use serde::{Deserialize, Serialize};

use crate::{
    CareflowError, Result,
    registry::{Audience, TriggerType},
    workflow::{CompiledStep, Tree},
};

/// A workflow document as exchanged with the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub trigger_type: TriggerType,
    pub audience: Audience,
    #[serde(default)]
    pub definition: Tree,
    #[serde(default)]
    pub steps: Vec<CompiledStep>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request body of `POST workflows` and `PUT workflows/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPayload {
    pub name: String,
    pub trigger_type: TriggerType,
    pub audience: Audience,
    pub definition: Tree,
    pub steps: Vec<CompiledStep>,
}

fn default_active() -> bool {
    true
}

impl WorkflowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let workflow = serde_json::from_str::<WorkflowModel>(s);
        match workflow {
            Ok(v) => Ok(v),
            Err(e) => Err(CareflowError::Convert(format!("{}", e))),
        }
    }
}
