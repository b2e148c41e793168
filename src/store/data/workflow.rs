use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    CareflowError, Result,
    model::{WorkflowModel, WorkflowPayload},
    registry::Audience,
    workflow::{CompiledStep, Tree},
};

/// Stored workflow record. `data` holds the tree and compiled steps as json.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub trigger_type: String,
    pub audience: String,
    pub is_active: bool,
    pub data: String,
    pub create_time: i64,
    pub update_time: i64,
}

#[derive(Serialize)]
struct WorkflowDataRef<'a> {
    definition: &'a Tree,
    steps: &'a [CompiledStep],
}

#[derive(Deserialize)]
struct WorkflowData {
    definition: Tree,
    steps: Vec<CompiledStep>,
}

impl Workflow {
    pub fn new(
        id: String,
        payload: &WorkflowPayload,
        now: i64,
    ) -> Result<Self> {
        Ok(Self {
            id,
            name: payload.name.clone(),
            trigger_type: payload.trigger_type.to_string(),
            audience: payload.audience.as_ref().to_string(),
            is_active: true,
            data: Self::encode(payload)?,
            create_time: now,
            update_time: 0,
        })
    }

    /// Overwrites everything the payload carries; id, activity and create time are kept.
    pub fn apply(
        &mut self,
        payload: &WorkflowPayload,
        now: i64,
    ) -> Result<()> {
        self.data = Self::encode(payload)?;
        self.name = payload.name.clone();
        self.trigger_type = payload.trigger_type.to_string();
        self.audience = payload.audience.as_ref().to_string();
        self.update_time = now;
        Ok(())
    }

    pub fn to_model(&self) -> Result<WorkflowModel> {
        let data: WorkflowData = serde_json::from_str(&self.data)?;
        let audience = Audience::from_str(&self.audience).map_err(|e| CareflowError::Convert(format!("invalid audience '{}': {}", self.audience, e)))?;

        Ok(WorkflowModel {
            id: self.id.clone(),
            name: self.name.clone(),
            trigger_type: self.trigger_type.clone().into(),
            audience,
            definition: data.definition,
            steps: data.steps,
            is_active: self.is_active,
        })
    }

    fn encode(payload: &WorkflowPayload) -> Result<String> {
        let data = WorkflowDataRef {
            definition: &payload.definition,
            steps: &payload.steps,
        };
        Ok(serde_json::to_string(&data)?)
    }
}
