//! Workflow templates: reusable ordered step definitions
//!
//! A WorkflowTemplate is the blueprint a running Workflow follows. Steps
//! are numbered 1..=n with no gaps. Once a workflow references a template
//! its step list is frozen; authoring a different flow means a new template.

use crate::{TemplateId, TemplateStepId, UserId, WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Visibility ───────────────────────────────────────────────────────

/// Who may see a template or workflow in listings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Everyone
    #[default]
    Public,
    /// Members of the owning team
    Team,
    /// Creator and anyone who has held an assignment
    Restricted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Team => "team",
            Visibility::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Visibility {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "team" => Ok(Visibility::Team),
            "restricted" => Ok(Visibility::Restricted),
            other => Err(WorkflowError::ValidationError(format!(
                "unknown visibility '{}'",
                other
            ))),
        }
    }
}

// ── Template Step ────────────────────────────────────────────────────

/// One named step of a template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStep {
    pub id: TemplateStepId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 1-based position, unique within the template
    pub order: u32,
}

// ── Workflow Template ────────────────────────────────────────────────

/// A reusable ordered definition of steps
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub visibility: Visibility,
    pub owner: UserId,
    /// Steps sorted by `order`
    pub steps: Vec<TemplateStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// Create an empty template
    pub fn new(name: impl Into<String>, owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: TemplateId::generate(),
            name: name.into(),
            description: String::new(),
            visibility: Visibility::Public,
            owner,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Builder form of [`WorkflowTemplate::push_step`]
    pub fn with_step(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.push_step(name, description);
        self
    }

    /// Append a step at position n+1 and return its order
    pub fn push_step(&mut self, name: impl Into<String>, description: impl Into<String>) -> u32 {
        let order = self.steps.len() as u32 + 1;
        self.steps.push(TemplateStep {
            id: TemplateStepId::generate(),
            name: name.into(),
            description: description.into(),
            order,
        });
        self.updated_at = Utc::now();
        order
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Look up a step by its 1-based order
    pub fn step(&self, order: u32) -> Option<&TemplateStep> {
        self.steps.iter().find(|s| s.order == order)
    }

    pub fn step_name(&self, order: u32) -> Option<&str> {
        self.step(order).map(|s| s.name.as_str())
    }

    /// Structural checks: non-empty name, orders 1..=n contiguous and unique
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "template name must not be empty".into(),
            ));
        }
        for (idx, step) in self.steps.iter().enumerate() {
            let expected = idx as u32 + 1;
            if step.order != expected {
                return Err(WorkflowError::ValidationError(format!(
                    "step orders must be contiguous from 1: found {} at position {}",
                    step.order, expected
                )));
            }
            if step.name.trim().is_empty() {
                return Err(WorkflowError::ValidationError(format!(
                    "step {} has an empty name",
                    step.order
                )));
            }
        }
        Ok(())
    }

    /// A workflow can only start from a template with at least one step
    pub fn ensure_startable(&self) -> WorkflowResult<()> {
        if self.steps.is_empty() {
            return Err(WorkflowError::InvalidTemplate(format!(
                "template '{}' has no steps",
                self.id
            )));
        }
        Ok(())
    }
}
