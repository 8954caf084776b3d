//! Template catalog: authoring and lookup of workflow and status templates
//!
//! Templates are frozen once a workflow references them. To change a
//! flow that is already in use, author a new template.

use crate::directory::Directory;
use crate::storage::{UnitOfWork, WorkflowStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use workflow_types::{
    StatusItem, StatusTemplate, StatusTemplateId, TemplateId, UserId, Visibility, WorkflowError,
    WorkflowResult, WorkflowTemplate,
};

// ── Inputs ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewStep {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Input for authoring a workflow template; steps are numbered in order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub steps: Vec<NewStep>,
}

impl NewTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            visibility: Visibility::default(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, name: impl Into<String>) -> Self {
        self.steps.push(NewStep {
            name: name.into(),
            description: String::new(),
        });
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewStatusItem {
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub order: u32,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewStatusTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub items: Vec<NewStatusItem>,
}

// ── Catalog ──────────────────────────────────────────────────────────

/// Catalog of workflow and status templates
#[derive(Clone)]
pub struct TemplateCatalog {
    store: Arc<dyn WorkflowStore>,
    directory: Arc<dyn Directory>,
}

impl TemplateCatalog {
    pub fn new(store: Arc<dyn WorkflowStore>, directory: Arc<dyn Directory>) -> Self {
        Self { store, directory }
    }

    /// Author a workflow template
    ///
    /// A template without steps may be stored but cannot start a workflow.
    pub async fn create_template(
        &self,
        input: NewTemplate,
        owner: &UserId,
    ) -> WorkflowResult<WorkflowTemplate> {
        self.require_active_user(owner).await?;

        let mut template = WorkflowTemplate::new(input.name, owner.clone())
            .with_description(input.description)
            .with_visibility(input.visibility);
        for step in input.steps {
            template.push_step(step.name, step.description);
        }
        template.validate()?;

        let mut unit = UnitOfWork::new();
        unit.put_template(template.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            template_id = %template.id,
            steps = template.total_steps(),
            owner = %owner,
            "Workflow template created"
        );
        Ok(template)
    }

    /// Append step n+1 to a template no workflow uses yet
    pub async fn add_template_step(
        &self,
        template_id: &TemplateId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> WorkflowResult<WorkflowTemplate> {
        let mut template = self.get_template(template_id).await?;
        if self.store.template_in_use(template_id).await? {
            return Err(WorkflowError::ValidationError(format!(
                "template '{}' is referenced by workflows and can no longer change",
                template_id
            )));
        }

        let order = template.push_step(name, description);
        template.validate()?;

        let mut unit = UnitOfWork::new();
        unit.put_template(template.clone());
        self.store.commit(unit).await?;

        tracing::info!(template_id = %template_id, step = order, "Template step added");
        Ok(template)
    }

    pub async fn get_template(&self, id: &TemplateId) -> WorkflowResult<WorkflowTemplate> {
        self.store
            .get_template(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("template", id))
    }

    pub async fn list_templates(&self) -> WorkflowResult<Vec<WorkflowTemplate>> {
        Ok(self.store.list_templates().await?)
    }

    /// Name of the step at `order`
    pub async fn get_step_name(&self, template_id: &TemplateId, order: u32) -> WorkflowResult<String> {
        let template = self.get_template(template_id).await?;
        template
            .step_name(order)
            .map(str::to_string)
            .ok_or_else(|| WorkflowError::not_found("template step", format!("{}#{}", template_id, order)))
    }

    // ── Status templates ─────────────────────────────────────────────

    /// Author a status vocabulary; the first item is promoted to initial
    /// when none is flagged
    pub async fn create_status_template(
        &self,
        input: NewStatusTemplate,
    ) -> WorkflowResult<StatusTemplate> {
        let items = input
            .items
            .into_iter()
            .map(|i| {
                let mut item = StatusItem::new(i.name, i.color, i.order);
                item.is_initial = i.is_initial;
                item.is_final = i.is_final;
                item
            })
            .collect();
        let template = StatusTemplate::build(input.name, items)?.with_description(input.description);

        let mut unit = UnitOfWork::new();
        unit.put_status_template(template.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            status_template_id = %template.id,
            items = template.items.len(),
            "Status template created"
        );
        Ok(template)
    }

    pub async fn get_status_template(&self, id: &StatusTemplateId) -> WorkflowResult<StatusTemplate> {
        self.store
            .get_status_template(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("status template", id))
    }

    pub async fn list_status_templates(&self) -> WorkflowResult<Vec<StatusTemplate>> {
        Ok(self.store.list_status_templates().await?)
    }

    pub async fn initial_status_item(&self, id: &StatusTemplateId) -> WorkflowResult<StatusItem> {
        let template = self.get_status_template(id).await?;
        template.initial_item().cloned().ok_or_else(|| {
            WorkflowError::InconsistentState(format!("status template '{}' has no initial item", id))
        })
    }

    async fn require_active_user(&self, id: &UserId) -> WorkflowResult<()> {
        match self.directory.get_user(id).await? {
            Some(user) if user.active => Ok(()),
            _ => Err(WorkflowError::not_found("user", id)),
        }
    }
}
