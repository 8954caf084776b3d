//! Workflow Orchestrator: the only writer of workflow state
//!
//! Every mutation follows the same shape:
//! 1. Resolve the acting user
//! 2. Take the workflow's lock and re-read current state
//! 3. Check lifecycle legality, step preconditions and authorization
//! 4. Stage all rows in one [`UnitOfWork`] guarded by the read revision
//! 5. Commit, then hand notifications to the sink
//!
//! Notifications are best-effort. A failing sink is logged and never
//! turns a committed change into an error.

use crate::analytics::{deadline_signals, workload, UserWorkload, WorkflowStats};
use crate::config::EngineConfig;
use crate::directory::Directory;
use crate::locks::WorkflowLocks;
use crate::notifier::NotificationSink;
use crate::storage::{UnitOfWork, WorkflowStore};
use crate::view::{NewWorkflow, WorkflowFilter, WorkflowView};
use crate::visibility::{is_visible, Viewer};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use workflow_types::*;

/// Coordinates workflow state changes across store, directory and sink
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    store: Arc<dyn WorkflowStore>,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn NotificationSink>,
    locks: WorkflowLocks,
    config: EngineConfig,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            locks: WorkflowLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Start a workflow from a template.
    ///
    /// Creates the workflow at step 1, the step 1 assignment and the
    /// `creation` ledger entry in one commit.
    pub async fn create_workflow(
        &self,
        input: NewWorkflow,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;

        let template = self.template(&input.template_id).await?;
        template.ensure_startable()?;

        if input.title.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "workflow title must not be empty".into(),
            ));
        }
        if input.visibility == Visibility::Team && input.team_id.is_none() {
            return Err(WorkflowError::ValidationError(
                "team visibility requires a team".into(),
            ));
        }

        let assignee = input.assignee.unwrap_or_else(|| actor.clone());
        self.require_user(&assignee).await?;

        let custom_status = match &input.status_template_id {
            Some(id) => {
                let vocabulary = self
                    .store
                    .get_status_template(id)
                    .await?
                    .ok_or_else(|| WorkflowError::not_found("status template", id))?;
                vocabulary.initial_item().map(|item| item.id.clone())
            }
            None => None,
        };

        let now = Utc::now();
        let mut workflow = Workflow::new(
            template.id.clone(),
            input.title,
            actor.clone(),
            template.total_steps(),
        )
        .with_description(input.description)
        .with_priority(input.priority)
        .with_visibility(input.visibility);
        workflow.deadline = input.deadline;
        workflow.team_id = input.team_id;
        workflow.status_template_id = input.status_template_id;
        workflow.custom_status = custom_status;
        workflow.created_at = now;
        workflow.touch(now);

        let mut unit = UnitOfWork::new();
        unit.expect_absent(workflow.id.clone())
            .put_workflow(workflow.clone())
            .put_assignment(Assignment::open(
                workflow.id.clone(),
                1,
                assignee.clone(),
                now,
            ))
            .append_transition(Transition::creation(
                workflow.id.clone(),
                assignee.clone(),
                actor.clone(),
                now,
            ));
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            template_id = %template.id,
            total_steps = workflow.total_steps,
            assignee = %assignee,
            actor = %actor,
            "Workflow created"
        );

        if &assignee != actor {
            self.dispatch(vec![assignment_notice(
                &workflow,
                &assignee,
                template.step_name(1),
                now,
            )])
            .await;
        }
        Ok(workflow)
    }

    // ── Step movement ────────────────────────────────────────────────

    /// Close the current step and move to the next one, or complete the
    /// workflow when the current step is the last.
    ///
    /// `next_assignee` is required unless the current step is final.
    pub async fn advance_to_next_step(
        &self,
        workflow_id: &WorkflowId,
        next_assignee: Option<UserId>,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow.status.ensure_permits(LifecycleOperation::Advance)?;

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let mut current = latest_for_step(&assignments, workflow.current_step)
            .cloned()
            .ok_or_else(|| missing_assignment(&workflow))?;
        self.authorize(
            &workflow,
            Some(&current.assigned_to),
            actor,
            true,
            LifecycleOperation::Advance,
        )
        .await?;

        let next = if workflow.is_final_step() {
            None
        } else {
            let next = next_assignee.ok_or_else(|| {
                WorkflowError::ValidationError(format!(
                    "advancing past step {} requires a next assignee",
                    workflow.current_step
                ))
            })?;
            self.require_user(&next).await?;
            Some(next)
        };

        let now = Utc::now();
        let comments: String = comments.into();
        let from_step = workflow.current_step;
        let from_user = current.assigned_to.clone();

        let mut unit = UnitOfWork::new();
        if current.is_active() {
            current.complete(now);
            unit.put_assignment(current);
        }

        let notices = match next {
            None => {
                workflow.set_status(WorkflowStatus::Completed, now);
                unit.append_transition(
                    Transition::status_change(
                        workflow.id.clone(),
                        from_step,
                        WorkflowStatus::InProgress,
                        WorkflowStatus::Completed,
                        actor.clone(),
                        now,
                    )
                    .with_users(Some(from_user.clone()), None)
                    .with_comments(comments),
                );
                vec![Notification::new(
                    workflow.id.clone(),
                    workflow.created_by.clone(),
                    NotificationType::StatusChange,
                    "Workflow completed",
                    format!("'{}' finished its last step", workflow.title),
                )
                .at(now)]
            }
            Some(next) => {
                workflow.advance_pointer();
                unit.put_assignment(Assignment::open(
                    workflow.id.clone(),
                    workflow.current_step,
                    next.clone(),
                    now,
                ))
                .append_transition(
                    Transition::step_change(
                        workflow.id.clone(),
                        from_step,
                        workflow.current_step,
                        Some(from_user.clone()),
                        next.clone(),
                        actor.clone(),
                        now,
                    )
                    .with_comments(comments),
                );
                let template = self.store.get_template(&workflow.template_id).await?;
                let step_name = template
                    .as_ref()
                    .and_then(|t| t.step_name(workflow.current_step));
                vec![assignment_notice(&workflow, &next, step_name, now)]
            }
        };

        workflow.touch(now);
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            from_step,
            to_step = workflow.current_step,
            status = %workflow.status,
            actor = %actor,
            "Workflow advanced"
        );

        self.dispatch(notices).await;
        Ok(workflow)
    }

    /// Hand the current step to another user.
    ///
    /// The active assignment keeps its row; only the holder changes.
    /// Assigning to the current holder is a no-op.
    pub async fn assign_step(
        &self,
        workflow_id: &WorkflowId,
        step: u32,
        new_assignee: &UserId,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        self.require_user(new_assignee).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow.status.ensure_permits(LifecycleOperation::AssignStep)?;
        ensure_current_step(&workflow, step)?;

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let mut assignment = match active_for_step(&assignments, step) {
            Some(active) => active.clone(),
            None => {
                return match latest_for_step(&assignments, step) {
                    Some(_) => Err(WorkflowError::ValidationError(format!(
                        "step {} is already completed; advance the workflow instead",
                        step
                    ))),
                    None => Err(missing_assignment(&workflow)),
                }
            }
        };
        self.authorize(
            &workflow,
            Some(&assignment.assigned_to),
            actor,
            true,
            LifecycleOperation::AssignStep,
        )
        .await?;

        if &assignment.assigned_to == new_assignee {
            tracing::debug!(
                workflow_id = %workflow.id,
                step,
                assignee = %new_assignee,
                "Step already held by assignee"
            );
            return Ok(workflow);
        }

        let now = Utc::now();
        let previous = std::mem::replace(&mut assignment.assigned_to, new_assignee.clone());
        workflow.touch(now);

        let mut unit = UnitOfWork::new();
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone())
            .put_assignment(assignment)
            .append_transition(
                Transition::reassignment(
                    workflow.id.clone(),
                    step,
                    previous.clone(),
                    new_assignee.clone(),
                    actor.clone(),
                    now,
                )
                .with_comments(comments),
            );
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            step,
            from = %previous,
            to = %new_assignee,
            actor = %actor,
            "Step reassigned"
        );

        let template = self.store.get_template(&workflow.template_id).await?;
        let step_name = template.as_ref().and_then(|t| t.step_name(step));
        self.dispatch(vec![assignment_notice(&workflow, new_assignee, step_name, now)])
            .await;
        Ok(workflow)
    }

    /// Mark the current step's assignment completed without advancing.
    ///
    /// Idempotent: an already completed step is left as is.
    pub async fn complete_step(
        &self,
        workflow_id: &WorkflowId,
        step: u32,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow
            .status
            .ensure_permits(LifecycleOperation::CompleteStep)?;
        ensure_current_step(&workflow, step)?;

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let mut assignment = latest_for_step(&assignments, step)
            .cloned()
            .ok_or_else(|| missing_assignment(&workflow))?;
        self.authorize(
            &workflow,
            Some(&assignment.assigned_to),
            actor,
            false,
            LifecycleOperation::CompleteStep,
        )
        .await?;

        if assignment.is_completed() {
            tracing::debug!(workflow_id = %workflow.id, step, "Step already completed");
            return Ok(workflow);
        }

        let now = Utc::now();
        let comments: String = comments.into();
        assignment.complete(now);
        workflow.touch(now);

        let mut unit = UnitOfWork::new();
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone())
            .put_assignment(assignment);
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            step,
            actor = %actor,
            comments = %comments,
            "Step completed"
        );
        Ok(workflow)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Move a workflow to any lifecycle status.
    ///
    /// Same status is a no-op. Completing or canceling force-closes the
    /// active assignment. Moving back into `in_progress` from `completed`
    /// or `canceled` reopens the current step for its last holder; a step
    /// already finished by its holder stays finished across pause/resume.
    pub async fn update_workflow_status(
        &self,
        workflow_id: &WorkflowId,
        new_status: WorkflowStatus,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow
            .status
            .ensure_permits(LifecycleOperation::ChangeStatus)?;

        if workflow.status == new_status {
            tracing::debug!(
                workflow_id = %workflow.id,
                status = %new_status,
                "Workflow already in requested status"
            );
            return Ok(workflow);
        }

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let holder =
            latest_for_step(&assignments, workflow.current_step).map(|a| a.assigned_to.clone());
        self.authorize(
            &workflow,
            holder.as_ref(),
            actor,
            true,
            LifecycleOperation::ChangeStatus,
        )
        .await?;

        let now = Utc::now();
        let from_status = workflow.status;
        let mut unit = UnitOfWork::new();
        let responsible = shift_status(&mut workflow, &assignments, new_status, now, &mut unit);

        unit.append_transition(
            Transition::status_change(
                workflow.id.clone(),
                workflow.current_step,
                from_status,
                new_status,
                actor.clone(),
                now,
            )
            .with_users(Some(responsible.clone()), Some(responsible.clone()))
            .with_comments(comments),
        );
        workflow.touch(now);
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            from = %from_status,
            to = %new_status,
            actor = %actor,
            "Workflow status changed"
        );

        let mut recipients = vec![workflow.created_by.clone()];
        if let Some(holder) = holder {
            if holder != workflow.created_by {
                recipients.push(holder);
            }
        }
        let notices = recipients
            .into_iter()
            .map(|user| {
                Notification::new(
                    workflow.id.clone(),
                    user,
                    NotificationType::StatusChange,
                    "Workflow status changed",
                    format!("'{}' moved from {} to {}", workflow.title, from_status, new_status),
                )
                .at(now)
            })
            .collect();
        self.dispatch(notices).await;
        Ok(workflow)
    }

    /// Archive a completed or canceled workflow
    pub async fn archive_workflow(
        &self,
        workflow_id: &WorkflowId,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow.status.ensure_permits(LifecycleOperation::Archive)?;
        self.authorize(&workflow, None, actor, true, LifecycleOperation::Archive)
            .await?;

        let now = Utc::now();
        let from_status = workflow.status;
        workflow.set_status(WorkflowStatus::Archived, now);
        workflow.touch(now);

        let mut unit = UnitOfWork::new();
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone())
            .append_transition(
                Transition::status_change(
                    workflow.id.clone(),
                    workflow.current_step,
                    from_status,
                    WorkflowStatus::Archived,
                    actor.clone(),
                    now,
                )
                .with_comments(comments),
            );
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            from = %from_status,
            actor = %actor,
            "Workflow archived"
        );
        Ok(workflow)
    }

    /// Bring an archived workflow back to the status it had before the
    /// most recent archive, as recorded in the ledger.
    pub async fn restore_workflow(
        &self,
        workflow_id: &WorkflowId,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow.status.ensure_permits(LifecycleOperation::Restore)?;
        self.authorize(&workflow, None, actor, true, LifecycleOperation::Restore)
            .await?;

        let ledger = self.store.transitions_for_workflow(workflow_id).await?;
        let target = match pre_archive_status(&ledger) {
            Some(status) => status,
            None => {
                tracing::warn!(
                    workflow_id = %workflow.id,
                    "No archival record in ledger, restoring as completed"
                );
                WorkflowStatus::Completed
            }
        };

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let now = Utc::now();
        let mut unit = UnitOfWork::new();
        let responsible = shift_status(&mut workflow, &assignments, target, now, &mut unit);

        unit.append_transition(
            Transition::status_change(
                workflow.id.clone(),
                workflow.current_step,
                WorkflowStatus::Archived,
                target,
                actor.clone(),
                now,
            )
            .with_users(Some(responsible.clone()), Some(responsible))
            .with_comments(comments),
        );
        workflow.touch(now);
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            to = %target,
            actor = %actor,
            "Workflow restored"
        );
        Ok(workflow)
    }

    /// Move within the workflow's custom status vocabulary.
    ///
    /// The lifecycle status is untouched; the ledger entry carries the
    /// custom from/to items.
    pub async fn set_custom_status(
        &self,
        workflow_id: &WorkflowId,
        item_id: &StatusItemId,
        comments: impl Into<String>,
        actor: &UserId,
    ) -> WorkflowResult<Workflow> {
        self.require_user(actor).await?;
        let _guard = self.locks.acquire(workflow_id).await;

        let mut workflow = self.load(workflow_id).await?;
        let expected = workflow.revision;
        workflow
            .status
            .ensure_permits(LifecycleOperation::SetCustomStatus)?;

        let vocabulary_id = workflow.status_template_id.clone().ok_or_else(|| {
            WorkflowError::ValidationError(format!(
                "workflow '{}' does not use a status template",
                workflow.id
            ))
        })?;
        let vocabulary = self
            .store
            .get_status_template(&vocabulary_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("status template", &vocabulary_id))?;
        let item = vocabulary.item(item_id).ok_or_else(|| {
            WorkflowError::ValidationError(format!(
                "status item '{}' does not belong to status template '{}'",
                item_id, vocabulary_id
            ))
        })?;

        if workflow.custom_status.as_ref() == Some(&item.id) {
            tracing::debug!(workflow_id = %workflow.id, item = %item.name, "Custom status unchanged");
            return Ok(workflow);
        }

        let assignments = self.store.assignments_for_workflow(workflow_id).await?;
        let holder =
            latest_for_step(&assignments, workflow.current_step).map(|a| a.assigned_to.clone());
        self.authorize(
            &workflow,
            holder.as_ref(),
            actor,
            true,
            LifecycleOperation::SetCustomStatus,
        )
        .await?;

        let now = Utc::now();
        let responsible = holder.unwrap_or_else(|| workflow.created_by.clone());
        let previous = workflow.custom_status.replace(item.id.clone());
        workflow.touch(now);

        let mut unit = UnitOfWork::new();
        unit.expect_revision(workflow.id.clone(), expected)
            .put_workflow(workflow.clone())
            .append_transition(
                Transition::status_change(
                    workflow.id.clone(),
                    workflow.current_step,
                    workflow.status,
                    workflow.status,
                    actor.clone(),
                    now,
                )
                .with_users(Some(responsible.clone()), Some(responsible))
                .with_custom_status(previous, Some(item.id.clone()))
                .with_comments(comments),
            );
        self.store.commit(unit).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            item = %item.name,
            actor = %actor,
            "Custom status set"
        );
        Ok(workflow)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// A visible workflow with its derived fields.
    ///
    /// Invisible workflows are reported as not found.
    pub async fn get_workflow(
        &self,
        workflow_id: &WorkflowId,
        viewer: &UserId,
    ) -> WorkflowResult<WorkflowView> {
        let workflow = self.load_visible(workflow_id, viewer).await?;
        self.view_of(workflow).await
    }

    /// Derive the view of a workflow without a visibility check
    pub async fn view_of(&self, workflow: Workflow) -> WorkflowResult<WorkflowView> {
        let template = self.store.get_template(&workflow.template_id).await?;
        let template = template.ok_or_else(|| {
            let message = format!(
                "workflow '{}' references missing template '{}'",
                workflow.id, workflow.template_id
            );
            tracing::error!(workflow_id = %workflow.id, "{}", message);
            WorkflowError::InconsistentState(message)
        })?;
        let assignments = self.store.assignments_for_workflow(&workflow.id).await?;
        Ok(self.compose_view(workflow, &template, &assignments, Utc::now()))
    }

    /// Visible workflows matching `filter`, newest first
    pub async fn list_workflows(
        &self,
        viewer: &UserId,
        filter: &WorkflowFilter,
    ) -> WorkflowResult<Vec<WorkflowView>> {
        let viewer = self.viewer(viewer).await?;
        let templates: HashMap<TemplateId, WorkflowTemplate> = self
            .store
            .list_templates()
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let now = Utc::now();
        let mut views = Vec::new();
        for workflow in self.store.list_workflows().await? {
            if !is_visible(&workflow, &viewer) {
                continue;
            }
            let Some(template) = templates.get(&workflow.template_id) else {
                tracing::error!(
                    workflow_id = %workflow.id,
                    template_id = %workflow.template_id,
                    "Workflow references missing template, skipped"
                );
                continue;
            };
            let assignments = self.store.assignments_for_workflow(&workflow.id).await?;
            let view = self.compose_view(workflow, template, &assignments, now);
            if filter.matches(&view) {
                views.push(view);
            }
        }

        views.sort_by(|a, b| b.workflow.created_at.cmp(&a.workflow.created_at));
        Ok(views)
    }

    /// Ledger of a visible workflow in chronological order
    pub async fn get_transitions(
        &self,
        workflow_id: &WorkflowId,
        viewer: &UserId,
    ) -> WorkflowResult<Vec<Transition>> {
        self.load_visible(workflow_id, viewer).await?;
        let mut ledger = self.store.transitions_for_workflow(workflow_id).await?;
        ledger.sort_by_key(|t| t.sequence);
        Ok(ledger)
    }

    /// Assignments of a visible workflow in creation order
    pub async fn get_assignments(
        &self,
        workflow_id: &WorkflowId,
        viewer: &UserId,
    ) -> WorkflowResult<Vec<Assignment>> {
        self.load_visible(workflow_id, viewer).await?;
        Ok(self.store.assignments_for_workflow(workflow_id).await?)
    }

    pub async fn get_user_workload(&self, user_id: &UserId) -> WorkflowResult<UserWorkload> {
        self.require_user(user_id).await?;
        let active = self.store.active_assignments_for_user(user_id).await?;
        Ok(workload(
            user_id.clone(),
            active.len(),
            self.config.workload_threshold,
        ))
    }

    /// Workload of every active member of a team
    pub async fn get_team_workload(&self, team_id: &TeamId) -> WorkflowResult<Vec<UserWorkload>> {
        let members = self.directory.team_members(team_id).await?;
        let mut loads = Vec::with_capacity(members.len());
        for member in members {
            let active = self.store.active_assignments_for_user(&member).await?;
            loads.push(workload(member, active.len(), self.config.workload_threshold));
        }
        Ok(loads)
    }

    /// Counts over the workflows `viewer` can see
    pub async fn get_stats(&self, viewer: &UserId) -> WorkflowResult<WorkflowStats> {
        let viewer = self.viewer(viewer).await?;
        let workflows = self.store.list_workflows().await?;
        Ok(WorkflowStats::collect(
            workflows.iter().filter(|w| is_visible(w, &viewer)),
            Utc::now(),
            self.config.near_deadline_days,
        ))
    }

    pub async fn list_notifications(&self, user_id: &UserId) -> WorkflowResult<Vec<Notification>> {
        self.require_user(user_id).await?;
        self.notifier
            .list_for_user(user_id)
            .await
            .map_err(|e| WorkflowError::Storage(e.to_string()))
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn require_user(&self, id: &UserId) -> WorkflowResult<User> {
        match self.directory.get_user(id).await? {
            Some(user) if user.active => Ok(user),
            _ => Err(WorkflowError::not_found("user", id)),
        }
    }

    async fn template(&self, id: &TemplateId) -> WorkflowResult<WorkflowTemplate> {
        self.store
            .get_template(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("template", id))
    }

    async fn load(&self, id: &WorkflowId) -> WorkflowResult<Workflow> {
        self.store
            .get_workflow(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("workflow", id))
    }

    async fn load_visible(&self, id: &WorkflowId, viewer: &UserId) -> WorkflowResult<Workflow> {
        let viewer = self.viewer(viewer).await?;
        let workflow = self.load(id).await?;
        if !is_visible(&workflow, &viewer) {
            return Err(WorkflowError::not_found("workflow", id));
        }
        Ok(workflow)
    }

    async fn viewer(&self, user_id: &UserId) -> WorkflowResult<Viewer> {
        let user = self.require_user(user_id).await?;
        let teams = self.directory.team_memberships(&user.id).await?;
        let held = self.store.workflows_held_by(&user.id).await?;
        Ok(Viewer::new(user.id).with_teams(teams).with_held(held))
    }

    /// Creator (when allowed), current holder, or an admin/supervisor
    async fn authorize(
        &self,
        workflow: &Workflow,
        holder: Option<&UserId>,
        actor: &UserId,
        creator_allowed: bool,
        operation: LifecycleOperation,
    ) -> WorkflowResult<()> {
        if (creator_allowed && &workflow.created_by == actor) || holder == Some(actor) {
            return Ok(());
        }
        if self.directory.has_role(actor, Role::Admin).await?
            || self.directory.has_role(actor, Role::Supervisor).await?
        {
            return Ok(());
        }
        tracing::debug!(
            workflow_id = %workflow.id,
            actor = %actor,
            operation = operation.as_str(),
            "Mutation refused"
        );
        Err(WorkflowError::Forbidden(format!(
            "user '{}' may not {} workflow '{}'",
            actor,
            operation.as_str(),
            workflow.id
        )))
    }

    fn compose_view(
        &self,
        workflow: Workflow,
        template: &WorkflowTemplate,
        assignments: &[Assignment],
        now: DateTime<Utc>,
    ) -> WorkflowView {
        let current_assignee =
            latest_for_step(assignments, workflow.current_step).map(|a| a.assigned_to.clone());
        let current_step_name = template
            .step_name(workflow.current_step)
            .map(str::to_string);
        let deadline = deadline_signals(&workflow, now, self.config.near_deadline_days);
        WorkflowView {
            template_name: template.name.clone(),
            current_step_name,
            current_assignee,
            deadline,
            workflow,
        }
    }

    async fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            let workflow_id = notification.workflow_id.clone();
            let user_id = notification.user_id.clone();
            if let Err(e) = self.notifier.notify(notification).await {
                tracing::warn!(
                    workflow_id = %workflow_id,
                    user_id = %user_id,
                    error = %e,
                    "Notification dropped"
                );
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn ensure_current_step(workflow: &Workflow, step: u32) -> WorkflowResult<()> {
    if step == 0 || step > workflow.total_steps {
        return Err(WorkflowError::InvalidStep {
            step,
            total: workflow.total_steps,
        });
    }
    if step != workflow.current_step {
        return Err(WorkflowError::NotCurrentStep {
            requested: step,
            current: workflow.current_step,
        });
    }
    Ok(())
}

fn missing_assignment(workflow: &Workflow) -> WorkflowError {
    let message = format!(
        "workflow '{}' has no assignment for current step {}",
        workflow.id, workflow.current_step
    );
    tracing::error!(
        workflow_id = %workflow.id,
        step = workflow.current_step,
        "Current step has no assignment"
    );
    WorkflowError::InconsistentState(message)
}

/// Apply a lifecycle status and stage the assignment side effects.
///
/// The current step is reopened only when the workflow leaves `completed`
/// or `canceled` for `in_progress`, or when the step has never had an
/// assignment. Returns the user responsible for the current step
/// afterwards: its latest holder, or the creator when nobody ever held it.
fn shift_status(
    workflow: &mut Workflow,
    assignments: &[Assignment],
    target: WorkflowStatus,
    now: DateTime<Utc>,
    unit: &mut UnitOfWork,
) -> UserId {
    let step = workflow.current_step;
    let from = workflow.status;
    let active = active_for_step(assignments, step).cloned();
    let latest = latest_for_step(assignments, step).map(|a| a.assigned_to.clone());
    let mut responsible = latest.clone();

    let reopen = target == WorkflowStatus::InProgress
        && active.is_none()
        && (matches!(from, WorkflowStatus::Completed | WorkflowStatus::Canceled)
            || latest.is_none());

    workflow.set_status(target, now);
    match (target, active) {
        (WorkflowStatus::Completed | WorkflowStatus::Canceled, Some(mut open)) => {
            open.complete(now);
            unit.put_assignment(open);
        }
        (WorkflowStatus::InProgress, None) if reopen => {
            let holder = latest.unwrap_or_else(|| workflow.created_by.clone());
            unit.put_assignment(Assignment::open(
                workflow.id.clone(),
                step,
                holder.clone(),
                now,
            ));
            workflow.progress_percentage = progress_for(step, workflow.total_steps);
            tracing::info!(workflow_id = %workflow.id, step, holder = %holder, "Current step reopened");
            responsible = Some(holder);
        }
        _ => {}
    }

    responsible.unwrap_or_else(|| workflow.created_by.clone())
}

fn assignment_notice(
    workflow: &Workflow,
    assignee: &UserId,
    step_name: Option<&str>,
    now: DateTime<Utc>,
) -> Notification {
    let step = match step_name {
        Some(name) => format!("step {} ({})", workflow.current_step, name),
        None => format!("step {}", workflow.current_step),
    };
    Notification::new(
        workflow.id.clone(),
        assignee.clone(),
        NotificationType::Assignment,
        "New assignment",
        format!("You are responsible for {} of '{}'", step, workflow.title),
    )
    .at(now)
}
