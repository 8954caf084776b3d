//! Workflow lifecycle handlers
//!
//! Every mutation answers with the refreshed workflow view so clients see
//! the derived fields (current step name, holder, deadline flags) at once.

use crate::api::rest::extract::Actor;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use workflow_engine::{NewWorkflow, WorkflowFilter, WorkflowStats, WorkflowView};
use workflow_types::{
    Assignment, StatusItemId, Transition, UserId, Workflow, WorkflowId, WorkflowStatus,
};

// ── Request bodies ───────────────────────────────────────────────────

/// Advance request; `next_assignee` may be omitted on the final step
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdvanceRequest {
    pub next_assignee: Option<UserId>,
    pub comments: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee: UserId,
    #[serde(default)]
    pub comments: String,
}

/// Status change request; the status is parsed by the engine vocabulary
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomStatusRequest {
    pub item_id: StatusItemId,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    pub comments: String,
}

// ── Queries ──────────────────────────────────────────────────────────

/// Visible workflows matching the query filters, newest first
pub async fn list_workflows(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(filter): Query<WorkflowFilter>,
) -> ApiResult<Json<Vec<WorkflowView>>> {
    Ok(Json(state.orchestrator.list_workflows(&actor, &filter).await?))
}

pub async fn get_workflow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<WorkflowView>> {
    Ok(Json(state.orchestrator.get_workflow(&id, &actor).await?))
}

pub async fn workflow_stats(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> ApiResult<Json<WorkflowStats>> {
    Ok(Json(state.orchestrator.get_stats(&actor).await?))
}

pub async fn list_transitions(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<Vec<Transition>>> {
    Ok(Json(state.orchestrator.get_transitions(&id, &actor).await?))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
) -> ApiResult<Json<Vec<Assignment>>> {
    Ok(Json(state.orchestrator.get_assignments(&id, &actor).await?))
}

// ── Mutations ────────────────────────────────────────────────────────

pub async fn create_workflow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(input): Json<NewWorkflow>,
) -> ApiResult<(StatusCode, Json<WorkflowView>)> {
    let workflow = state.orchestrator.create_workflow(input, &actor).await?;
    Ok((StatusCode::CREATED, respond(&state, workflow).await?))
}

pub async fn advance_workflow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
    Json(body): Json<AdvanceRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .advance_to_next_step(&id, body.next_assignee, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn assign_step(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((id, step)): Path<(WorkflowId, u32)>,
    Json(body): Json<AssignRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .assign_step(&id, step, &body.assignee, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn complete_step(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((id, step)): Path<(WorkflowId, u32)>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .complete_step(&id, step, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn update_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let status: WorkflowStatus = body.status.parse()?;
    let workflow = state
        .orchestrator
        .update_workflow_status(&id, status, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn set_custom_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
    Json(body): Json<CustomStatusRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .set_custom_status(&id, &body.item_id, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn archive_workflow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .archive_workflow(&id, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

pub async fn restore_workflow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<WorkflowId>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let workflow = state
        .orchestrator
        .restore_workflow(&id, body.comments, &actor)
        .await?;
    respond(&state, workflow).await
}

async fn respond(state: &AppState, workflow: Workflow) -> ApiResult<Json<WorkflowView>> {
    Ok(Json(state.orchestrator.view_of(workflow).await?))
}
