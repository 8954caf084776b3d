//! Workflow template handlers

use crate::api::rest::extract::Actor;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use workflow_engine::{NewStep, NewTemplate};
use workflow_types::{TemplateId, WorkflowTemplate};

/// List all templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WorkflowTemplate>>> {
    Ok(Json(state.catalog.list_templates().await?))
}

/// Author a template owned by the acting user
pub async fn create_template(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(input): Json<NewTemplate>,
) -> ApiResult<(StatusCode, Json<WorkflowTemplate>)> {
    let template = state.catalog.create_template(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> ApiResult<Json<WorkflowTemplate>> {
    Ok(Json(state.catalog.get_template(&id).await?))
}

/// Append a step to a template that no workflow uses yet
pub async fn add_template_step(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(step): Json<NewStep>,
) -> ApiResult<Json<WorkflowTemplate>> {
    let template = state
        .catalog
        .add_template_step(&id, step.name, step.description)
        .await?;
    Ok(Json(template))
}
