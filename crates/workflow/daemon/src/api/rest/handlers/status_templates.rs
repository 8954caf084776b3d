//! Status template handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use workflow_engine::NewStatusTemplate;
use workflow_types::{StatusTemplate, StatusTemplateId};

pub async fn list_status_templates(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StatusTemplate>>> {
    Ok(Json(state.catalog.list_status_templates().await?))
}

pub async fn create_status_template(
    State(state): State<AppState>,
    Json(input): Json<NewStatusTemplate>,
) -> ApiResult<(StatusCode, Json<StatusTemplate>)> {
    let template = state.catalog.create_status_template(input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_status_template(
    State(state): State<AppState>,
    Path(id): Path<StatusTemplateId>,
) -> ApiResult<Json<StatusTemplate>> {
    Ok(Json(state.catalog.get_status_template(&id).await?))
}
