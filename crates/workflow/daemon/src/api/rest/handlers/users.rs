//! Workload and notification handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use workflow_engine::UserWorkload;
use workflow_types::{Notification, TeamId, UserId};

pub async fn get_user_workload(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<UserWorkload>> {
    Ok(Json(state.orchestrator.get_user_workload(&id).await?))
}

/// One entry per active team member
pub async fn get_team_workload(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
) -> ApiResult<Json<Vec<UserWorkload>>> {
    Ok(Json(state.orchestrator.get_team_workload(&id).await?))
}

/// Notification log of a user, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.orchestrator.list_notifications(&id).await?))
}
