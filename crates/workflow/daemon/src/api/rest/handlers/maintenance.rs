//! Operator-triggered maintenance

use crate::api::rest::extract::Actor;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Json};
use workflow_engine::{SweepOutcome, SweepReport};
use workflow_types::{Role, WorkflowError};

/// Run the deadline sweep now
///
/// Admins only. Answers 409 when the scheduled sweep (or another
/// trigger) holds the run-lock.
pub async fn trigger_deadline_sweep(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> ApiResult<Json<SweepReport>> {
    if !state.directory.has_role(&actor, Role::Admin).await? {
        tracing::warn!(actor = %actor, "Deadline sweep trigger refused");
        return Err(WorkflowError::Forbidden(format!(
            "user '{}' may not trigger the deadline sweep",
            actor
        ))
        .into());
    }

    tracing::info!(actor = %actor, "Deadline sweep triggered manually");
    match state.sweep.run().await? {
        SweepOutcome::Completed(report) => Ok(Json(report)),
        SweepOutcome::Skipped => Err(ApiError::SweepRunning),
    }
}
