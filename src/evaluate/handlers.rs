use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::dto::{EvaluateRequest, EvaluateResponse};
use crate::{error::ApiError, extract::JsonBody, state::AppState};

/// POST /api/evaluate/ {essay, task_type?, topic?}
#[instrument(skip(state, payload))]
pub async fn evaluate_essay(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let submission = payload.into_submission()?;
    let words = submission.essay.split_whitespace().count();

    let feedback = state.evaluator.evaluate(&submission).await?;

    info!(task_type = %submission.task_type, words, "essay evaluated");
    Ok(Json(EvaluateResponse { feedback }))
}

/// Any other method on the evaluate route.
pub async fn post_only() -> ApiError {
    ApiError::MethodNotAllowed("POST only".into())
}
