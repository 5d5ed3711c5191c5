use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{Pagination, SaveEssayRequest};
use crate::{
    auth::session::SessionUser, error::ApiError, extract::JsonBody, state::AppState, store::Essay,
};

#[instrument(skip(state))]
pub async fn list_essays(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Essay>>, ApiError> {
    let (limit, offset) = p.clamped();
    let essays = state.store.list_essays(user_id, limit, offset).await?;
    Ok(Json(essays))
}

#[instrument(skip(state, body))]
pub async fn create_essay(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    JsonBody(body): JsonBody<SaveEssayRequest>,
) -> Result<(StatusCode, Json<Essay>), ApiError> {
    let draft = body.into_draft()?;
    let essay = state.store.create_essay(user_id, &draft).await?;
    info!(%user_id, essay_id = %essay.id, words = essay.word_count, "essay saved");
    Ok((StatusCode::CREATED, Json(essay)))
}

#[instrument(skip(state))]
pub async fn get_essay(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Essay>, ApiError> {
    state
        .store
        .get_essay(user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(user_id, id))
}

#[instrument(skip(state, body))]
pub async fn update_essay(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
    JsonBody(body): JsonBody<SaveEssayRequest>,
) -> Result<Json<Essay>, ApiError> {
    let draft = body.into_draft()?;
    let essay = state
        .store
        .update_essay(user_id, id, &draft)
        .await?
        .ok_or_else(|| not_found(user_id, id))?;
    info!(%user_id, essay_id = %essay.id, words = essay.word_count, "essay updated");
    Ok(Json(essay))
}

#[instrument(skip(state))]
pub async fn delete_essay(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_essay(user_id, id).await? {
        info!(%user_id, essay_id = %id, "essay deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(user_id, id))
    }
}

fn not_found(user_id: Uuid, id: Uuid) -> ApiError {
    warn!(%user_id, %id, "essay not found");
    ApiError::NotFound("Essay not found".into())
}
