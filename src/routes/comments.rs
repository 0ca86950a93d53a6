use crate::{
    error::{AppError, Result},
    models::comment::*,
    state::AppState,
    utils::middleware::OptionalIdentity,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_comment))
        .route("/:id/replies", get(get_replies))
        .route("/:id", put(update_comment))
        .route("/:id", delete(delete_comment))
        .route("/:id/reactions", post(toggle_reaction))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub page_size: Option<usize>,
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    OptionalIdentity(identity): OptionalIdentity,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Value>> {
    let identity = identity
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .comment_service
        .create_comment(&identity.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

async fn get_replies(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<String>,
    Query(query): Query<PageQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Json<Value>> {
    let page = state
        .comment_service
        .fetch_children(
            &story_id_of(&state, &comment_id).await?,
            Some(&comment_id),
            identity.as_ref().map(|i| i.id.as_str()),
            query.cursor.as_deref(),
            query
                .page_size
                .unwrap_or(state.config.default_replies_per_page),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": page
    })))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(comment_id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    let identity = identity
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let comment = state
        .comment_service
        .update_comment(&comment_id, &identity.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comment
    })))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(comment_id): Path<String>,
) -> Result<Json<Value>> {
    let identity = identity
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let updated_at = state
        .comment_service
        .delete_comment(&comment_id, &identity.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "updated_at": updated_at }
    })))
}

async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    OptionalIdentity(identity): OptionalIdentity,
    Path(comment_id): Path<String>,
    Json(request): Json<ToggleReactionRequest>,
) -> Result<Json<Value>> {
    let identity = identity
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let summary = state
        .comment_service
        .toggle_reaction(&comment_id, &identity.id, request.kind)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": summary
    })))
}

async fn story_id_of(state: &AppState, comment_id: &str) -> Result<String> {
    state
        .store
        .comment(comment_id)
        .map(|c| c.story_id)
        .ok_or_else(|| AppError::not_found("Comment"))
}
