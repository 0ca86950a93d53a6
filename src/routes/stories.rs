use crate::{
    error::{AppError, Result},
    models::story::CreateStoryRequest,
    routes::comments::PageQuery,
    state::AppState,
    utils::middleware::OptionalIdentity,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_story))
        .route("/:id", get(get_story))
        .route("/:id/comments", get(get_story_comments))
}

async fn create_story(
    State(state): State<Arc<AppState>>,
    OptionalIdentity(identity): OptionalIdentity,
    Json(request): Json<CreateStoryRequest>,
) -> Result<Json<Value>> {
    let identity = identity
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    let story = state
        .story_service
        .create_story(&identity.id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": story
    })))
}

async fn get_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<String>,
) -> Result<Json<Value>> {
    let story = state.story_service.get_story(&story_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": story
    })))
}

async fn get_story_comments(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<String>,
    Query(query): Query<PageQuery>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Json<Value>> {
    let page = state
        .comment_service
        .fetch_children(
            &story_id,
            None,
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
