use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::story::*,
    services::store::ThreadStore,
    config::Config,
    utils::validation::validate_neighborhood,
};

#[derive(Clone)]
pub struct StoryService {
    store: Arc<ThreadStore>,
    config: Config,
}

impl StoryService {
    pub async fn new(store: Arc<ThreadStore>, config: Config) -> Result<Self> {
        Ok(Self { store, config })
    }

    pub async fn create_story(
        &self,
        author_id: &str,
        request: CreateStoryRequest,
    ) -> Result<Story> {
        debug!("Creating story in neighborhood: {}", request.neighborhood);

        request
            .validate()
            .map_err(AppError::ValidatorError)?;
        validate_neighborhood(&request.neighborhood)?;
        if request.content.len() > self.config.max_story_length {
            return Err(AppError::validation("Story is too long"));
        }

        let now = Utc::now();
        let story = Story {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            neighborhood: request.neighborhood,
            category: request.category.unwrap_or_default(),
            content: request.content,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_story(story.clone());
        Ok(story)
    }

    pub async fn get_story(&self, story_id: &str) -> Result<Story> {
        self.store
            .story(story_id)
            .ok_or_else(|| AppError::not_found("Story"))
    }
}
