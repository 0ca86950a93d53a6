use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{CommentOrder, Config},
    error::{AppError, Result},
    models::comment::*,
    models::page::{validate_page_size, ChildPage, ScopeId},
    services::store::{CommentRecord, ThreadStore},
    thread::{depth, CommentApi},
    utils::validation::validate_comment_content,
};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<ThreadStore>,
    config: Config,
}

impl CommentService {
    pub async fn new(store: Arc<ThreadStore>, config: Config) -> Result<Self> {
        Ok(Self { store, config })
    }

    /// One page of a scope's direct children. `parent_id = None` addresses
    /// the story's top-level comments. The cursor is the id of the last item
    /// of the previous page; an absent `next_cursor` means exhausted.
    pub async fn fetch_children(
        &self,
        story_id: &str,
        parent_id: Option<&str>,
        viewer: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage> {
        validate_page_size(page_size)?;
        self.store
            .story(story_id)
            .ok_or_else(|| AppError::not_found("Story"))?;
        if let Some(pid) = parent_id {
            let parent = self
                .store
                .comment(pid)
                .ok_or_else(|| AppError::not_found("Comment"))?;
            if parent.story_id != story_id {
                return Err(AppError::validation("Comment belongs to a different story"));
            }
        }

        let mut ordered = self.store.ordered_children(story_id, parent_id);
        if self.config.comment_order == CommentOrder::NewestFirst {
            ordered.reverse();
        }
        let visible: Vec<&CommentRecord> =
            ordered.iter().filter(|r| self.is_listed(r)).collect();
        let total = visible.len() as i64;

        let start = match cursor {
            None => 0,
            Some(c) => {
                if let Some(i) = visible.iter().position(|r| r.id == c) {
                    i + 1
                } else if let Some(j) = ordered.iter().position(|r| r.id == c) {
                    // The cursor row dropped out of the listing (a childless
                    // tombstone); resume after its position.
                    ordered[..=j].iter().filter(|r| self.is_listed(r)).count()
                } else {
                    return Err(AppError::validation("Unknown pagination cursor"));
                }
            }
        };

        let end = usize::min(start + page_size, visible.len());
        let items: Vec<CommentNode> = visible[start..end]
            .iter()
            .map(|r| self.node_view(r, viewer))
            .collect();
        let next_cursor = if end < visible.len() {
            items.last().map(|n| n.id.clone())
        } else {
            None
        };

        debug!(
            "Fetched {} of {} children for story {} scope {:?}",
            items.len(),
            total,
            story_id,
            parent_id
        );
        Ok(ChildPage {
            items,
            next_cursor,
            total_child_count: total,
        })
    }

    pub async fn create_comment(
        &self,
        author_id: &str,
        request: CreateCommentRequest,
    ) -> Result<CommentNode> {
        debug!("Creating comment on story: {}", request.story_id);

        request
            .validate()
            .map_err(AppError::ValidatorError)?;
        validate_comment_content(&request.content)?;
        if request.content.len() > self.config.max_comment_length {
            return Err(AppError::validation("Comment is too long"));
        }

        self.store
            .story(&request.story_id)
            .ok_or_else(|| AppError::not_found("Story"))?;

        let node_depth = match &request.parent_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .comment(parent_id)
                    .ok_or_else(|| AppError::not_found("Parent comment"))?;
                if parent.story_id != request.story_id {
                    return Err(AppError::validation("Parent belongs to a different story"));
                }
                if parent.is_tombstone() {
                    return Err(AppError::not_found("Parent comment"));
                }
                if !depth::can_attach(parent.depth) {
                    return Err(AppError::DepthExceeded {
                        max_depth: depth::MAX_DEPTH,
                    });
                }
                depth::child_depth(parent.depth)
            }
            None => depth::MIN_DEPTH,
        };

        let now = Utc::now();
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            story_id: request.story_id.clone(),
            parent_id: request.parent_id,
            author_id: author_id.to_string(),
            content: request.content,
            depth: node_depth,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(record.clone());
        self.store.bump_story_comment_count(&request.story_id, 1);

        Ok(self.node_view(&record, Some(author_id)))
    }

    pub async fn update_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        request: UpdateCommentRequest,
    ) -> Result<CommentNode> {
        request
            .validate()
            .map_err(AppError::ValidatorError)?;
        validate_comment_content(&request.content)?;
        if request.content.len() > self.config.max_comment_length {
            return Err(AppError::validation("Comment is too long"));
        }

        let comment = self
            .store
            .comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if comment.is_tombstone() {
            return Err(AppError::not_found("Comment"));
        }
        if comment.author_id != user_id {
            return Err(AppError::forbidden("You can only edit your own comments"));
        }

        let updated = self
            .store
            .set_comment_content(comment_id, request.content, Utc::now())
            .ok_or_else(|| AppError::internal("Failed to update comment"))?;
        Ok(self.node_view(&updated, Some(user_id)))
    }

    /// Soft delete: the row keeps its place with empty content so replies
    /// underneath stay anchored. Only the author may delete.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<DateTime<Utc>> {
        let comment = self
            .store
            .comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if comment.is_tombstone() {
            return Err(AppError::not_found("Comment"));
        }
        if comment.author_id != user_id {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }

        let updated = self
            .store
            .set_comment_content(comment_id, String::new(), Utc::now())
            .ok_or_else(|| AppError::internal("Failed to delete comment"))?;
        self.store.bump_story_comment_count(&comment.story_id, -1);

        debug!("Tombstoned comment {}", comment_id);
        Ok(updated.updated_at)
    }

    /// Toggles the viewer's reaction. Emotion kinds beyond a plain like are
    /// only accepted where the story category supports them; the returned
    /// summary is authoritative for the viewer.
    pub async fn toggle_reaction(
        &self,
        comment_id: &str,
        user_id: &str,
        kind: Option<ReactionKind>,
    ) -> Result<ReactionSummary> {
        let comment = self
            .store
            .comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if comment.is_tombstone() {
            return Err(AppError::not_found("Comment"));
        }
        let story = self
            .store
            .story(&comment.story_id)
            .ok_or_else(|| AppError::not_found("Story"))?;

        let kind = kind.unwrap_or_default();
        if kind != ReactionKind::Like && !story.category.supports_emotion_reactions() {
            return Err(AppError::validation(
                "This story category only supports plain likes",
            ));
        }

        let (like_count, liked_by_viewer) = self.store.toggle_reaction(comment_id, user_id, kind);
        Ok(ReactionSummary {
            like_count,
            liked_by_viewer,
        })
    }

    /// Whether a record appears in listings: live comments always, tombstones
    /// only while they anchor descendants.
    fn is_listed(&self, record: &CommentRecord) -> bool {
        !record.is_tombstone() || self.store.has_children(&record.story_id, &record.id)
    }

    fn visible_child_count(&self, record: &CommentRecord) -> i64 {
        self.store
            .ordered_children(&record.story_id, Some(&record.id))
            .iter()
            .filter(|r| self.is_listed(r))
            .count() as i64
    }

    fn node_view(&self, record: &CommentRecord, viewer: Option<&str>) -> CommentNode {
        CommentNode {
            id: record.id.clone(),
            story_id: record.story_id.clone(),
            parent_id: record.parent_id.clone(),
            author_id: record.author_id.clone(),
            content: record.content.clone(),
            depth: record.depth,
            child_count: self.visible_child_count(record),
            like_count: self.store.like_count(&record.id),
            liked_by_viewer: viewer.map_or(false, |v| self.store.liked_by(&record.id, v)),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[async_trait]
impl CommentApi for CommentService {
    async fn fetch_children(
        &self,
        story_id: &str,
        scope: &ScopeId,
        viewer: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage> {
        CommentService::fetch_children(self, story_id, scope.parent_id(), viewer, cursor, page_size)
            .await
    }

    async fn create_reply(
        &self,
        story_id: &str,
        parent_id: Option<&str>,
        author: &str,
        content: &str,
    ) -> Result<CommentNode> {
        self.create_comment(
            author,
            CreateCommentRequest {
                story_id: story_id.to_string(),
                parent_id: parent_id.map(str::to_string),
                content: content.to_string(),
            },
        )
        .await
    }

    async fn toggle_reaction(
        &self,
        node_id: &str,
        viewer: &str,
        kind: Option<ReactionKind>,
    ) -> Result<ReactionSummary> {
        CommentService::toggle_reaction(self, node_id, viewer, kind).await
    }

    async fn delete_node(&self, node_id: &str, viewer: &str) -> Result<DateTime<Utc>> {
        self.delete_comment(node_id, viewer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::story::{CreateStoryRequest, StoryCategory};
    use crate::services::story::StoryService;

    async fn setup() -> (CommentService, StoryService, String) {
        let store = Arc::new(ThreadStore::new());
        let config = Config::default();
        let comments = CommentService::new(store.clone(), config.clone()).await.unwrap();
        let stories = StoryService::new(store, config).await.unwrap();
        let story = stories
            .create_story(
                "author-1",
                CreateStoryRequest {
                    neighborhood: "Maple Heights".to_string(),
                    category: Some(StoryCategory::DailyLife),
                    content: "Anyone else hear the owls last night?".to_string(),
                },
            )
            .await
            .unwrap();
        (comments, stories, story.id)
    }

    fn comment_request(story_id: &str, parent_id: Option<&str>, content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            story_id: story_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn twelve_roots_paginate_as_ten_then_two() {
        let (comments, _stories, story_id) = setup().await;
        for i in 0..12 {
            comments
                .create_comment("author-1", comment_request(&story_id, None, &format!("comment {}", i)))
                .await
                .unwrap();
        }

        let first = comments
            .fetch_children(&story_id, None, None, None, 10)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_child_count, 12);
        assert_eq!(first.next_cursor.as_deref(), Some(first.items[9].id.as_str()));

        let second = comments
            .fetch_children(&story_id, None, None, first.next_cursor.as_deref(), 10)
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(second.next_cursor.is_none());

        // An exhausted scope keeps returning nothing new.
        let third = comments
            .fetch_children(&story_id, None, None, Some(&second.items[1].id), 10)
            .await
            .unwrap();
        assert!(third.items.is_empty());
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn replies_past_max_depth_are_rejected() {
        let (comments, _stories, story_id) = setup().await;
        let mut parent = comments
            .create_comment("author-1", comment_request(&story_id, None, "root"))
            .await
            .unwrap();
        for _ in 0..depth::MAX_DEPTH {
            parent = comments
                .create_comment("author-1", comment_request(&story_id, Some(&parent.id), "reply"))
                .await
                .unwrap();
        }
        assert_eq!(parent.depth, depth::MAX_DEPTH);

        let err = comments
            .create_comment("author-1", comment_request(&story_id, Some(&parent.id), "too deep"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DepthExceeded { .. }));
    }

    #[tokio::test]
    async fn tombstone_with_replies_stays_listed_without_content() {
        let (comments, _stories, story_id) = setup().await;
        let parent = comments
            .create_comment("author-1", comment_request(&story_id, None, "parent"))
            .await
            .unwrap();
        comments
            .create_comment("author-2", comment_request(&story_id, Some(&parent.id), "child"))
            .await
            .unwrap();

        comments.delete_comment(&parent.id, "author-1").await.unwrap();

        let page = comments
            .fetch_children(&story_id, None, None, None, 10)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].is_tombstone());
        assert_eq!(page.items[0].child_count, 1);

        let replies = comments
            .fetch_children(&story_id, Some(&parent.id), None, None, 10)
            .await
            .unwrap();
        assert_eq!(replies.items.len(), 1);
        assert_eq!(replies.items[0].content, "child");
    }

    #[tokio::test]
    async fn childless_tombstone_drops_out_of_the_listing() {
        let (comments, _stories, story_id) = setup().await;
        let lonely = comments
            .create_comment("author-1", comment_request(&story_id, None, "no replies here"))
            .await
            .unwrap();
        comments
            .create_comment("author-2", comment_request(&story_id, None, "still here"))
            .await
            .unwrap();

        comments.delete_comment(&lonely.id, "author-1").await.unwrap();

        let page = comments
            .fetch_children(&story_id, None, None, None, 10)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_child_count, 1);
        assert_eq!(page.items[0].content, "still here");
    }

    #[tokio::test]
    async fn double_toggle_restores_the_original_state() {
        let (comments, _stories, story_id) = setup().await;
        let c = comments
            .create_comment("author-1", comment_request(&story_id, None, "like me twice"))
            .await
            .unwrap();

        let on = comments.toggle_reaction(&c.id, "u1", None).await.unwrap();
        assert_eq!((on.like_count, on.liked_by_viewer), (1, true));
        let off = comments.toggle_reaction(&c.id, "u1", None).await.unwrap();
        assert_eq!((off.like_count, off.liked_by_viewer), (0, false));
    }

    #[tokio::test]
    async fn question_stories_reject_emotion_reactions() {
        let store = Arc::new(ThreadStore::new());
        let config = Config::default();
        let comments = CommentService::new(store.clone(), config.clone()).await.unwrap();
        let stories = StoryService::new(store, config).await.unwrap();
        let story = stories
            .create_story(
                "author-1",
                CreateStoryRequest {
                    neighborhood: "Maple Heights".to_string(),
                    category: Some(StoryCategory::Question),
                    content: "Which bakery opens earliest?".to_string(),
                },
            )
            .await
            .unwrap();
        let c = comments
            .create_comment("author-2", comment_request(&story.id, None, "The one on 5th."))
            .await
            .unwrap();

        let err = comments
            .toggle_reaction(&c.id, "u1", Some(ReactionKind::Haha))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        // Plain likes still work on question threads.
        assert!(comments.toggle_reaction(&c.id, "u1", None).await.is_ok());
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let (comments, _stories, story_id) = setup().await;
        let c = comments
            .create_comment("author-1", comment_request(&story_id, None, "mine"))
            .await
            .unwrap();
        let err = comments.delete_comment(&c.id, "intruder").await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn unknown_cursor_is_rejected() {
        let (comments, _stories, story_id) = setup().await;
        comments
            .create_comment("author-1", comment_request(&story_id, None, "only one"))
            .await
            .unwrap();
        let err = comments
            .fetch_children(&story_id, None, None, Some("no-such-id"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
