use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

/// A single comment or reply in a story discussion tree.
///
/// `content` doubles as the tombstone marker: a soft-deleted node keeps its
/// place in the tree with an empty `content` so its descendants stay anchored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentNode {
    pub id: String,
    pub story_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub depth: i32,
    pub child_count: i64,
    pub like_count: i64,
    pub liked_by_viewer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentNode {
    pub fn is_tombstone(&self) -> bool {
        self.content.is_empty()
    }
}

/// 反应类型，固定枚举集合
/// 问答类帖子只允许 like，其余类别支持全部表情反应
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Haha,
    Sad,
}

impl Default for ReactionKind {
    fn default() -> Self {
        Self::Like
    }
}

/// One reaction record per `(comment_id, user_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub comment_id: String,
    pub user_id: String,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

/// Authoritative reaction state for one node as seen by one viewer,
/// returned by every toggle so the client can overwrite its optimistic guess.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionSummary {
    pub like_count: i64,
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub story_id: String,
    pub parent_id: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToggleReactionRequest {
    pub kind: Option<ReactionKind>,
}
