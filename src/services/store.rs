use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::models::comment::{Reaction, ReactionKind};
use crate::models::story::Story;

/// 评论的存储形态
/// 浏览者相关的派生字段（点赞状态、子评论数）由服务层在读取时计算
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: String,
    pub story_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub content: String,
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentRecord {
    pub fn is_tombstone(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Default)]
struct CommentIndex {
    by_id: HashMap<String, CommentRecord>,
    /// Direct child ids per (story, parent) scope, in creation order.
    /// Rows are never removed: deletion tombstones the record in place.
    children: HashMap<(String, Option<String>), Vec<String>>,
}

/// 数据服务
/// 帖子与评论树的内存存储，评论行只增不删（删除即墓碑化）
pub struct ThreadStore {
    stories: DashMap<String, Story>,
    comments: RwLock<CommentIndex>,
    reactions: DashMap<(String, String), Reaction>,
    reaction_counts: DashMap<String, i64>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self {
            stories: DashMap::new(),
            comments: RwLock::new(CommentIndex::default()),
            reactions: DashMap::new(),
            reaction_counts: DashMap::new(),
        }
    }

    // ---- stories ----

    pub fn insert_story(&self, story: Story) {
        self.stories.insert(story.id.clone(), story);
    }

    pub fn story(&self, id: &str) -> Option<Story> {
        self.stories.get(id).map(|s| s.clone())
    }

    pub fn bump_story_comment_count(&self, id: &str, delta: i64) {
        if let Some(mut story) = self.stories.get_mut(id) {
            story.comment_count += delta;
            story.updated_at = Utc::now();
        }
    }

    // ---- comments ----

    pub fn insert_comment(&self, record: CommentRecord) {
        let mut index = self.comments.write();
        let scope = (record.story_id.clone(), record.parent_id.clone());
        index.children.entry(scope).or_default().push(record.id.clone());
        index.by_id.insert(record.id.clone(), record);
    }

    pub fn comment(&self, id: &str) -> Option<CommentRecord> {
        self.comments.read().by_id.get(id).cloned()
    }

    /// Rewrites a comment's content (edit or tombstone) and stamps
    /// `updated_at`. Returns the updated record.
    pub fn set_comment_content(
        &self,
        id: &str,
        content: String,
        updated_at: DateTime<Utc>,
    ) -> Option<CommentRecord> {
        let mut index = self.comments.write();
        let record = index.by_id.get_mut(id)?;
        record.content = content;
        record.updated_at = updated_at;
        Some(record.clone())
    }

    /// Direct children of a scope in creation order, tombstones included.
    pub fn ordered_children(&self, story_id: &str, parent_id: Option<&str>) -> Vec<CommentRecord> {
        let index = self.comments.read();
        let scope = (story_id.to_string(), parent_id.map(str::to_string));
        index
            .children
            .get(&scope)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| index.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_children(&self, story_id: &str, parent_id: &str) -> bool {
        let index = self.comments.read();
        let scope = (story_id.to_string(), Some(parent_id.to_string()));
        index.children.get(&scope).map_or(false, |ids| !ids.is_empty())
    }

    // ---- reactions ----

    /// Toggles one user's reaction on one comment, keeping the
    /// `(comment, user)` pair unique. Toggling the same kind removes it;
    /// a different kind switches in place without changing the count.
    /// Returns the resulting `(like_count, liked_by_viewer)`.
    pub fn toggle_reaction(
        &self,
        comment_id: &str,
        user_id: &str,
        kind: ReactionKind,
    ) -> (i64, bool) {
        use dashmap::mapref::entry::Entry;

        let key = (comment_id.to_string(), user_id.to_string());
        let liked = match self.reactions.entry(key) {
            Entry::Occupied(existing) if existing.get().kind == kind => {
                existing.remove();
                self.adjust_count(comment_id, -1);
                false
            }
            Entry::Occupied(mut existing) => {
                existing.get_mut().kind = kind;
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(Reaction {
                    comment_id: comment_id.to_string(),
                    user_id: user_id.to_string(),
                    kind,
                    created_at: Utc::now(),
                });
                self.adjust_count(comment_id, 1);
                true
            }
        };
        (self.like_count(comment_id), liked)
    }

    pub fn like_count(&self, comment_id: &str) -> i64 {
        self.reaction_counts
            .get(comment_id)
            .map(|c| *c)
            .unwrap_or(0)
    }

    pub fn liked_by(&self, comment_id: &str, user_id: &str) -> bool {
        self.reactions
            .contains_key(&(comment_id.to_string(), user_id.to_string()))
    }

    fn adjust_count(&self, comment_id: &str, delta: i64) {
        let mut count = self
            .reaction_counts
            .entry(comment_id.to_string())
            .or_insert(0);
        *count += delta;
    }
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_pair_stays_unique_across_kind_switches() {
        let store = ThreadStore::new();
        assert_eq!(store.toggle_reaction("c1", "u1", ReactionKind::Like), (1, true));
        // Switching kind keeps the count at one record per pair.
        assert_eq!(store.toggle_reaction("c1", "u1", ReactionKind::Love), (1, true));
        // Toggling the current kind removes the record.
        assert_eq!(store.toggle_reaction("c1", "u1", ReactionKind::Love), (0, false));
    }

    #[test]
    fn children_keep_creation_order() {
        let store = ThreadStore::new();
        for id in ["c1", "c2", "c3"] {
            store.insert_comment(CommentRecord {
                id: id.to_string(),
                story_id: "s1".to_string(),
                parent_id: None,
                author_id: "u1".to_string(),
                content: "hello".to_string(),
                depth: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        let ids: Vec<String> = store
            .ordered_children("s1", None)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
    }
}
