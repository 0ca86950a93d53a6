use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub author_id: String,
    pub neighborhood: String,
    pub category: StoryCategory,
    pub content: String,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoryCategory {
    DailyLife,
    Question,
    LocalNews,
    LostAndFound,
}

impl Default for StoryCategory {
    fn default() -> Self {
        Self::DailyLife
    }
}

impl StoryCategory {
    /// Question threads keep a plain "helpful" like; everything else
    /// supports the full emotion reaction set.
    pub fn supports_emotion_reactions(&self) -> bool {
        !matches!(self, Self::Question)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStoryRequest {
    #[validate(length(min = 1, max = 60))]
    pub neighborhood: String,
    pub category: Option<StoryCategory>,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}
