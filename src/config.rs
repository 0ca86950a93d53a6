use serde::{Deserialize, Serialize};
use std::env;

use crate::models::page::DEFAULT_PAGE_SIZE;

/// 回复列表的排序方向，由服务端配置决定，客户端游标语义与其无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Content settings
    pub max_story_length: usize,
    pub max_comment_length: usize,
    pub default_replies_per_page: usize,
    pub comment_order: CommentOrder,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            max_story_length: env::var("MAX_STORY_LENGTH")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            default_replies_per_page: env::var("DEFAULT_REPLIES_PER_PAGE")
                .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                .parse()?,
            comment_order: match env::var("COMMENT_ORDER")
                .unwrap_or_else(|_| "oldest_first".to_string())
                .as_str()
            {
                "newest_first" => CommentOrder::NewestFirst,
                _ => CommentOrder::OldestFirst,
            },

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            max_story_length: 10000,
            max_comment_length: 2000,
            default_replies_per_page: DEFAULT_PAGE_SIZE,
            comment_order: CommentOrder::OldestFirst,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
