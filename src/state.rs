use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        comment::CommentService,
        store::ThreadStore,
        story::StoryService,
    },
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 内存数据存储
    pub store: Arc<ThreadStore>,

    /// 帖子服务
    pub story_service: StoryService,

    /// 评论服务
    pub comment_service: CommentService,
}

impl AppState {
    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
