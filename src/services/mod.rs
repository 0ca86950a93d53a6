pub mod store;
pub mod story;
pub mod comment;

// 重新导出常用类型
pub use store::ThreadStore;
pub use story::StoryService;
pub use comment::CommentService;
