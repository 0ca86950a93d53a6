pub mod comment;
pub mod page;
pub mod story;

// 重新导出常用类型
pub use comment::{CommentNode, Reaction, ReactionKind, ReactionSummary};
pub use page::{ChildPage, ScopeId};
pub use story::{Story, StoryCategory};
