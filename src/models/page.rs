use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};
use crate::models::comment::CommentNode;

/// 分页常量，客户端与服务端共用，双方用同一校验拒绝越界值
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

pub fn validate_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Addresses one independently paginated set of direct children: either the
/// top-level comments of a story, or the replies under a specific comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeId {
    Root,
    Node(String),
}

impl ScopeId {
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            ScopeId::Root => None,
            ScopeId::Node(id) => Some(id),
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Root => write!(f, "root"),
            ScopeId::Node(id) => write!(f, "{}", id),
        }
    }
}

/// One page of a scope's children. `next_cursor` is the id of the last item
/// returned; `None` means the scope is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildPage {
    pub items: Vec<CommentNode>,
    pub next_cursor: Option<String>,
    pub total_child_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounds_are_enforced() {
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }
}
