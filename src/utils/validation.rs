use crate::error::{AppError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// 验证小区/街道名称格式
pub fn validate_neighborhood(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Neighborhood must not be empty".to_string()));
    }

    if name.len() > 60 {
        return Err(AppError::Validation("Neighborhood name is too long".to_string()));
    }

    static NEIGHBORHOOD_RE: OnceLock<Regex> = OnceLock::new();
    let pattern = NEIGHBORHOOD_RE.get_or_init(|| {
        // 字母、数字、空格、连字符和撇号
        Regex::new(r"^[\p{L}\p{N} '\-]+$").unwrap()
    });

    if !pattern.is_match(name) {
        return Err(AppError::Validation(
            "Neighborhood may only contain letters, digits, spaces, hyphens and apostrophes".to_string(),
        ));
    }

    Ok(())
}

/// 评论内容校验：空串保留为墓碑标记，不允许用户提交
pub fn validate_comment_content(content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(AppError::Validation("Comment must not be empty".to_string()));
    }
    if content.trim().is_empty() {
        return Err(AppError::Validation("Comment must not be only whitespace".to_string()));
    }
    Ok(())
}
