use axum::{
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;

/// 请求方身份
/// 会话解析由平台网关完成，本服务只消费网关注入的用户ID头
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

/// 身份中间件
/// 读取 `x-user-id` 头并注入请求扩展，缺失时请求继续作为匿名请求处理
pub async fn identity_middleware(mut request: Request<Body>, next: Next<Body>) -> Response {
    if let Some(user_id) = request
        .headers()
        .get("x-user-id")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        debug!("Resolved identity from gateway header: {}", user_id);
        let identity = Identity {
            id: user_id.to_string(),
        };
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start_time = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start_time.elapsed();

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        response.status().as_u16(),
        elapsed.as_millis()
    );

    response
}

/// 请求 ID 中间件
pub async fn request_id_middleware(mut request: Request<Body>, next: Next<Body>) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// 请求 ID 包装器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 可选身份提取器
pub struct OptionalIdentity(pub Option<Identity>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().cloned();
        Ok(OptionalIdentity(identity))
    }
}
