use std::sync::Arc;
use axum::{
    routing::{Router, get},
    http::{Method, HeaderValue},
};
use tower_http::{
    cors::{CorsLayer, Any},
    compression::CompressionLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::info;

use agora_stories::{
    config::Config,
    routes,
    services::{CommentService, StoryService, ThreadStore},
    state::AppState,
    utils::middleware::{identity_middleware, request_id_middleware, request_logging_middleware},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "agora_stories=debug,tower_http=debug".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Agora-Stories service...");

    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化内存存储与服务
    let store = Arc::new(ThreadStore::new());
    let story_service = StoryService::new(store.clone(), config.clone()).await?;
    let comment_service = CommentService::new(store.clone(), config.clone()).await?;

    // 创建应用状态
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        story_service,
        comment_service,
    });

    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(
            config.cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    // 构建应用路由 - 使用/api/前缀与平台网关保持一致
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/stories", routes::stories::router())
        .nest("/api/comments", routes::comments::router())
        .layer(axum::middleware::from_fn(identity_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Agora-Stories is running!"
}
