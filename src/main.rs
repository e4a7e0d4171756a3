mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use config::{database::DatabaseConfig, jwt::JwtConfig};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::cache::CacheService;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::get_current_user,
        // Article routes
        crate::handlers::article::list_sections,
        crate::handlers::article::list_section_articles,
        crate::handlers::article::get_article_by_path,
        crate::handlers::article::get_article,
        crate::handlers::article::popular_articles,
        crate::handlers::article::search_articles,
        crate::handlers::article::create_article,
        crate::handlers::article::update_article,
        crate::handlers::article::delete_article,
        crate::handlers::article::submit_article,
        crate::handlers::article::set_article_status,
        crate::handlers::article::list_my_drafts,
        crate::handlers::article::toggle_like,
        crate::handlers::article::share_article,
        // Comment routes
        crate::handlers::comment::list_comments,
        crate::handlers::comment::list_replies,
        crate::handlers::comment::create_comment,
        crate::handlers::comment::update_comment,
        crate::handlers::comment::delete_comment,
        crate::handlers::comment::like_comment,
        crate::handlers::comment::dislike_comment,
        crate::handlers::comment::set_comment_active,
        // Tag routes
        crate::handlers::tag::list_tags,
        crate::handlers::tag::get_articles_by_tag,
        // Sitemap
        crate::handlers::sitemap::sitemap_xml,
        // Admin routes
        crate::handlers::admin::get_stats,
        crate::handlers::admin::list_users,
        crate::handlers::admin::update_user_role,
        crate::handlers::admin::delete_user,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::models::Section,
            crate::models::ArticleStatus,
            crate::models::ReactionKind,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            // Article
            crate::handlers::article::SectionResponse,
            crate::handlers::article::ImageResponse,
            crate::handlers::article::ArticleResponse,
            crate::handlers::article::CreateArticleRequest,
            crate::handlers::article::UpdateArticleRequest,
            crate::handlers::article::SetStatusRequest,
            crate::handlers::article::PopularQuery,
            crate::handlers::article::SearchQuery,
            crate::handlers::article::LikeResponse,
            crate::handlers::article::ShareRequest,
            crate::handlers::article::ShareResponse,
            // Comment
            crate::handlers::comment::CommentResponse,
            crate::handlers::comment::CommentTreeNode,
            crate::handlers::comment::CreateCommentRequest,
            crate::handlers::comment::UpdateCommentRequest,
            crate::handlers::comment::SetActiveRequest,
            crate::handlers::comment::ReactionResponse,
            // Tag
            crate::handlers::tag::TagResponse,
            crate::handlers::tag::TaggedArticlesResponse,
            // Admin
            crate::services::admin::AdminStats,
            crate::handlers::admin::AdminUserResponse,
            crate::handlers::admin::UpdateRoleRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "articles", description = "Article publishing, likes and sharing"),
        (name = "comments", description = "Threaded comments and reactions"),
        (name = "tags", description = "Tag browsing"),
        (name = "sitemap", description = "Search engine sitemap"),
        (name = "admin", description = "Administrative operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (jwt_config, db_config) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Newsroom API v{}...", env!("CARGO_PKG_VERSION"));

    let db = db_config.connect().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_admin::ensure_bootstrap_admin(&db).await?;

    // Redis is optional; the sitemap renders uncached without it
    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            Some(CacheService::new(conn))
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    let email_service = services::email::EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, article shares will not be mailed");
    }

    let site = config::site::SiteConfig::from_env();
    tracing::info!(site_url = %site.site_url, "site configured");

    let mut app = create_app()
        .layer(Extension(db))
        .layer(Extension(site))
        .layer(Extension(email_service));

    if let Some(cache) = cache {
        app = app.layer(Extension(cache));
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(JwtConfig, DatabaseConfig)> {
    Ok((JwtConfig::from_env()?, DatabaseConfig::from_env()?))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(
    Extension(db): Extension<DatabaseConnection>,
) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Newsroom API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
