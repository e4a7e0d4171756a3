use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    Router::new()
        .nest("/api/v1", api_routes(&rate_limit_config))
        .merge(crawler_routes(&rate_limit_config))
}

fn api_routes(config: &RateLimitConfig) -> Router {
    let auth = auth_routes(config);
    let public_read =
        public_read_routes(config).layer(middleware::from_fn(optional_auth_middleware));
    let protected = protected_routes(config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Sitemap for search engines, served outside the API prefix.
fn crawler_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route("/sitemap.xml", routing::get(handlers::sitemap::sitemap_xml));

    with_optional_rate_limit(router, config.enabled, config.crawler)
}

/// Auth routes: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes. A valid token is picked up when present so authors
/// can read their own unpublished articles.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Sections
        .route("/sections", routing::get(handlers::article::list_sections))
        .route(
            "/sections/{section}/articles",
            routing::get(handlers::article::list_section_articles),
        )
        .route(
            "/sections/{section}/{year}/{month}/{day}/{slug}",
            routing::get(handlers::article::get_article_by_path),
        )
        // Articles
        .route(
            "/articles/popular",
            routing::get(handlers::article::popular_articles),
        )
        .route("/articles/{id}", routing::get(handlers::article::get_article))
        .route("/search", routing::get(handlers::article::search_articles))
        // Comments
        .route(
            "/articles/{id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        .route(
            "/comments/{id}/replies",
            routing::get(handlers::comment::list_replies),
        )
        // Tags
        .route("/tags", routing::get(handlers::tag::list_tags))
        .route(
            "/tags/{slug}/articles",
            routing::get(handlers::tag::get_articles_by_tag),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: everything that needs a signed-in caller.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Articles
        .route("/articles", routing::post(handlers::article::create_article))
        .route(
            "/articles/drafts",
            routing::get(handlers::article::list_my_drafts),
        )
        .route(
            "/articles/{id}",
            routing::put(handlers::article::update_article)
                .delete(handlers::article::delete_article),
        )
        .route(
            "/articles/{id}/submit",
            routing::post(handlers::article::submit_article),
        )
        .route(
            "/articles/{id}/status",
            routing::put(handlers::article::set_article_status),
        )
        .route(
            "/articles/{id}/like",
            routing::post(handlers::article::toggle_like),
        )
        .route(
            "/articles/{id}/share",
            routing::post(handlers::article::share_article),
        )
        // Comments
        .route(
            "/articles/{id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route(
            "/comments/{id}/like",
            routing::post(handlers::comment::like_comment),
        )
        .route(
            "/comments/{id}/dislike",
            routing::post(handlers::comment::dislike_comment),
        )
        .route(
            "/comments/{id}/active",
            routing::put(handlers::comment::set_comment_active),
        )
        // Admin
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/users/{id}",
            routing::delete(handlers::admin::delete_user),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "invalid rate limit rule, serving without a limiter");
            router
        }
    }
}
