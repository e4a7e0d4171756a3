use crate::config::site::SiteConfig;
use crate::error::AppResult;
use crate::handlers::article::ArticleResponse;
use crate::models::TagModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::tag::TagService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    /// Tag ID
    pub id: i32,
    /// Tag name
    pub name: String,
    /// URL slug
    pub slug: String,
}

impl From<TagModel> for TagResponse {
    fn from(t: TagModel) -> Self {
        Self {
            id: t.id,
            name: t.name,
            slug: t.slug,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaggedArticlesResponse {
    pub tag: TagResponse,
    pub articles: PaginatedResponse<ArticleResponse>,
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    responses(
        (status = 200, description = "List all tags", body = Vec<TagResponse>),
    ),
    tag = "tags"
)]
pub async fn list_tags(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = TagService::new(db);
    let tags = service.list_tags().await?;
    let items: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/{slug}/articles",
    params(
        ("slug" = String, Path, description = "Tag slug"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Published articles with this tag", body = TaggedArticlesResponse),
        (status = 404, description = "Tag not found", body = crate::error::AppError),
    ),
    tag = "tags"
)]
pub async fn get_articles_by_tag(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = TagService::new(db);
    let (tag, articles, total) = service.get_articles_by_tag(&slug, page, per_page).await?;

    let ids: Vec<i32> = articles.iter().map(|a| a.id).collect();
    let mut tag_map = service.get_tags_for_articles(&ids).await?;
    let items: Vec<ArticleResponse> = articles
        .into_iter()
        .map(|a| {
            let tags = tag_map.remove(&a.id).unwrap_or_default();
            ArticleResponse::build(a, tags, &site)
        })
        .collect();

    Ok(ApiResponse::ok(TaggedArticlesResponse {
        tag: TagResponse::from(tag),
        articles: PaginatedResponse::new(items, total, page, per_page),
    }))
}
