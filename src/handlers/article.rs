use crate::config::site::SiteConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_editor;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{ArticleModel, ArticleStatus, Section};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::article::{ArticleInput, ArticlePatch, ArticleService};
use crate::services::cache::CacheService;
use crate::services::email::{EmailService, ShareMessage};
use crate::services::hit::{client_ip, HitService};
use crate::services::like::LikeService;
use crate::services::tag::{normalize_tag_names, TagService};
use crate::utils::richtext::{excerpt, render_rich_text};
use axum::{
    extract::{ConnectInfo, Path, Query},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use utoipa::ToSchema;
use validator::{Validate, ValidateUrl};

const POPULAR_LIMIT: u64 = 10;
const EXCERPT_CHARS: usize = 280;

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionResponse {
    pub slug: String,
    pub name: String,
    pub comment_label: String,
}

impl From<Section> for SectionResponse {
    fn from(s: Section) -> Self {
        Self {
            slug: s.slug(),
            name: s.display_name().to_string(),
            comment_label: s.comment_label(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleResponse {
    pub id: i32,
    pub user_id: i32,
    pub section: Section,
    pub section_name: String,
    /// Label for this article's comments, e.g. "Health Article Comment"
    pub comment_label: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub body_html: String,
    pub excerpt: String,
    pub url: String,
    pub images: Vec<ImageResponse>,
    pub status: ArticleStatus,
    pub publish: String,
    pub created_at: String,
    pub updated_at: String,
    pub edited: bool,
    pub total_likes: i32,
    pub hit_count: i32,
    pub tags: Vec<String>,
    /// Whether the signed-in caller likes this article. Absent for anonymous readers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl ArticleResponse {
    pub fn build(a: ArticleModel, tags: Vec<String>, site: &SiteConfig) -> Self {
        let body_html = render_rich_text(&a.body);
        let url = site.absolute_url(&a.absolute_path());
        let images = a
            .images()
            .into_iter()
            .map(|(url, caption)| ImageResponse { url, caption })
            .collect();
        Self {
            id: a.id,
            user_id: a.user_id,
            section: a.section,
            section_name: a.section.display_name().to_string(),
            comment_label: a.section.comment_label(),
            excerpt: excerpt(&a.body, EXCERPT_CHARS),
            title: a.title,
            slug: a.slug,
            body: a.body,
            body_html,
            url,
            images,
            status: a.status,
            publish: a.publish.to_string(),
            created_at: a.created_at.to_string(),
            updated_at: a.updated_at.to_string(),
            edited: a.edited,
            total_likes: a.total_likes,
            hit_count: a.hit_count,
            tags,
            liked: None,
        }
    }
}

/// Attach tag names to a page of articles with a single batch query.
async fn with_tags(
    db: &DatabaseConnection,
    articles: Vec<ArticleModel>,
    site: &SiteConfig,
) -> AppResult<Vec<ArticleResponse>> {
    let ids: Vec<i32> = articles.iter().map(|a| a.id).collect();
    let mut tag_map: HashMap<i32, Vec<String>> = TagService::new(db.clone())
        .get_tags_for_articles(&ids)
        .await?;
    Ok(articles
        .into_iter()
        .map(|a| {
            let tags = tag_map.remove(&a.id).unwrap_or_default();
            ArticleResponse::build(a, tags, site)
        })
        .collect())
}

async fn one_with_tags(
    db: &DatabaseConnection,
    article: ArticleModel,
    site: &SiteConfig,
) -> AppResult<ArticleResponse> {
    let mut items = with_tags(db, vec![article], site).await?;
    items.pop().ok_or(AppError::NotFound)
}

/// Detail views tell a signed-in reader whether they already like the article.
async fn detail_response(
    db: &DatabaseConnection,
    article: ArticleModel,
    site: &SiteConfig,
    viewer: Option<&AuthUser>,
) -> AppResult<ArticleResponse> {
    let liked = match viewer {
        Some(v) => Some(LikeService::new(db.clone()).has_liked(article.id, v.user_id).await?),
        None => None,
    };
    let mut response = one_with_tags(db, article, site).await?;
    response.liked = liked;
    Ok(response)
}

fn parse_section(slug: &str) -> AppResult<Section> {
    Section::from_slug(slug).ok_or(AppError::NotFound)
}

fn make_article_service(db: DatabaseConnection, cache: Option<CacheService>) -> ArticleService {
    let service = ArticleService::new(db);
    match cache {
        Some(c) => service.with_cache(c),
        None => service,
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    pub section: Section,
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    /// Derived from the title when omitted
    #[validate(length(max = 250))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
    /// Defaults to now
    pub publish: Option<NaiveDateTime>,
    #[validate(url)]
    pub news_image: String,
    #[validate(url)]
    pub news_image_two: Option<String>,
    #[validate(url)]
    pub news_image_three: Option<String>,
    #[validate(url)]
    pub news_image_four: Option<String>,
    #[validate(length(max = 300))]
    pub caption: Option<String>,
    #[validate(length(max = 300))]
    pub caption_two: Option<String>,
    #[validate(length(max = 300))]
    pub caption_three: Option<String>,
    #[validate(length(max = 300))]
    pub caption_four: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleRequest {
    pub section: Option<Section>,
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 250))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub publish: Option<NaiveDateTime>,
    #[validate(url)]
    pub news_image: Option<String>,
    /// Empty string removes the image
    pub news_image_two: Option<String>,
    pub news_image_three: Option<String>,
    pub news_image_four: Option<String>,
    #[validate(length(max = 300))]
    pub caption: Option<String>,
    #[validate(length(max = 300))]
    pub caption_two: Option<String>,
    #[validate(length(max = 300))]
    pub caption_three: Option<String>,
    #[validate(length(max = 300))]
    pub caption_four: Option<String>,
    /// Replaces the tag set when present
    pub tags: Option<Vec<String>>,
}

impl UpdateArticleRequest {
    /// Optional image slots accept a URL or an empty string.
    fn check_image_slots(&self) -> AppResult<()> {
        let slots = [
            &self.news_image_two,
            &self.news_image_three,
            &self.news_image_four,
        ];
        for url in slots.into_iter().flatten() {
            if !url.trim().is_empty() && !url.validate_url() {
                return Err(AppError::Validation(format!("Invalid image URL: {url}")));
            }
        }
        Ok(())
    }

    /// Optional image and caption slots are set when present. An empty string clears them.
    fn into_patch(self) -> ArticlePatch {
        fn slot(v: Option<String>) -> Option<Option<String>> {
            v.map(|s| if s.trim().is_empty() { None } else { Some(s) })
        }
        ArticlePatch {
            section: self.section,
            title: self.title,
            slug: self.slug,
            body: self.body,
            publish: self.publish,
            news_image: self.news_image,
            news_image_two: slot(self.news_image_two),
            news_image_three: slot(self.news_image_three),
            news_image_four: slot(self.news_image_four),
            caption: slot(self.caption),
            caption_two: slot(self.caption_two),
            caption_three: slot(self.caption_three),
            caption_four: slot(self.caption_four),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: ArticleStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PopularQuery {
    /// Restrict to one section
    pub section: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    /// Search terms
    pub q: String,
    pub section: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    pub total_likes: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShareRequest {
    /// Sender name shown in the email. Defaults to the username.
    #[validate(length(min = 1, max = 25))]
    pub name: Option<String>,
    /// Recipient address
    #[validate(email)]
    pub to: String,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShareResponse {
    /// False when outgoing mail is not configured
    pub sent: bool,
    pub to: String,
    pub subject: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/sections",
    responses((status = 200, description = "All sections in sitemap order", body = Vec<SectionResponse>)),
    tag = "articles"
)]
pub async fn list_sections() -> impl IntoResponse {
    let items: Vec<SectionResponse> = Section::ALL.into_iter().map(SectionResponse::from).collect();
    ApiResponse::ok(items)
}

#[utoipa::path(
    get,
    path = "/api/v1/sections/{section}/articles",
    params(
        ("section" = String, Path, description = "Section slug"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Published articles, newest first", body = PaginatedResponse<ArticleResponse>),
        (status = 404, description = "Unknown section", body = AppError),
    ),
    tag = "articles"
)]
pub async fn list_section_articles(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Path(section): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let section = parse_section(&section)?;
    let (page, per_page) = params.resolve();

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.list_section(section, page, per_page).await?;
    let items = with_tags(&db, articles, &site).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(items, total, page, per_page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sections/{section}/{year}/{month}/{day}/{slug}",
    params(
        ("section" = String, Path, description = "Section slug"),
        ("year" = i32, Path, description = "Publish year"),
        ("month" = u32, Path, description = "Publish month"),
        ("day" = u32, Path, description = "Publish day"),
        ("slug" = String, Path, description = "Article slug"),
    ),
    responses(
        (status = 200, description = "Published article", body = ArticleResponse),
        (status = 404, description = "Not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn get_article_by_path(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path((section, year, month, day, slug)): Path<(String, i32, u32, u32, String)>,
) -> AppResult<impl IntoResponse> {
    let section = parse_section(&section)?;
    let day = NaiveDate::from_ymd_opt(year, month, day).ok_or(AppError::NotFound)?;

    let service = ArticleService::new(db.clone());
    let mut article = service.get_published_by_path(section, day, &slug).await?;

    let ip = client_ip(&headers, addr.ip(), site.trust_forwarded_for);
    let hits = HitService::new(db.clone(), &site);
    match hits
        .record(&article, ip, viewer.as_ref().map(|v| v.user_id))
        .await
    {
        Ok(true) => article.hit_count += 1,
        Ok(false) => {}
        Err(e) => tracing::warn!(article_id = article.id, "hit not recorded: {e}"),
    }

    Ok(ApiResponse::ok(
        detail_response(&db, article, &site, viewer.as_ref()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/{id}",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Not found or not visible", body = AppError),
    ),
    tag = "articles"
)]
pub async fn get_article(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ArticleService::new(db.clone());
    let article = service.get_visible(id, viewer.as_ref()).await?;
    Ok(ApiResponse::ok(
        detail_response(&db, article, &site, viewer.as_ref()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/popular",
    params(("section" = Option<String>, Query, description = "Section slug")),
    responses(
        (status = 200, description = "Most liked published articles", body = Vec<ArticleResponse>),
        (status = 404, description = "Unknown section", body = AppError),
    ),
    tag = "articles"
)]
pub async fn popular_articles(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Query(params): Query<PopularQuery>,
) -> AppResult<impl IntoResponse> {
    let section = params.section.as_deref().map(parse_section).transpose()?;
    let service = ArticleService::new(db.clone());
    let articles = service.popular(section, POPULAR_LIMIT).await?;
    Ok(ApiResponse::ok(with_tags(&db, articles, &site).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/search",
    params(
        ("q" = String, Query, description = "Search terms"),
        ("section" = Option<String>, Query, description = "Section slug"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Ranked matches", body = PaginatedResponse<ArticleResponse>),
        (status = 400, description = "Empty query", body = AppError),
    ),
    tag = "articles"
)]
pub async fn search_articles(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(AppError::Validation("Search query must not be empty".to_string()));
    }
    let section = params.section.as_deref().map(parse_section).transpose()?;
    let (page, per_page) = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    }
    .resolve();

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.search(q, section, page, per_page).await?;
    let items = with_tags(&db, articles, &site).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(items, total, page, per_page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles",
    security(("jwt_token" = [])),
    request_body = CreateArticleRequest,
    responses(
        (status = 200, description = "Draft created", body = ArticleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Slug already used that day", body = AppError),
    ),
    tag = "articles"
)]
pub async fn create_article(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    auth_user: AuthUser,
    Json(payload): Json<CreateArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let tags = normalize_tag_names(&payload.tags)?;

    let input = ArticleInput {
        section: payload.section,
        title: payload.title,
        slug: payload.slug,
        body: payload.body,
        publish: payload.publish,
        news_image: payload.news_image,
        news_image_two: payload.news_image_two,
        news_image_three: payload.news_image_three,
        news_image_four: payload.news_image_four,
        caption: payload.caption,
        caption_two: payload.caption_two,
        caption_three: payload.caption_three,
        caption_four: payload.caption_four,
    };

    let service = ArticleService::new(db);
    let (article, tags) = service.create(auth_user.user_id, input, &tags).await?;
    let tags = tags.into_iter().map(|t| t.name).collect();

    Ok(ApiResponse::ok(ArticleResponse::build(article, tags, &site)))
}

#[utoipa::path(
    put,
    path = "/api/v1/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 403, description = "Not the author or an editor", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Slug already used that day", body = AppError),
    ),
    tag = "articles"
)]
pub async fn update_article(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    payload.check_image_slots()?;
    let tags = payload
        .tags
        .as_deref()
        .map(normalize_tag_names)
        .transpose()?;

    let service = make_article_service(db.clone(), cache.map(|c| c.0));
    let (article, new_tags) = service
        .update(id, &auth_user, payload.into_patch(), tags.as_deref())
        .await?;

    let response = match new_tags {
        Some(tags) => {
            let names = tags.into_iter().map(|t| t.name).collect();
            ArticleResponse::build(article, names, &site)
        }
        None => one_with_tags(&db, article, &site).await?,
    };
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    delete,
    path = "/api/v1/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = String),
        (status = 403, description = "Not the author or an editor", body = AppError),
        (status = 404, description = "Not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn delete_article(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = make_article_service(db, cache.map(|c| c.0));
    service.delete(id, &auth_user).await?;
    Ok(ApiResponse::ok("Article deleted"))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles/{id}/submit",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Draft submitted for review", body = ArticleResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 409, description = "Article is not a draft", body = AppError),
    ),
    tag = "articles"
)]
pub async fn submit_article(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ArticleService::new(db.clone());
    let article = service.submit(id, &auth_user).await?;
    Ok(ApiResponse::ok(one_with_tags(&db, article, &site).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/articles/{id}/status",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ArticleResponse),
        (status = 403, description = "Editors only", body = AppError),
        (status = 404, description = "Not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn set_article_status(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<SetStatusRequest>,
) -> AppResult<impl IntoResponse> {
    require_editor(&auth_user)?;

    let service = make_article_service(db.clone(), cache.map(|c| c.0));
    let article = service.set_status(id, payload.status).await?;
    Ok(ApiResponse::ok(one_with_tags(&db, article, &site).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/drafts",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The caller's drafts", body = PaginatedResponse<ArticleResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "articles"
)]
pub async fn list_my_drafts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let service = ArticleService::new(db.clone());
    let (articles, total) = service.drafts(auth_user.user_id, page, per_page).await?;
    let items = with_tags(&db, articles, &site).await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(items, total, page, per_page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Not found or not published", body = AppError),
    ),
    tag = "articles"
)]
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db);
    let state = service.toggle(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(LikeResponse {
        liked: state.liked,
        total_likes: state.total_likes,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles/{id}/share",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Share accepted", body = ShareResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Not found or not published", body = AppError),
        (status = 502, description = "Mail server rejected the message", body = AppError),
    ),
    tag = "articles"
)]
pub async fn share_article(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ShareRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = ArticleService::new(db.clone()).get_by_id(id).await?;
    if !article.is_published() {
        return Err(AppError::NotFound);
    }
    let sender = crate::services::auth::AuthService::new(db)
        .get_user_by_id(auth_user.user_id)
        .await?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(sender.username.as_str());
    let message = ShareMessage::new(
        name,
        &article.title,
        &site.absolute_url(&article.absolute_path()),
        payload.comments.as_deref().unwrap_or(""),
    );

    let sent = email_service
        .send_share(&payload.to, Some(&sender.email), &message)
        .await
        .map_err(|e| AppError::Email(e.to_string()))?;
    tracing::info!(article_id = id, sent, "article shared by email");

    Ok(ApiResponse::ok(ShareResponse {
        sent,
        to: payload.to,
        subject: message.subject,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_maps_empty_strings_to_clear() {
        let patch = UpdateArticleRequest {
            caption_two: Some("  ".to_string()),
            news_image_three: Some("https://cdn.example.com/x.jpg".to_string()),
            ..Default::default()
        }
        .into_patch();
        assert_eq!(patch.caption_two, Some(None));
        assert_eq!(
            patch.news_image_three,
            Some(Some("https://cdn.example.com/x.jpg".to_string()))
        );
        assert_eq!(patch.caption, None);
    }

    #[test]
    fn image_slots_accept_url_or_empty() {
        let ok = UpdateArticleRequest {
            news_image_two: Some(String::new()),
            news_image_four: Some("https://cdn.example.com/d.jpg".to_string()),
            ..Default::default()
        };
        assert!(ok.check_image_slots().is_ok());

        let bad = UpdateArticleRequest {
            news_image_three: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(bad.check_image_slots().is_err());
    }

    #[test]
    fn section_response_labels() {
        let s = SectionResponse::from(Section::SportArticles);
        assert_eq!(s.slug, "sport-articles");
        assert_eq!(s.comment_label, "Sport Article Comment");
    }
}
