use crate::config::site::SiteConfig;
use crate::error::{AppError, AppResult};
use crate::services::cache::CacheService;
use crate::services::sitemap::{http_date, SitemapService};
use axum::{
    extract::Query,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SitemapQuery {
    /// 1-based page number
    pub p: Option<String>,
}

/// Missing means the first page. Anything that is not a positive integer is
/// treated as a page that does not exist.
fn parse_page(raw: Option<&str>) -> AppResult<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(s) => s
            .parse::<u64>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or(AppError::NotFound),
    }
}

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    params(SitemapQuery),
    responses(
        (status = 200, description = "sitemaps.org urlset", content_type = "application/xml", body = String),
        (status = 404, description = "Page out of range", body = AppError),
    ),
    tag = "sitemap"
)]
pub async fn sitemap_xml(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
    cache: Option<Extension<CacheService>>,
    Query(query): Query<SitemapQuery>,
) -> AppResult<Response> {
    let page = parse_page(query.p.as_deref())?;

    let mut service = SitemapService::new(db, &site.site_url);
    if let Some(Extension(cache)) = cache {
        service = service.with_cache(cache, site.sitemap_cache_ttl);
    }
    let rendered = service.page(page).await?;

    let mut response = (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        rendered.xml,
    )
        .into_response();
    if let Some(at) = rendered.last_modified {
        if let Ok(value) = http_date(at).parse() {
            response.headers_mut().insert(header::LAST_MODIFIED, value);
        }
    }
    Ok(response)
}
