//! Crawler sitemap over every section's published articles.
//!
//! Sections are chained in `Section::ALL` order and each section keeps the
//! `-publish` order of its `published()` scope. Pages hold up to
//! [`SITEMAP_PAGE_SIZE`] entries.

use crate::{
    error::{AppError, AppResult},
    models::{article, Article, ArticleStatus, Section},
    services::cache::CacheService,
    utils::xml,
};
use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};

pub const SITEMAP_PAGE_SIZE: u64 = 50_000;
pub const CHANGEFREQ: &str = "weekly";
pub const PRIORITY: &str = "0.9";

const CACHE_PREFIX: &str = "sitemap:page:";

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct SitemapRow {
    pub id: i32,
    pub section: Section,
    pub slug: String,
    pub publish: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SitemapRow {
    pub fn path(&self) -> String {
        format!(
            "/{}/{}/{}/",
            self.section.slug(),
            self.publish.format("%Y/%m/%d"),
            self.slug
        )
    }
}

/// A rendered page, as served and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapPage {
    pub xml: String,
    pub last_modified: Option<NaiveDateTime>,
}

/// `CASE section WHEN 'crimes' THEN 0 ... END`, for ordering in SQL.
pub fn section_order_sql() -> String {
    let arms: String = Section::ALL
        .iter()
        .map(|s| format!(" WHEN '{}' THEN {}", s.slug(), s.ordinal()))
        .collect();
    format!("CASE section{} ELSE {} END", arms, Section::ALL.len())
}

/// Offset of a 1-based page, or `None` when the page does not exist.
/// The first page always exists, even when empty.
pub fn page_offset(total: u64, page: u64) -> Option<u64> {
    if page == 0 {
        return None;
    }
    let offset = (page - 1).checked_mul(SITEMAP_PAGE_SIZE)?;
    if page > 1 && offset >= total {
        return None;
    }
    Some(offset)
}

/// W3C datetime in UTC.
pub fn w3c_datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// RFC 7231 date for the `Last-Modified` header.
pub fn http_date(at: NaiveDateTime) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn render_urlset(site_url: &str, rows: &[SitemapRow]) -> String {
    let mut out = String::with_capacity(128 + rows.len() * 200);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for row in rows {
        out.push_str("<url>");
        out.push_str("<loc>");
        out.push_str(&xml::escape(&format!("{}{}", site_url, row.path())));
        out.push_str("</loc>");
        out.push_str("<lastmod>");
        out.push_str(&w3c_datetime(row.updated_at));
        out.push_str("</lastmod>");
        out.push_str("<changefreq>");
        out.push_str(CHANGEFREQ);
        out.push_str("</changefreq>");
        out.push_str("<priority>");
        out.push_str(PRIORITY);
        out.push_str("</priority>");
        out.push_str("</url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

pub async fn invalidate(cache: &CacheService) {
    cache.invalidate_pattern(&format!("{CACHE_PREFIX}*")).await;
}

pub struct SitemapService {
    db: DatabaseConnection,
    site_url: String,
    cache: Option<CacheService>,
    cache_ttl: u64,
}

impl SitemapService {
    pub fn new(db: DatabaseConnection, site_url: &str) -> Self {
        Self {
            db,
            site_url: site_url.to_string(),
            cache: None,
            cache_ttl: 3600,
        }
    }

    pub fn with_cache(mut self, cache: CacheService, ttl_secs: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl_secs;
        self
    }

    pub async fn page(&self, page: u64) -> AppResult<SitemapPage> {
        let key = format!("{CACHE_PREFIX}{page}");
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<SitemapPage>(&key).await {
                return Ok(cached);
            }
        }

        let rows = self.fetch_page(page).await?;
        let rendered = SitemapPage {
            xml: render_urlset(&self.site_url, &rows),
            last_modified: rows.iter().map(|r| r.updated_at).max(),
        };

        if let Some(cache) = &self.cache {
            cache.set(&key, &rendered, self.cache_ttl).await;
        }
        Ok(rendered)
    }

    async fn fetch_page(&self, page: u64) -> AppResult<Vec<SitemapRow>> {
        let total = Article::published().count(&self.db).await?;
        let offset = page_offset(total, page).ok_or(AppError::NotFound)?;

        let rows = ordered_rows()
            .offset(offset)
            .limit(SITEMAP_PAGE_SIZE)
            .into_model::<SitemapRow>()
            .all(&self.db)
            .await?;

        Ok(rows)
    }
}

/// Published articles, sections chained in `Section::ALL` order.
fn ordered_rows() -> Select<Article> {
    Article::find()
        .select_only()
        .column(article::Column::Id)
        .column(article::Column::Section)
        .column(article::Column::Slug)
        .column(article::Column::Publish)
        .column(article::Column::UpdatedAt)
        .filter(article::Column::Status.eq(ArticleStatus::Published))
        .order_by(Expr::cust(section_order_sql()), Order::Asc)
        .order_by_desc(article::Column::Publish)
        .order_by_desc(article::Column::Id)
}
