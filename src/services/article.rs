use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{article, Article, ArticleModel, ArticleStatus, Section, TagModel},
    services::{cache::CacheService, sitemap, tag::TagService},
    utils::{slug::is_valid_slug, slugify},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, Statement, TransactionTrait,
};

/// Columns mapped by the article entity, for raw statements.
const ARTICLE_COLUMNS: &str = "a.id, a.user_id, a.section, a.title, a.slug, a.body, a.publish, \
    a.created_at, a.updated_at, a.edited, a.status, a.news_image, a.news_image_two, \
    a.news_image_three, a.news_image_four, a.caption, a.caption_two, a.caption_three, \
    a.caption_four, a.total_likes, a.hit_count";

/// Fields an author supplies when writing an article.
#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub section: Section,
    pub title: String,
    pub slug: Option<String>,
    pub body: String,
    pub publish: Option<NaiveDateTime>,
    pub news_image: String,
    pub news_image_two: Option<String>,
    pub news_image_three: Option<String>,
    pub news_image_four: Option<String>,
    pub caption: Option<String>,
    pub caption_two: Option<String>,
    pub caption_three: Option<String>,
    pub caption_four: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub section: Option<Section>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub publish: Option<NaiveDateTime>,
    pub news_image: Option<String>,
    pub news_image_two: Option<Option<String>>,
    pub news_image_three: Option<Option<String>>,
    pub news_image_four: Option<Option<String>>,
    pub caption: Option<Option<String>>,
    pub caption_two: Option<Option<String>>,
    pub caption_three: Option<Option<String>>,
    pub caption_four: Option<Option<String>>,
}

/// Explicit slug, or one derived from the title.
pub fn resolve_slug(title: &str, slug: Option<&str>) -> AppResult<String> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => {
            if !is_valid_slug(explicit) {
                return Err(AppError::Validation(
                    "Slug may only contain lowercase letters, digits and single hyphens".to_string(),
                ));
            }
            explicit.to_string()
        }
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Cannot derive a slug from the title, provide one".to_string(),
        ));
    }
    if slug.chars().count() > 250 {
        return Err(AppError::Validation(
            "Slug must be at most 250 characters".to_string(),
        ));
    }
    Ok(slug)
}

/// `[start, end)` of the calendar day containing `publish`.
pub fn publish_day_bounds(publish: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    day_bounds(publish.date())
}

fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(chrono::NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}

fn conflict_on_unique(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
            "An article with this slug was already published in this section that day".to_string(),
        ),
        _ => AppError::Database(err),
    }
}

pub struct ArticleService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl ArticleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn invalidate_sitemap(&self) {
        if let Some(cache) = &self.cache {
            sitemap::invalidate(cache).await;
        }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ArticleModel> {
        Article::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Published articles are public. Other statuses are visible to their
    /// author and to editors only.
    pub async fn get_visible(&self, id: i32, viewer: Option<&AuthUser>) -> AppResult<ArticleModel> {
        let article = self.get_by_id(id).await?;
        if article.is_published() {
            return Ok(article);
        }
        match viewer {
            Some(user) if user.user_id == article.user_id || user.is_editor() => Ok(article),
            _ => Err(AppError::NotFound),
        }
    }

    /// Public detail lookup by canonical path.
    pub async fn get_published_by_path(
        &self,
        section: Section,
        day: NaiveDate,
        slug: &str,
    ) -> AppResult<ArticleModel> {
        let (start, end) = day_bounds(day);
        Article::published()
            .filter(article::Column::Section.eq(section))
            .filter(article::Column::Slug.eq(slug))
            .filter(article::Column::Publish.gte(start))
            .filter(article::Column::Publish.lt(end))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list_section(
        &self,
        section: Section,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let paginator = Article::published()
            .filter(article::Column::Section.eq(section))
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((articles, total))
    }

    /// Most liked published articles, newest first among equals.
    pub async fn popular(&self, section: Option<Section>, limit: u64) -> AppResult<Vec<ArticleModel>> {
        let mut query = Article::find().filter(article::Column::Status.eq(ArticleStatus::Published));
        if let Some(section) = section {
            query = query.filter(article::Column::Section.eq(section));
        }
        let articles = query
            .order_by_desc(article::Column::TotalLikes)
            .order_by_desc(article::Column::Publish)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(articles)
    }

    /// Full-text search over published articles, best match first.
    pub async fn search(
        &self,
        query: &str,
        section: Option<Section>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        // Past any real result set; skip the round trip.
        let Some(offset) = page
            .saturating_sub(1)
            .checked_mul(per_page)
            .and_then(|o| i64::try_from(o).ok())
        else {
            return Ok((Vec::new(), 0));
        };

        let mut filter = "a.search_vector @@ plainto_tsquery('english', $1) AND a.status = 'PB'"
            .to_string();
        let mut values: Vec<sea_orm::Value> = vec![query.into()];
        if let Some(section) = section {
            values.push(section.slug().into());
            filter.push_str(&format!(" AND a.section = ${}", values.len()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM articles a WHERE {filter}");
        let count_row = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &count_sql,
                values.clone(),
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        let total: i64 = count_row.try_get_by_index(0)?;

        let search_sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a \
                WHERE {filter} \
                ORDER BY ts_rank(a.search_vector, plainto_tsquery('english', $1)) DESC, a.publish DESC \
                LIMIT ${} OFFSET ${}",
            values.len() + 1,
            values.len() + 2
        );
        values.push((per_page as i64).into());
        values.push(offset.into());

        let articles = ArticleModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &search_sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok((articles, total as u64))
    }

    /// The author's own drafts.
    pub async fn drafts(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let paginator = Article::drafts()
            .filter(article::Column::UserId.eq(user_id))
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((articles, total))
    }

    async fn ensure_slug_free<C: ConnectionTrait>(
        conn: &C,
        section: Section,
        slug: &str,
        publish: NaiveDateTime,
        exclude_id: Option<i32>,
    ) -> AppResult<()> {
        let (start, end) = publish_day_bounds(publish);
        let mut query = Article::find()
            .filter(article::Column::Section.eq(section))
            .filter(article::Column::Slug.eq(slug))
            .filter(article::Column::Publish.gte(start))
            .filter(article::Column::Publish.lt(end));
        if let Some(id) = exclude_id {
            query = query.filter(article::Column::Id.ne(id));
        }
        if query.count(conn).await? > 0 {
            return Err(AppError::Conflict(
                "An article with this slug was already published in this section that day"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// New articles always start as drafts.
    pub async fn create(
        &self,
        user_id: i32,
        input: ArticleInput,
        tags: &[String],
    ) -> AppResult<(ArticleModel, Vec<TagModel>)> {
        let slug = resolve_slug(&input.title, input.slug.as_deref())?;
        let now = chrono::Utc::now().naive_utc();
        let publish = input.publish.unwrap_or(now);

        let txn = self.db.begin().await?;
        Self::ensure_slug_free(&txn, input.section, &slug, publish, None).await?;

        let model = article::ActiveModel {
            user_id: Set(user_id),
            section: Set(input.section),
            title: Set(input.title),
            slug: Set(slug),
            body: Set(input.body),
            publish: Set(publish),
            created_at: Set(now),
            updated_at: Set(now),
            edited: Set(false),
            status: Set(ArticleStatus::Draft),
            news_image: Set(input.news_image),
            news_image_two: Set(input.news_image_two),
            news_image_three: Set(input.news_image_three),
            news_image_four: Set(input.news_image_four),
            caption: Set(input.caption),
            caption_two: Set(input.caption_two),
            caption_three: Set(input.caption_three),
            caption_four: Set(input.caption_four),
            total_likes: Set(0),
            hit_count: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(conflict_on_unique)?;

        let tags = TagService::set_article_tags(&txn, model.id, tags).await?;
        txn.commit().await?;

        tracing::info!(article_id = model.id, user_id, "created draft {}", model.slug);
        Ok((model, tags))
    }

    fn ensure_can_edit(article: &ArticleModel, actor: &AuthUser) -> AppResult<()> {
        if article.user_id == actor.user_id || actor.is_editor() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Apply an author or editor edit. Returns the new tag set when tags changed.
    pub async fn update(
        &self,
        id: i32,
        actor: &AuthUser,
        patch: ArticlePatch,
        tags: Option<&[String]>,
    ) -> AppResult<(ArticleModel, Option<Vec<TagModel>>)> {
        let existing = self.get_by_id(id).await?;
        Self::ensure_can_edit(&existing, actor)?;
        let was_published = existing.is_published();

        let section = patch.section.unwrap_or(existing.section);
        let title = patch.title.clone().unwrap_or_else(|| existing.title.clone());
        let publish = patch.publish.unwrap_or(existing.publish);
        let slug = match patch.slug.as_deref() {
            Some(raw) => resolve_slug(&title, Some(raw))?,
            None => existing.slug.clone(),
        };

        let txn = self.db.begin().await?;
        if section != existing.section || slug != existing.slug || publish != existing.publish {
            Self::ensure_slug_free(&txn, section, &slug, publish, Some(id)).await?;
        }

        let mut active: article::ActiveModel = existing.into();
        active.section = Set(section);
        active.title = Set(title);
        active.slug = Set(slug);
        active.publish = Set(publish);
        if let Some(body) = patch.body {
            active.body = Set(body);
        }
        if let Some(image) = patch.news_image {
            active.news_image = Set(image);
        }
        if let Some(v) = patch.news_image_two {
            active.news_image_two = Set(v);
        }
        if let Some(v) = patch.news_image_three {
            active.news_image_three = Set(v);
        }
        if let Some(v) = patch.news_image_four {
            active.news_image_four = Set(v);
        }
        if let Some(v) = patch.caption {
            active.caption = Set(v);
        }
        if let Some(v) = patch.caption_two {
            active.caption_two = Set(v);
        }
        if let Some(v) = patch.caption_three {
            active.caption_three = Set(v);
        }
        if let Some(v) = patch.caption_four {
            active.caption_four = Set(v);
        }
        active.edited = Set(true);
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&txn).await.map_err(conflict_on_unique)?;
        let tags = match tags {
            Some(names) => Some(TagService::set_article_tags(&txn, id, names).await?),
            None => None,
        };
        txn.commit().await?;

        if was_published || updated.is_published() {
            self.invalidate_sitemap().await;
        }
        Ok((updated, tags))
    }

    pub async fn delete(&self, id: i32, actor: &AuthUser) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        Self::ensure_can_edit(&existing, actor)?;
        let was_published = existing.is_published();

        Article::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(article_id = id, by = actor.user_id, "deleted article");

        if was_published {
            self.invalidate_sitemap().await;
        }
        Ok(())
    }

    /// Author hands a draft over to the editors.
    pub async fn submit(&self, id: i32, actor: &AuthUser) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != actor.user_id {
            return Err(AppError::Forbidden);
        }
        if existing.status != ArticleStatus::Draft {
            return Err(AppError::Conflict(
                "Only drafts can be submitted for review".to_string(),
            ));
        }

        let mut active: article::ActiveModel = existing.into();
        active.status = Set(ArticleStatus::Pending);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        tracing::info!(article_id = id, "article submitted for review");

        // Every status change clears cached sitemap pages.
        self.invalidate_sitemap().await;
        Ok(updated)
    }

    /// Editorial status change. Any transition is allowed.
    pub async fn set_status(&self, id: i32, status: ArticleStatus) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        if existing.status == status {
            return Ok(existing);
        }

        let mut active: article::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        tracing::info!(article_id = id, status = ?status, "article status changed");

        self.invalidate_sitemap().await;
        Ok(updated)
    }

    /// Atomic counter bump used by hit counting.
    pub async fn increment_hit_count<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<()> {
        Article::update_many()
            .col_expr(
                article::Column::HitCount,
                Expr::col(article::Column::HitCount).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
