use crate::error::{AppError, AppResult};
use crate::models::{article, article_tag, tag, Article, ArticleModel, Tag, TagModel};
use crate::utils::slugify;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
};
use std::collections::HashMap;

pub const MAX_TAGS_PER_ARTICLE: usize = 5;
pub const MAX_TAG_LEN: usize = 30;

/// Trim, lowercase and dedupe tag names, preserving first-seen order.
/// Names that share a slug ("c++" and "c#") are the same tag; the first wins.
pub fn normalize_tag_names(names: &[String]) -> AppResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    let mut slugs: Vec<String> = Vec::new();
    for raw in names {
        let name = raw.trim().to_lowercase();
        if name.is_empty() || name.chars().count() > MAX_TAG_LEN {
            return Err(AppError::Validation(format!(
                "Tag '{}' must be 1-{} characters",
                raw.trim(),
                MAX_TAG_LEN
            )));
        }
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "Tag '{}' needs at least one letter or digit",
                name
            )));
        }
        if !slugs.contains(&slug) {
            slugs.push(slug);
            normalized.push(name);
        }
    }
    if normalized.len() > MAX_TAGS_PER_ARTICLE {
        return Err(AppError::Validation(format!(
            "At most {} tags per article",
            MAX_TAGS_PER_ARTICLE
        )));
    }
    Ok(normalized)
}

pub struct TagService {
    db: DatabaseConnection,
}

impl TagService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Get or create tags by (already normalized) name.
    pub async fn get_or_create_tags<C: ConnectionTrait>(
        conn: &C,
        names: &[String],
    ) -> AppResult<Vec<TagModel>> {
        let mut result = Vec::with_capacity(names.len());

        for name in names {
            let slug = slugify(name);
            let existing = Tag::find()
                .filter(tag::Column::Slug.eq(&slug))
                .one(conn)
                .await?;

            let tag = match existing {
                Some(tag) => tag,
                None => {
                    let now = chrono::Utc::now().naive_utc();
                    tag::ActiveModel {
                        name: Set(name.clone()),
                        slug: Set(slug),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(conn)
                    .await?
                }
            };
            result.push(tag);
        }

        Ok(result)
    }

    /// Replace an article's tag set.
    pub async fn set_article_tags<C: ConnectionTrait>(
        conn: &C,
        article_id: i32,
        names: &[String],
    ) -> AppResult<Vec<TagModel>> {
        let tags = Self::get_or_create_tags(conn, names).await?;

        article_tag::Entity::delete_many()
            .filter(article_tag::Column::ArticleId.eq(article_id))
            .exec(conn)
            .await?;

        for tag in &tags {
            article_tag::ActiveModel {
                article_id: Set(article_id),
                tag_id: Set(tag.id),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }

        Ok(tags)
    }

    /// Tag names for several articles in one query.
    pub async fn get_tags_for_articles(
        &self,
        article_ids: &[i32],
    ) -> AppResult<HashMap<i32, Vec<String>>> {
        if article_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<String> = (1..=article_ids.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "SELECT at.article_id, t.name \
                FROM article_tags at \
                INNER JOIN tags t ON t.id = at.tag_id \
                WHERE at.article_id IN ({}) \
                ORDER BY t.name",
            placeholders.join(", ")
        );
        let values: Vec<sea_orm::Value> = article_ids.iter().map(|&id| id.into()).collect();

        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                values,
            ))
            .await?;

        let mut map: HashMap<i32, Vec<String>> = HashMap::new();
        for row in rows {
            let article_id: i32 = row.try_get_by_index(0)?;
            let name: String = row.try_get_by_index(1)?;
            map.entry(article_id).or_default().push(name);
        }

        Ok(map)
    }

    pub async fn list_tags(&self) -> AppResult<Vec<TagModel>> {
        let tags = Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?;
        Ok(tags)
    }

    /// Published articles carrying a tag, newest first.
    pub async fn get_articles_by_tag(
        &self,
        tag_slug: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(TagModel, Vec<ArticleModel>, u64)> {
        let tag = Tag::find()
            .filter(tag::Column::Slug.eq(tag_slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let tagged = Query::select()
            .column(article_tag::Column::ArticleId)
            .from(article_tag::Entity)
            .and_where(article_tag::Column::TagId.eq(tag.id))
            .to_owned();

        let paginator = Article::published()
            .filter(article::Column::Id.in_subquery(tagged))
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((tag, articles, total))
    }
}
