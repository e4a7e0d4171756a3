use crate::{
    error::{AppError, AppResult},
    models::{article_like, Article, ArticleLike},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement,
    TransactionTrait,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub total_likes: i32,
}

pub struct LikeService {
    db: DatabaseConnection,
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add or remove the caller's like, then recount `total_likes`.
    pub async fn toggle(&self, article_id: i32, user_id: i32) -> AppResult<LikeState> {
        let article = Article::find_by_id(article_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if !article.is_published() {
            return Err(AppError::NotFound);
        }

        let txn = self.db.begin().await?;

        let existing = ArticleLike::find()
            .filter(article_like::Column::ArticleId.eq(article_id))
            .filter(article_like::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let liked = match existing {
            Some(like) => {
                ArticleLike::delete_by_id(like.id).exec(&txn).await?;
                false
            }
            None => {
                txn.execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "INSERT INTO article_likes (article_id, user_id, created_at)
                     VALUES ($1, $2, NOW())
                     ON CONFLICT (article_id, user_id) DO NOTHING",
                    [article_id.into(), user_id.into()],
                ))
                .await?;
                true
            }
        };

        let row = txn
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE articles
                 SET total_likes = (SELECT COUNT(*) FROM article_likes WHERE article_id = $1)
                 WHERE id = $1
                 RETURNING total_likes",
                [article_id.into()],
            ))
            .await?
            .ok_or(AppError::NotFound)?;
        let total_likes: i32 = row.try_get_by_index(0)?;

        txn.commit().await?;
        tracing::debug!(article_id, user_id, liked, total_likes, "article like toggled");

        Ok(LikeState { liked, total_likes })
    }

    pub async fn has_liked(&self, article_id: i32, user_id: i32) -> AppResult<bool> {
        let like = ArticleLike::find()
            .filter(article_like::Column::ArticleId.eq(article_id))
            .filter(article_like::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(like.is_some())
    }
}
