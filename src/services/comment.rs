use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{comment, comment_reaction, Article, Comment, CommentModel, CommentReaction, ReactionKind, User},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use std::collections::HashMap;

/// Like and dislike tallies for one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// What a toggle does to a user's existing reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
    Switched,
}

/// Pressing the same button again clears it. Pressing the other one moves
/// the user across, so they never sit in both sets.
pub fn plan_reaction(current: Option<ReactionKind>, pressed: ReactionKind) -> ReactionChange {
    match current {
        None => ReactionChange::Added,
        Some(kind) if kind == pressed => ReactionChange::Removed,
        Some(_) => ReactionChange::Switched,
    }
}

/// Comment body and attached image URLs.
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub body: String,
    pub image_one: Option<String>,
    pub image_two: Option<String>,
}

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every active comment of an article, oldest first. Replies to inactive
    /// comments are still returned; the tree builder drops them.
    pub async fn list_active(&self, article_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Active top-level comments of an article.
    pub async fn active_roots(&self, article_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Active direct replies to a comment.
    pub async fn active_replies(&self, comment_id: i32) -> AppResult<Vec<CommentModel>> {
        let parent = self.get_by_id(comment_id).await?;
        if !parent.active {
            return Err(AppError::NotFound);
        }
        let comments = Comment::find()
            .filter(comment::Column::ParentId.eq(comment_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        article_id: i32,
        user_id: i32,
        parent_id: Option<i32>,
        input: CommentInput,
    ) -> AppResult<CommentModel> {
        let article = Article::find_by_id(article_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if !article.is_published() {
            return Err(AppError::NotFound);
        }

        if let Some(pid) = parent_id {
            self.validate_parent(pid, article_id).await?;
        }

        let author = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let now = chrono::Utc::now().naive_utc();
        let comment = comment::ActiveModel {
            article_id: Set(article_id),
            user_id: Set(user_id),
            email: Set(author.email),
            body: Set(input.body),
            image_one: Set(input.image_one),
            image_two: Set(input.image_two),
            created_at: Set(now),
            updated_at: Set(now),
            active: Set(true),
            parent_id: Set(parent_id),
            edited: Set(false),
            edited_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(comment_id = comment.id, article_id, user_id, "comment created");
        Ok(comment)
    }

    pub async fn update(&self, id: i32, user_id: i32, input: CommentInput) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: comment::ActiveModel = existing.into();
        active.body = Set(input.body);
        active.image_one = Set(input.image_one);
        active.image_two = Set(input.image_two);
        active.edited = Set(true);
        active.edited_at = Set(now);
        active.updated_at = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Replies go with their parent.
    pub async fn delete(&self, id: i32, actor: &AuthUser) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != actor.user_id && !actor.is_editor() {
            return Err(AppError::Forbidden);
        }

        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        let mut active: comment::ActiveModel = existing.into();
        active.active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        tracing::info!(comment_id = id, active = is_active, "comment moderated");
        Ok(updated)
    }

    /// Toggle a like or dislike. Returns the caller's resulting reaction and
    /// the fresh tallies.
    pub async fn react(
        &self,
        comment_id: i32,
        user_id: i32,
        pressed: ReactionKind,
    ) -> AppResult<(Option<ReactionKind>, ReactionCounts)> {
        let target = self.get_by_id(comment_id).await?;
        if !target.active {
            return Err(AppError::NotFound);
        }

        let txn = self.db.begin().await?;

        let existing = CommentReaction::find()
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let mine = match existing {
            Some(reaction) => match plan_reaction(Some(reaction.kind), pressed) {
                ReactionChange::Removed => {
                    CommentReaction::delete_by_id(reaction.id).exec(&txn).await?;
                    None
                }
                _ => {
                    let mut active: comment_reaction::ActiveModel = reaction.into();
                    active.kind = Set(pressed);
                    active.update(&txn).await?;
                    Some(pressed)
                }
            },
            None => {
                comment_reaction::ActiveModel {
                    comment_id: Set(comment_id),
                    user_id: Set(user_id),
                    kind: Set(pressed),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                Some(pressed)
            }
        };

        let counts = Self::counts_for(&txn, &[comment_id])
            .await?
            .remove(&comment_id)
            .unwrap_or_default();
        txn.commit().await?;

        Ok((mine, counts))
    }

    pub async fn reaction_counts(&self, comment_ids: &[i32]) -> AppResult<HashMap<i32, ReactionCounts>> {
        Self::counts_for(&self.db, comment_ids).await
    }

    async fn counts_for<C: ConnectionTrait>(
        conn: &C,
        comment_ids: &[i32],
    ) -> AppResult<HashMap<i32, ReactionCounts>> {
        if comment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders: Vec<String> = (1..=comment_ids.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "SELECT comment_id, \
                COUNT(*) FILTER (WHERE kind = 'like'), \
                COUNT(*) FILTER (WHERE kind = 'dislike') \
                FROM comment_reactions \
                WHERE comment_id IN ({}) \
                GROUP BY comment_id",
            placeholders.join(", ")
        );
        let values: Vec<sea_orm::Value> = comment_ids.iter().map(|&id| id.into()).collect();

        let rows = conn
            .query_all(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &sql,
                values,
            ))
            .await?;

        let mut map = HashMap::new();
        for row in rows {
            let id: i32 = row.try_get_by_index(0)?;
            let likes: i64 = row.try_get_by_index(1)?;
            let dislikes: i64 = row.try_get_by_index(2)?;
            map.insert(id, ReactionCounts { likes, dislikes });
        }
        Ok(map)
    }

    async fn validate_parent(&self, parent_id: i32, article_id: i32) -> AppResult<()> {
        let parent = Comment::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Validation("Parent comment not found".to_string()))?;

        if parent.article_id != article_id {
            return Err(AppError::Validation(
                "Parent comment belongs to a different article".to_string(),
            ));
        }
        if !parent.active {
            return Err(AppError::Validation(
                "Cannot reply to a hidden comment".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_toggles() {
        use ReactionKind::*;
        assert_eq!(plan_reaction(None, Like), ReactionChange::Added);
        assert_eq!(plan_reaction(Some(Like), Like), ReactionChange::Removed);
        assert_eq!(plan_reaction(Some(Like), Dislike), ReactionChange::Switched);
        assert_eq!(plan_reaction(Some(Dislike), Like), ReactionChange::Switched);
    }
}
