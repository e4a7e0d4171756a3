use crate::{
    error::{AppError, AppResult},
    models::{article, user, Article, ArticleStatus, Comment, User, UserModel},
    services::{cache::CacheService, sitemap},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use utoipa::ToSchema;

pub const VALID_ROLES: [&str; 3] = [user::ROLE_READER, user::ROLE_EDITOR, user::ROLE_ADMIN];

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub total_users: u64,
    pub drafts: u64,
    pub pending: u64,
    pub published: u64,
    pub total_comments: u64,
    pub hidden_comments: u64,
}

pub struct AdminService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn get_stats(&self) -> AppResult<AdminStats> {
        let total_users = User::find().count(&self.db).await?;
        let drafts = self.count_status(ArticleStatus::Draft).await?;
        let pending = self.count_status(ArticleStatus::Pending).await?;
        let published = self.count_status(ArticleStatus::Published).await?;

        let total_comments = Comment::find().count(&self.db).await?;
        let hidden_comments = Comment::find()
            .filter(crate::models::comment::Column::Active.eq(false))
            .count(&self.db)
            .await?;

        Ok(AdminStats {
            total_users,
            drafts,
            pending,
            published,
            total_comments,
            hidden_comments,
        })
    }

    async fn count_status(&self, status: ArticleStatus) -> AppResult<u64> {
        let count = Article::find()
            .filter(article::Column::Status.eq(status))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn list_users(&self, page: u64, per_page: u64) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    pub async fn update_user_role(&self, user_id: i32, role: &str) -> AppResult<UserModel> {
        if !VALID_ROLES.contains(&role) {
            return Err(AppError::Validation(format!(
                "Invalid role. Must be one of: {}",
                VALID_ROLES.join(", ")
            )));
        }

        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role.to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        tracing::info!(user_id, role, "user role changed");
        Ok(updated)
    }

    /// Removes the account with its articles, comments, likes and reactions.
    pub async fn delete_user(&self, user_id: i32, acting_admin: i32) -> AppResult<()> {
        if user_id == acting_admin {
            return Err(AppError::Validation(
                "Admins cannot delete their own account".to_string(),
            ));
        }

        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let had_published = Article::published()
            .filter(article::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?
            > 0;

        User::delete_by_id(user_id).exec(&self.db).await?;
        tracing::info!(user_id, by = acting_admin, "user deleted");

        if had_published {
            if let Some(cache) = &self.cache {
                sitemap::invalidate(cache).await;
            }
        }
        Ok(())
    }
}
