use crate::config::env::parse_bool_env;
use crate::error::AppResult;
use crate::models::{user, User};
use crate::utils::hash_password;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// 启动时自动创建/提升管理员：
/// - 若库中已存在任意 admin：不做任何事
/// - 否则若配置的 email/username 已存在：提升为 admin
/// - 否则创建一个新的 admin
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(user::ROLE_ADMIN))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(cfg.email.to_lowercase()))
                .add(user::Column::Username.eq(cfg.username.clone())),
        )
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        tracing::info!(user_id = existing.id, "promoting bootstrap admin");
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(user::ROLE_ADMIN.to_string());
        active.updated_at = Set(now);
        active.update(db).await?;
        return Ok(());
    }

    let password_hash = hash_password(&cfg.password)?;

    let new_user = user::ActiveModel {
        username: Set(cfg.username),
        email: Set(cfg.email.to_lowercase()),
        password_hash: Set(password_hash),
        role: Set(user::ROLE_ADMIN.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let admin = new_user.insert(db).await?;
    tracing::info!(user_id = admin.id, "created bootstrap admin");
    Ok(())
}
