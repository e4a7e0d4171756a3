use crate::{
    config::site::SiteConfig,
    error::AppResult,
    models::{article_hit, ArticleHit, ArticleModel},
    services::article::ArticleService,
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::net::IpAddr;

/// Address a hit is keyed on. With `trust_forwarded_for`, the first parseable
/// `X-Forwarded-For` entry wins; otherwise the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trust_forwarded_for: bool) -> IpAddr {
    if !trust_forwarded_for {
        return peer;
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.split(',').find_map(|part| part.trim().parse().ok()))
        .unwrap_or(peer)
}

/// Salted SHA-256 of the client address, hex encoded.
pub fn hash_ip(ip: &IpAddr, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(ip.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A view counts unless the same client already hit the article inside the window.
pub fn should_count(last_hit: Option<NaiveDateTime>, now: NaiveDateTime, keep_active_days: i64) -> bool {
    match last_hit {
        None => true,
        Some(at) => at <= now - chrono::Duration::days(keep_active_days),
    }
}

pub struct HitService {
    db: DatabaseConnection,
    keep_active_days: i64,
    salt: String,
}

impl HitService {
    pub fn new(db: DatabaseConnection, site: &SiteConfig) -> Self {
        Self {
            db,
            keep_active_days: site.hit_keep_active_days,
            salt: site.hit_ip_salt.clone(),
        }
    }

    /// Record a view of a published article. Returns whether it was counted.
    pub async fn record(
        &self,
        article: &ArticleModel,
        ip: IpAddr,
        user_id: Option<i32>,
    ) -> AppResult<bool> {
        if !article.is_published() {
            return Ok(false);
        }

        let ip_hash = hash_ip(&ip, &self.salt);
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let last_hit = ArticleHit::find()
            .filter(article_hit::Column::ArticleId.eq(article.id))
            .filter(article_hit::Column::IpHash.eq(&ip_hash))
            .order_by_desc(article_hit::Column::CreatedAt)
            .one(&txn)
            .await?
            .map(|hit| hit.created_at);

        if !should_count(last_hit, now, self.keep_active_days) {
            txn.rollback().await?;
            return Ok(false);
        }

        article_hit::ActiveModel {
            article_id: Set(article.id),
            ip_hash: Set(ip_hash),
            user_id: Set(user_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        ArticleService::increment_hit_count(&txn, article.id).await?;

        txn.commit().await?;
        Ok(true)
    }
}
