use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One counted view of an article. The client address is stored hashed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article_hits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub article_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub ip_hash: String,
    pub user_id: Option<i32>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id"
    )]
    Article,
}

impl ActiveModelBehavior for ActiveModel {}
