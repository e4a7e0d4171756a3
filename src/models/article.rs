use super::section::Section;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Select};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[sea_orm(string_value = "DF")]
    Draft,
    #[sea_orm(string_value = "PB")]
    Published,
    #[sea_orm(string_value = "PD")]
    Pending,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub section: Section,
    pub title: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub publish: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub edited: bool,
    pub status: ArticleStatus,
    pub news_image: String,
    pub news_image_two: Option<String>,
    pub news_image_three: Option<String>,
    pub news_image_four: Option<String>,
    pub caption: Option<String>,
    pub caption_two: Option<String>,
    pub caption_three: Option<String>,
    pub caption_four: Option<String>,
    pub total_likes: i32,
    pub hit_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Named query entry points. Every scope orders newest-published first.
impl Entity {
    pub fn objects() -> Select<Entity> {
        Entity::find().order_by_desc(Column::Publish)
    }

    /// Publicly visible articles. Visibility depends on status alone.
    pub fn published() -> Select<Entity> {
        Self::objects().filter(Column::Status.eq(ArticleStatus::Published))
    }

    pub fn drafts() -> Select<Entity> {
        Self::objects().filter(Column::Status.eq(ArticleStatus::Draft))
    }
}

impl Model {
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }

    /// Canonical path: `/{section}/{yyyy}/{mm}/{dd}/{slug}/`.
    pub fn absolute_path(&self) -> String {
        format!(
            "/{}/{}/{}/",
            self.section.slug(),
            self.publish.format("%Y/%m/%d"),
            self.slug
        )
    }

    pub fn images(&self) -> Vec<(String, Option<String>)> {
        let mut images = vec![(self.news_image.clone(), self.caption.clone())];
        let extra = [
            (&self.news_image_two, &self.caption_two),
            (&self.news_image_three, &self.caption_three),
            (&self.news_image_four, &self.caption_four),
        ];
        for (image, caption) in extra {
            if let Some(url) = image {
                images.push((url.clone(), caption.clone()));
            }
        }
        images
    }
}
