pub mod article;
pub mod article_hit;
pub mod article_like;
pub mod article_tag;
pub mod comment;
pub mod comment_reaction;
pub mod section;
pub mod tag;
pub mod user;

pub use article::{ArticleStatus, Entity as Article, Model as ArticleModel};
pub use article_hit::Entity as ArticleHit;
pub use article_like::Entity as ArticleLike;
pub use article_tag::Entity as ArticleTag;
pub use comment::{Entity as Comment, Model as CommentModel};
pub use comment_reaction::{Entity as CommentReaction, ReactionKind};
pub use section::Section;
pub use tag::{Entity as Tag, Model as TagModel};
pub use user::{Entity as User, Model as UserModel};
