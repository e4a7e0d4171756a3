pub mod admin;
pub mod article;
pub mod auth;
pub mod comment;
pub mod sitemap;
pub mod tag;

pub use auth::*;
