pub mod admin;
pub mod article;
pub mod auth;
pub mod bootstrap_admin;
pub mod cache;
pub mod comment;
pub mod email;
pub mod hit;
pub mod like;
pub mod sitemap;
pub mod tag;
