pub mod jwt;
pub mod password;
pub mod richtext;
pub mod slug;
pub mod xml;

pub use jwt::encode_access_token;
pub use password::{hash_password, verify_password};
pub use richtext::render_rich_text;
pub use slug::slugify;
