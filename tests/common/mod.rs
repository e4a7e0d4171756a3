#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static ARTICLE_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const SITE_URL: &str = "https://news.example.com";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("BCRYPT_COST", "4");
        let config = newsroom::config::jwt::JwtConfig::from_env().unwrap();
        let _ = newsroom::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// URL outside the API prefix, e.g. `/sitemap.xml`.
    pub fn root_url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_site(newsroom::config::site::SiteConfig {
        site_url: SITE_URL.to_string(),
        ..Default::default()
    })
    .await
}

pub async fn spawn_app_with_site(site: newsroom::config::site::SiteConfig) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        newsroom::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let email_service = newsroom::services::email::EmailService::disabled();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(newsroom::routes::create_routes())
        .layer(axum::middleware::from_fn(
            newsroom::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(site))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "article_hits",
        "comment_reactions",
        "article_likes",
        "article_tags",
        "tags",
        "comments",
        "articles",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            unique_username, status, e
        )
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user id: {body}")) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token: {body}"))
        .to_string();
    (user_id, token)
}

async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = $1 WHERE id = $2",
        vec![role.into(), user_id.into()],
    ))
    .await
    .expect("Failed to change user role");
}

pub async fn make_editor(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "editor").await;
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "admin").await;
}

/// Create a draft in `section` and return the response body's `data`.
pub async fn create_draft(app: &TestApp, token: &str, section: &str, title: &str) -> Value {
    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(token)
        .json(&json!({
            "section": section,
            "title": title,
            "body": format!("Body of **{title}**"),
            "news_image": "https://cdn.example.com/lead.jpg",
            "caption": "Lead image",
        }))
        .send()
        .await
        .expect("Failed to create article");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create article: status={}, body={}", status, body);
    }
    body["data"].clone()
}

/// Set an article's status with an editor token.
pub async fn set_status(app: &TestApp, editor_token: &str, article_id: i64, status: &str) {
    let resp = app
        .client
        .put(app.url(&format!("/articles/{}/status", article_id)))
        .bearer_auth(editor_token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("Failed to set status");
    assert_eq!(resp.status(), 200, "set_status to {status} failed");
}

/// Create and publish an article, returning its `data`. The caller's token
/// must belong to an editor.
pub async fn create_published(app: &TestApp, editor_token: &str, section: &str) -> Value {
    let counter = ARTICLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let draft = create_draft(app, editor_token, section, &format!("Story number {counter}")).await;
    let id = draft["id"].as_i64().expect("article id");
    set_status(app, editor_token, id, "published").await;
    draft
}

/// Editor account plus token, used by most tests to publish content.
pub async fn create_editor(app: &TestApp) -> (i32, String) {
    let (id, token) = create_test_user(app, "editor").await;
    make_editor(&app.db, id).await;
    (id, token)
}
