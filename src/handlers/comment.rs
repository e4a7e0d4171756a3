use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_editor;
use crate::middleware::AuthUser;
use crate::models::{CommentModel, ReactionKind};
use crate::response::ApiResponse;
use crate::services::article::ArticleService;
use crate::services::comment::{CommentInput, CommentService, ReactionCounts};
use crate::utils::render_rich_text;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Reply target. Must be an active comment on the same article.
    pub parent_id: Option<i32>,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    #[validate(url)]
    pub image_one: Option<String>,
    #[validate(url)]
    pub image_two: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    #[validate(url)]
    pub image_one: Option<String>,
    #[validate(url)]
    pub image_two: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CommentTreeQuery {
    /// `false` returns only the top-level comments, without children
    pub replies: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub article_id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub body: String,
    pub body_html: String,
    pub image_one: Option<String>,
    pub image_two: Option<String>,
    pub active: bool,
    pub edited: bool,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentResponse {
    fn build(c: CommentModel, counts: ReactionCounts) -> Self {
        let body_html = render_rich_text(&c.body);
        Self {
            id: c.id,
            article_id: c.article_id,
            user_id: c.user_id,
            parent_id: c.parent_id,
            body: c.body,
            body_html,
            image_one: c.image_one,
            image_two: c.image_two,
            active: c.active,
            edited: c.edited,
            likes: counts.likes,
            dislikes: counts.dislikes,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct CommentTreeNode {
    pub id: i32,
    pub user_id: i32,
    pub parent_id: Option<i32>,
    pub body: String,
    pub body_html: String,
    pub image_one: Option<String>,
    pub image_two: Option<String>,
    pub edited: bool,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    pub children: Vec<CommentTreeNode>,
}

impl utoipa::ToSchema for CommentTreeNode {
    fn name() -> std::borrow::Cow<'static, str> {
        "CommentTreeNode".into()
    }
}

impl utoipa::PartialSchema for CommentTreeNode {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, Schema, Type};
        utoipa::openapi::RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .property("id", i32::schema())
                .property("user_id", i32::schema())
                .property("parent_id", Option::<i32>::schema())
                .property("body", String::schema())
                .property("body_html", String::schema())
                .property("image_one", Option::<String>::schema())
                .property("image_two", Option::<String>::schema())
                .property("edited", bool::schema())
                .property("likes", i64::schema())
                .property("dislikes", i64::schema())
                .property("created_at", String::schema())
                .property(
                    "children",
                    ArrayBuilder::new()
                        .items(utoipa::openapi::Ref::from_schema_name("CommentTreeNode"))
                        .build(),
                )
                .required("id")
                .required("user_id")
                .required("body")
                .required("body_html")
                .required("edited")
                .required("likes")
                .required("dislikes")
                .required("created_at")
                .required("children")
                .build(),
        ))
    }
}

impl CommentTreeNode {
    fn build(c: CommentModel, counts: ReactionCounts) -> Self {
        let body_html = render_rich_text(&c.body);
        Self {
            id: c.id,
            user_id: c.user_id,
            parent_id: c.parent_id,
            body: c.body,
            body_html,
            image_one: c.image_one,
            image_two: c.image_two,
            edited: c.edited,
            likes: counts.likes,
            dislikes: counts.dislikes,
            created_at: c.created_at.to_string(),
            children: Vec::new(),
        }
    }
}

/// Nest active comments under their parents. A comment whose parent is not in
/// the input (inactive or deleted) is dropped together with its replies.
fn build_comment_tree(
    comments: Vec<CommentModel>,
    counts: &HashMap<i32, ReactionCounts>,
) -> Vec<CommentTreeNode> {
    let mut nodes: HashMap<i32, CommentTreeNode> = HashMap::new();
    let mut children_map: HashMap<Option<i32>, Vec<i32>> = HashMap::new();

    for comment in &comments {
        children_map
            .entry(comment.parent_id)
            .or_default()
            .push(comment.id);
    }
    for comment in comments {
        let id = comment.id;
        let tally = counts.get(&id).copied().unwrap_or_default();
        nodes.insert(id, CommentTreeNode::build(comment, tally));
    }

    fn attach_children(
        node_id: i32,
        nodes: &mut HashMap<i32, CommentTreeNode>,
        children_map: &HashMap<Option<i32>, Vec<i32>>,
    ) -> Option<CommentTreeNode> {
        let mut node = nodes.remove(&node_id)?;
        if let Some(child_ids) = children_map.get(&Some(node_id)) {
            for &child_id in child_ids {
                if let Some(child) = attach_children(child_id, nodes, children_map) {
                    node.children.push(child);
                }
            }
        }
        Some(node)
    }

    let root_ids = children_map.get(&None).cloned().unwrap_or_default();
    root_ids
        .into_iter()
        .filter_map(|id| attach_children(id, &mut nodes, &children_map))
        .collect()
}

async fn ensure_article_published(db: &DatabaseConnection, article_id: i32) -> AppResult<()> {
    let article = ArticleService::new(db.clone()).get_by_id(article_id).await?;
    if !article.is_published() {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/{id}/comments",
    params(("id" = i32, Path, description = "Article ID"), CommentTreeQuery),
    responses(
        (status = 200, description = "Active comment tree", body = Vec<CommentTreeNode>),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(article_id): Path<i32>,
    Query(query): Query<CommentTreeQuery>,
) -> AppResult<impl IntoResponse> {
    ensure_article_published(&db, article_id).await?;

    let service = CommentService::new(db);
    let comments = if query.replies.unwrap_or(true) {
        service.list_active(article_id).await?
    } else {
        service.active_roots(article_id).await?
    };
    let ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let counts = service.reaction_counts(&ids).await?;

    Ok(ApiResponse::ok(build_comment_tree(comments, &counts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{id}/replies",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Active direct replies", body = Vec<CommentResponse>),
        (status = 404, description = "Comment not found or hidden", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_replies(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    let replies = service.active_replies(id).await?;
    let ids: Vec<i32> = replies.iter().map(|c| c.id).collect();
    let counts = service.reaction_counts(&ids).await?;

    let items: Vec<CommentResponse> = replies
        .into_iter()
        .map(|c| {
            let tally = counts.get(&c.id).copied().unwrap_or_default();
            CommentResponse::build(c, tally)
        })
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(article_id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .create(
            article_id,
            auth_user.user_id,
            payload.parent_id,
            CommentInput {
                body: payload.body,
                image_one: payload.image_one,
                image_two: payload.image_two,
            },
        )
        .await?;

    Ok(ApiResponse::ok(CommentResponse::build(
        comment,
        ReactionCounts::default(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .update(
            id,
            auth_user.user_id,
            CommentInput {
                body: payload.body,
                image_one: payload.image_one,
                image_two: payload.image_two,
            },
        )
        .await?;
    let counts = service
        .reaction_counts(&[id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    Ok(ApiResponse::ok(CommentResponse::build(comment, counts)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the author or an editor", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.delete(id, &auth_user).await?;
    Ok(ApiResponse::ok("Comment deleted"))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReactionResponse {
    /// The caller's reaction after the toggle
    pub reaction: Option<ReactionKind>,
    pub likes: i64,
    pub dislikes: i64,
}

async fn react(db: DatabaseConnection, comment_id: i32, user_id: i32, kind: ReactionKind) -> AppResult<ReactionResponse> {
    let service = CommentService::new(db);
    let (reaction, counts) = service.react(comment_id, user_id, kind).await?;
    Ok(ReactionResponse {
        reaction,
        likes: counts.likes,
        dislikes: counts.dislikes,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like toggled", body = ReactionResponse),
        (status = 404, description = "Comment not found or hidden", body = AppError),
    ),
    tag = "comments"
)]
pub async fn like_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(react(db, id, auth_user.user_id, ReactionKind::Like).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/dislike",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Dislike toggled", body = ReactionResponse),
        (status = 404, description = "Comment not found or hidden", body = AppError),
    ),
    tag = "comments"
)]
pub async fn dislike_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(react(db, id, auth_user.user_id, ReactionKind::Dislike).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}/active",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Visibility changed", body = CommentResponse),
        (status = 403, description = "Editors only", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn set_comment_active(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> AppResult<impl IntoResponse> {
    require_editor(&auth_user)?;

    let service = CommentService::new(db);
    let comment = service.set_active(id, payload.active).await?;
    let counts = service
        .reaction_counts(&[id])
        .await?
        .remove(&id)
        .unwrap_or_default();

    Ok(ApiResponse::ok(CommentResponse::build(comment, counts)))
}
