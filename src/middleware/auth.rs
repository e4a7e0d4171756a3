use crate::{error::AppError, error::AppResult, models::User, utils::jwt::decode_jwt};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Authenticated caller, with the role read fresh from the database.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

impl AuthUser {
    pub fn is_editor(&self) -> bool {
        self.role == crate::models::user::ROLE_EDITOR || self.is_admin()
    }

    pub fn is_admin(&self) -> bool {
        self.role == crate::models::user::ROLE_ADMIN
    }
}

/// JWT authentication middleware
///
/// Verifies the bearer token, makes sure the account still exists and adds
/// the caller to request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&db, &headers)
        .await?
        .ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Like `auth_middleware`, but lets anonymous requests through. A present but
/// invalid token is still rejected.
pub async fn optional_auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(auth_user) = authenticate(&db, &headers).await? {
        request.extensions_mut().insert(auth_user);
    }
    Ok(next.run(request).await)
}

async fn authenticate(db: &DatabaseConnection, headers: &HeaderMap) -> AppResult<Option<AuthUser>> {
    let Some(token) = extract_bearer_token(headers) else {
        return Ok(None);
    };

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(AuthUser {
        user_id: user.id,
        role: user.role,
    }))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub fn require_editor(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.is_editor() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn require_admin(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller identity on routes that also serve anonymous readers.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
