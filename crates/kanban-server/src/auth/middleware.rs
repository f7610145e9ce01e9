use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, routes::AppState};

use super::token::parse_authorization;

/// The caller resolved from the request's token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub full_name: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_authorization)
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .store
        .user_for_token(token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let auth_user = AuthUser {
        id: user.id,
        full_name: user.full_name(),
    };

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
